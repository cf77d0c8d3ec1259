//! The `keyscore result` command.

use std::path::PathBuf;

use anyhow::Result;

use keyscore_core::response::Envelope;
use keyscore_report::{write_html_report, Scorecard};

use super::{emit_json, print_record, Context};

pub async fn execute(
    ctx: &Context,
    roll_number: String,
    format: String,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = ctx.load_config()?;
    let engine = ctx.engine(&config)?;
    let lookup = engine.lookup(roll_number.trim()).await;

    match format.as_str() {
        "json" => {
            let failed = lookup.is_err();
            emit_json(&Envelope::from(lookup), output.as_deref())?;
            if failed {
                std::process::exit(1);
            }
        }
        "html" => {
            let record = lookup?;
            let path = output
                .unwrap_or_else(|| PathBuf::from(format!("scorecard-{}.html", roll_number.trim())));
            write_html_report(&Scorecard::from(&record), &path)?;
            eprintln!("Wrote {}", path.display());
        }
        "text" => {
            let record = lookup?;
            print_record(&record.candidate, &record.result, &record.subject_scores);
        }
        other => anyhow::bail!("unknown format: {other} (expected text, json or html)"),
    }
    Ok(())
}
