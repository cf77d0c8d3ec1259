//! The `keyscore stats` command.

use anyhow::Result;

use keyscore_core::response::Envelope;

use super::{emit_json, Context};

pub async fn execute(ctx: &Context, format: String) -> Result<()> {
    let config = ctx.load_config()?;
    let engine = ctx.engine(&config)?;
    let stats = engine.statistics().await?;

    match format.as_str() {
        "json" => emit_json(&Envelope::ok(stats), None)?,
        "text" => {
            use comfy_table::{Cell, Table};

            let mut table = Table::new();
            table.set_header(vec!["Candidates", "Submissions", "Average score"]);
            table.add_row(vec![
                Cell::new(stats.total_candidates),
                Cell::new(stats.total_submissions),
                Cell::new(format!("{:.2}", stats.average_score)),
            ]);
            println!("{table}");
        }
        other => anyhow::bail!("unknown format: {other} (expected text or json)"),
    }
    Ok(())
}
