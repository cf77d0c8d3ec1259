//! The `keyscore submit` command.

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use keyscore_core::engine::{AnswerSource, Submission, SubmissionForm};
use keyscore_core::model::KeyOrigin;
use keyscore_core::response::Envelope;
use keyscore_report::{write_html_report, Scorecard};

use super::{emit_json, print_record, Context};

pub struct SubmitArgs {
    pub url: Option<String>,
    pub html_file: Option<PathBuf>,
    pub document: Option<PathBuf>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub gender: Option<String>,
    pub state: Option<String>,
    pub language: Option<String>,
    pub format: String,
    pub output: Option<PathBuf>,
}

pub async fn execute(ctx: &Context, args: SubmitArgs) -> Result<()> {
    anyhow::ensure!(
        matches!(args.format.as_str(), "text" | "json" | "html"),
        "unknown format: {} (expected text, json or html)",
        args.format
    );

    let config = ctx.load_config()?;

    let source = match (args.url, args.html_file, args.document) {
        (Some(url), _, _) => Some(AnswerSource::Url(url)),
        (None, Some(path), _) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Some(AnswerSource::Content(content))
        }
        (None, None, Some(path)) => Some(AnswerSource::Document(path)),
        (None, None, None) => None,
    };

    let form = SubmissionForm {
        source,
        category: args
            .category
            .or_else(|| config.default_category.clone())
            .unwrap_or_default(),
        sub_category: args.sub_category,
        gender: args.gender.unwrap_or_default(),
        state: args.state.unwrap_or_default(),
        language: args.language.unwrap_or_default(),
    };

    let engine = ctx.engine(&config)?;
    let outcome = engine.submit(form).await;

    if args.format == "json" {
        let failed = outcome.is_err();
        emit_json(&Envelope::from(outcome), args.output.as_deref())?;
        if failed {
            std::process::exit(1);
        }
        return Ok(());
    }

    let submission = outcome?;
    if args.format == "html" {
        let path = args.output.unwrap_or_else(|| {
            PathBuf::from(format!("scorecard-{}.html", submission.candidate.roll_number))
        });
        write_html_report(&Scorecard::from(&submission), &path)?;
        eprintln!("Wrote {}", path.display());
        return Ok(());
    }

    print_submission(&submission);
    Ok(())
}

fn print_submission(submission: &Submission) {
    if let Some(reason) = &submission.fallback_reason {
        println!("Could not fetch the answer key ({reason}); scored demo data instead.\n");
    } else {
        match submission.origin {
            KeyOrigin::Demo => println!("Scored demo data.\n"),
            KeyOrigin::Synthetic => {
                println!("No answer grid found on the page; answers were generated.\n")
            }
            KeyOrigin::Parsed | KeyOrigin::Recovered => {}
        }
    }
    print_record(
        &submission.candidate,
        &submission.result,
        &submission.subject_scores,
    );
    let r = &submission.result;
    println!(
        "{} attempted: {} correct, {} wrong, {} not attempted",
        r.total_attempted, r.total_correct, r.total_wrong, r.total_not_attempted
    );
}
