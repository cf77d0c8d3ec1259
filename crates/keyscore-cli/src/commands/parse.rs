//! The `keyscore parse` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use keyscore_core::extract::{parse_answer_key, AnswerKeyExtractor};
use keyscore_fetch::create_fetcher;

use super::Context;

pub async fn execute(ctx: &Context, url: Option<String>, html_file: Option<PathBuf>) -> Result<()> {
    let key = match (url, html_file) {
        (Some(url), _) => {
            let config = ctx.load_config()?;
            let extractor = AnswerKeyExtractor::new(Arc::new(create_fetcher(&config)?));
            extractor
                .parse_from_url(&url)
                .await
                .with_context(|| format!("failed to parse {url}"))?
        }
        (None, Some(path)) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            parse_answer_key(&content)
        }
        (None, None) => anyhow::bail!("either --url or --html-file is required"),
    };

    println!("{}", serde_json::to_string_pretty(&key)?);
    Ok(())
}
