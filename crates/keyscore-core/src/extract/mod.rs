//! Answer-key extraction.
//!
//! Turns an answer-key page, fetched or supplied directly, into a
//! [`ParsedAnswerKey`]. Extraction is heuristic and never fails on malformed
//! input: fields that cannot be found get placeholders and a page without an
//! answer grid gets synthetic answers, flagged through
//! [`ParsedAnswerKey::origin`]. Only fetching can fail.

pub mod answers;
pub mod fields;
pub mod grid;
pub mod page;
pub mod synthetic;
pub mod view_source;

use std::sync::Arc;

use crate::error::FetchError;
use crate::model::{KeyOrigin, ParsedAnswerKey};
use crate::traits::PageFetcher;

pub use synthetic::{demo_answer_key, demo_answer_key_with};

/// Whether a source string asks for demo data instead of a real page.
pub fn is_demo_source(source: &str) -> bool {
    let lowered = source.to_lowercase();
    lowered.contains("demo") || lowered.contains("test")
}

/// Extracts answer keys from URLs or raw page content.
#[derive(Clone)]
pub struct AnswerKeyExtractor {
    fetcher: Arc<dyn PageFetcher>,
}

impl AnswerKeyExtractor {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Fetch `url` and extract its answer key. Demo sentinels return the
    /// demo key without fetching anything.
    pub async fn parse_from_url(&self, url: &str) -> Result<ParsedAnswerKey, FetchError> {
        if is_demo_source(url) {
            tracing::info!("using demo answer key for {url}");
            return Ok(demo_answer_key());
        }
        tracing::info!("fetching answer key via {}: {url}", self.fetcher.name());
        let content = self.fetcher.fetch(url).await?;
        tracing::info!("fetched {} bytes", content.len());
        Ok(self.parse_from_html(&content))
    }

    /// Extract an answer key from page content.
    pub fn parse_from_html(&self, content: &str) -> ParsedAnswerKey {
        parse_answer_key(content)
    }
}

/// Extract an answer key from page content, recovering view-source dumps
/// first.
pub fn parse_answer_key(content: &str) -> ParsedAnswerKey {
    if view_source::looks_like_view_source(content) {
        let recovered = view_source::recover(content);
        return parse_structured(&recovered.to_synthetic_html(), KeyOrigin::Recovered);
    }
    parse_structured(content, KeyOrigin::Parsed)
}

fn parse_structured(html: &str, origin: KeyOrigin) -> ParsedAnswerKey {
    let page = page::Page::parse(html);
    let fields = fields::extract_candidate_fields(&page);
    let max_question = match origin {
        KeyOrigin::Recovered => view_source::MAX_RECOVERED_QUESTION,
        _ => grid::MAX_GRID_QUESTION,
    };
    let subjects = grid::extract_subjects_up_to(&page, max_question);
    if subjects.is_empty() {
        return synthetic::synthetic_answer_key(fields, &mut rand::thread_rng());
    }
    let key = ParsedAnswerKey {
        candidate_name: fields.candidate_name,
        roll_number: fields.roll_number,
        exam_name: fields.exam_name,
        exam_date: fields.exam_date,
        exam_time: fields.exam_time,
        venue_name: fields.venue_name,
        subjects,
        origin,
    };
    tracing::info!(
        "extracted {} questions in {} subjects ({origin})",
        key.question_count(),
        key.subjects.len()
    );
    key
}
