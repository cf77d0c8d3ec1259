//! Candidate metadata extraction from structured HTML.
//!
//! Each field has an ordered list of independent strategies. A strategy
//! yields zero or more candidate values; the first value that passes the
//! field's plausibility check wins, otherwise the field's placeholder is used.

use chrono::Local;

use super::page::{LabelCell, Page};

pub const NAME_PLACEHOLDER: &str = "Name not found";
pub const ROLL_NUMBER_PLACEHOLDER: &str = "Roll number not found";
pub const EXAM_NAME_PLACEHOLDER: &str = "SSC Examination";
pub const VENUE_PLACEHOLDER: &str = "Venue not specified";

/// One way of locating a field's value on a page.
#[derive(Debug, Clone, Copy)]
pub enum Strategy {
    /// A cell whose text starts with the label; the value is the next cell,
    /// or the rest of the same cell.
    Label(&'static str),
    /// The text of elements matching a CSS selector.
    Css(&'static str),
    /// The document title.
    Title,
}

impl Strategy {
    fn values(&self, page: &Page) -> Vec<String> {
        match self {
            Strategy::Label(label) => label_values(page.cells(), label),
            Strategy::Css(css) => page.texts_matching(css),
            Strategy::Title => page.title().into_iter().collect(),
        }
    }
}

/// How to find and validate one candidate field.
pub struct FieldSpec {
    pub field: &'static str,
    pub strategies: &'static [Strategy],
    pub plausible: fn(&str) -> bool,
}

pub static CANDIDATE_NAME: FieldSpec = FieldSpec {
    field: "candidate name",
    strategies: &[
        Strategy::Label("Candidate Name"),
        Strategy::Label("Name"),
        Strategy::Css(".candidate-name"),
        Strategy::Css("#candidateName"),
    ],
    plausible: |v| v.chars().count() > 2,
};

pub static ROLL_NUMBER: FieldSpec = FieldSpec {
    field: "roll number",
    strategies: &[
        Strategy::Label("Roll Number"),
        Strategy::Label("Roll No"),
        Strategy::Css(".roll-number"),
        Strategy::Css("#rollNumber"),
    ],
    plausible: |v| v.chars().count() > 5,
};

pub static EXAM_NAME: FieldSpec = FieldSpec {
    field: "exam name",
    strategies: &[
        Strategy::Label("Exam Name"),
        Strategy::Label("Examination"),
        Strategy::Css(".exam-name"),
        Strategy::Title,
    ],
    plausible: |v| v.chars().count() > 3,
};

pub static EXAM_DATE: FieldSpec = FieldSpec {
    field: "exam date",
    strategies: &[
        Strategy::Label("Exam Date"),
        Strategy::Label("Date"),
        Strategy::Css(".exam-date"),
    ],
    plausible: |v| v.contains('/') || v.contains('-'),
};

pub static EXAM_TIME: FieldSpec = FieldSpec {
    field: "exam time",
    strategies: &[
        Strategy::Label("Exam Time"),
        Strategy::Label("Time"),
        Strategy::Css(".exam-time"),
    ],
    plausible: |v| {
        let upper = v.to_ascii_uppercase();
        v.contains(':') || upper.contains("AM") || upper.contains("PM")
    },
};

pub static VENUE_NAME: FieldSpec = FieldSpec {
    field: "venue name",
    strategies: &[
        Strategy::Label("Venue Name"),
        Strategy::Label("Venue"),
        Strategy::Label("Centre"),
        Strategy::Label("Center"),
        Strategy::Css(".venue-name"),
    ],
    plausible: |v| v.chars().count() > 5,
};

/// Apply a field's strategies in order and return the first plausible value.
pub fn find_field(page: &Page, spec: &FieldSpec) -> Option<String> {
    let found = spec.strategies.iter().find_map(|strategy| {
        strategy
            .values(page)
            .into_iter()
            .find(|v| !v.is_empty() && (spec.plausible)(v))
    });
    if found.is_none() {
        tracing::debug!("no plausible {} found, using placeholder", spec.field);
    }
    found
}

/// Values for a label: the adjacent cell's text, or the label stripped from
/// the cell's own text.
pub fn label_values(cells: &[LabelCell], label: &str) -> Vec<String> {
    let label_lc = label.to_lowercase();
    cells
        .iter()
        .filter(|cell| cell.text.to_lowercase().starts_with(&label_lc))
        .filter_map(|cell| {
            let adjacent = cell.next.as_deref().map(str::trim).filter(|s| !s.is_empty());
            let value = match adjacent {
                Some(next) => next.to_string(),
                None => strip_label(&cell.text, label.len()),
            };
            (!value.is_empty()).then_some(value)
        })
        .collect()
}

fn strip_label(text: &str, label_len: usize) -> String {
    text.get(label_len..)
        .unwrap_or_default()
        .trim_start_matches(|c: char| c == ':' || c == '.' || c == '-' || c.is_whitespace())
        .trim_end()
        .to_string()
}

/// Candidate metadata with placeholders filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFields {
    pub candidate_name: String,
    pub roll_number: String,
    pub exam_name: String,
    pub exam_date: String,
    pub exam_time: String,
    pub venue_name: String,
}

/// Extract every candidate field from a page.
pub fn extract_candidate_fields(page: &Page) -> CandidateFields {
    let now = Local::now();
    CandidateFields {
        candidate_name: find_field(page, &CANDIDATE_NAME)
            .unwrap_or_else(|| NAME_PLACEHOLDER.to_string()),
        roll_number: find_field(page, &ROLL_NUMBER)
            .unwrap_or_else(|| ROLL_NUMBER_PLACEHOLDER.to_string()),
        exam_name: find_field(page, &EXAM_NAME)
            .unwrap_or_else(|| EXAM_NAME_PLACEHOLDER.to_string()),
        exam_date: find_field(page, &EXAM_DATE)
            .unwrap_or_else(|| now.format("%d/%m/%Y").to_string()),
        exam_time: find_field(page, &EXAM_TIME)
            .unwrap_or_else(|| now.format("%I:%M %p").to_string()),
        venue_name: find_field(page, &VENUE_NAME).unwrap_or_else(|| VENUE_PLACEHOLDER.to_string()),
    }
}
