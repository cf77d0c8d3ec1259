//! Recovery of answer-key data from raw "view-source" dumps.
//!
//! A dump is the page source rendered as text, usually with its markup
//! entity-encoded. Recovery flattens it to plain lines, pulls candidate
//! fields and answer triples out with regexes, and rebuilds a minimal HTML
//! page so the structured extractor can run over it like any other page.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::answers::normalize_questions;
use super::page::{html_escape, normalize_ws};
use crate::model::{Choice, Question, UserAnswer};

/// Highest question number recovered from raw text.
pub const MAX_RECOVERED_QUESTION: u32 = 200;
/// Answers emitted per synthetic grid.
const ANSWERS_PER_GRID: usize = 25;
/// Every synthetic grid gets at least this many rows so it qualifies.
const GRID_MIN_ROWS: usize = super::grid::MIN_GRID_ROWS + 1;

fn compile_static(pattern: &'static str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

fn compile_all(patterns: &[&'static str]) -> Vec<Regex> {
    patterns.iter().copied().map(compile_static).collect()
}

static BLOCK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    compile_static(r"(?i)</?(?:tr|td|th|p|div|br|li|table|tbody|thead|h[1-6])\b[^>]*>")
});
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| compile_static(r"<[^>]*>"));
static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| compile_static(r"&#(?:[xX]([0-9a-fA-F]+)|([0-9]+));"));
static ANSWER: LazyLock<Regex> = LazyLock::new(|| {
    compile_static(r"\b(\d{1,3})[^A-Za-z0-9]*([A-D])\b[^A-Za-z0-9]*([A-D])\b")
});

static CANDIDATE_NAME: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?i)candidate\s*name[^:\n]*:\s*([^<>\n]+)",
        r"(?im)^candidate ?name$\n([^\n]+)",
    ])
});
static ROLL_NUMBER: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?i)roll\s*(?:number|no)[^:\n]*:\s*(\d+)",
        r"(?i)roll\s*(?:number|no)\.?\s*(\d+)",
    ])
});
static EXAM_NAME: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?i)exam\s*name[^:\n]*:\s*([^<>\n]+)",
        r"(?im)^exam ?name$\n([^\n]+)",
    ])
});
static EXAM_DATE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?i)exam\s*date[^:\n]*:\s*([^<>\n]+)",
        r"(?im)^(?:exam ?)?date$\n([^\n]+)",
        r"(?i)\bdate[^:\n]*:\s*([^<>\n]+)",
        r"\b(\d{1,2}[/-]\d{1,2}[/-]\d{4})\b",
    ])
});
static EXAM_TIME: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?i)exam\s*time[^:\n]*:\s*([^<>\n]+)",
        r"(?im)^(?:exam ?)?time$\n([^\n]+)",
        r"(?i)\btime[^:\n]*:\s*([^<>\n]+)",
    ])
});
static VENUE_NAME: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?i)(?:venue|cent(?:re|er))\s*(?:name)?[^:\n]*:\s*([^<>\n]+)",
        r"(?im)^(?:venue|cent(?:re|er))(?: ?name)?$\n([^\n]+)",
    ])
});

/// Whether `content` is a raw view-source dump rather than renderable HTML.
pub fn looks_like_view_source(content: &str) -> bool {
    content.contains("view-source:") || content.contains("line-content")
}

/// Candidate fields found in a dump. `None` means no pattern matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveredFields {
    pub candidate_name: Option<String>,
    pub roll_number: Option<String>,
    pub exam_name: Option<String>,
    pub exam_date: Option<String>,
    pub exam_time: Option<String>,
    pub venue_name: Option<String>,
}

impl RecoveredFields {
    fn labelled(&self) -> Vec<(&'static str, &str)> {
        [
            ("Candidate Name", &self.candidate_name),
            ("Roll Number", &self.roll_number),
            ("Exam Name", &self.exam_name),
            ("Exam Date", &self.exam_date),
            ("Exam Time", &self.exam_time),
            ("Venue Name", &self.venue_name),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_deref().map(|v| (label, v)))
        .collect()
    }
}

/// Everything recovered from one dump.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveredPage {
    pub fields: RecoveredFields,
    /// Unique by question number, ascending.
    pub answers: Vec<Question>,
}

impl RecoveredPage {
    /// Rebuild a minimal HTML page: a table of the recovered fields, then one
    /// answer grid per 25 answers.
    pub fn to_synthetic_html(&self) -> String {
        let mut html = String::from("<html><head></head><body>\n");

        let fields = self.fields.labelled();
        if !fields.is_empty() {
            html.push_str("<table class=\"main-info-tbl\">\n");
            for (label, value) in fields {
                html.push_str(&format!(
                    "<tr><td>{label}</td><td>{}</td></tr>\n",
                    html_escape(value)
                ));
            }
            html.push_str("</table>\n");
        }

        for chunk in self.answers.chunks(ANSWERS_PER_GRID) {
            html.push_str("<table class=\"question-grid\">\n");
            html.push_str("<tr><th>Q.No.</th><th>Your Answer</th><th>Correct Answer</th></tr>\n");
            for q in chunk {
                html.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                    q.question_number, q.user_answer, q.correct_answer
                ));
            }
            for _ in (chunk.len() + 1)..GRID_MIN_ROWS {
                html.push_str("<tr class=\"spacer\"><td colspan=\"3\"></td></tr>\n");
            }
            html.push_str("</table>\n");
        }

        html.push_str("</body></html>\n");
        html
    }
}

/// Recover fields and answers from a raw dump.
pub fn recover(raw: &str) -> RecoveredPage {
    let text = flatten(raw);
    let fields = RecoveredFields {
        candidate_name: first_capture(&text, &CANDIDATE_NAME),
        roll_number: first_capture(&text, &ROLL_NUMBER),
        exam_name: first_capture(&text, &EXAM_NAME),
        exam_date: first_capture(&text, &EXAM_DATE),
        exam_time: first_capture(&text, &EXAM_TIME),
        venue_name: first_capture(&text, &VENUE_NAME),
    };
    let answers = recover_answers(&text);
    tracing::info!(
        "recovered {} answers from view-source dump ({} bytes)",
        answers.len(),
        raw.len()
    );
    RecoveredPage { fields, answers }
}

/// Answer triples found anywhere in `text`, unique and ascending.
pub fn recover_answers(text: &str) -> Vec<Question> {
    let found = ANSWER
        .captures_iter(text)
        .filter_map(|caps| answer_triple(&caps))
        .collect();
    normalize_questions(found)
}

fn answer_triple(caps: &Captures<'_>) -> Option<Question> {
    let number: u32 = caps[1].parse().ok()?;
    if !(1..=MAX_RECOVERED_QUESTION).contains(&number) {
        return None;
    }
    let user: Choice = caps[2].parse().ok()?;
    let correct: Choice = caps[3].parse().ok()?;
    Some(Question::new(number, UserAnswer::Chosen(user), correct))
}

fn first_capture(text: &str, patterns: &[Regex]) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| normalize_ws(m.as_str()))
            .filter(|v| !v.is_empty())
    })
}

/// Reduce a dump to plain text lines.
///
/// Real tags are stripped, entities decoded, and the tags that decoding
/// reveals stripped again. Block-level tags become line breaks.
pub fn flatten(raw: &str) -> String {
    let decoded = decode_entities(&strip_tags(raw));
    strip_tags(&decoded)
        .lines()
        .map(normalize_ws)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_tags(s: &str) -> String {
    let broken = BLOCK_TAG.replace_all(s, "\n");
    ANY_TAG.replace_all(&broken, " ").into_owned()
}

fn decode_entities(s: &str) -> String {
    let named = s
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&apos;", "'");
    let numeric = NUMERIC_ENTITY.replace_all(&named, |caps: &Captures<'_>| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (_, Some(dec)) => dec.as_str().parse().ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });
    numeric.replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::grid::extract_subjects;
    use crate::extract::page::Page;

    /// A dump in the shape browsers produce: one table row per source line,
    /// the original markup entity-encoded inside the line cells.
    fn dump(source_lines: &[&str]) -> String {
        let mut out = String::from("<html><head><title>view-source:https://ssc.digialm.com/x</title></head><body><table>");
        for (i, line) in source_lines.iter().enumerate() {
            out.push_str(&format!(
                "<tr><td class=\"line-number\" value=\"{n}\"></td><td class=\"line-content\">{}</td></tr>",
                html_escape(line),
                n = i + 1
            ));
        }
        out.push_str("</table></body></html>");
        out
    }

    #[test]
    fn detects_view_source_markers() {
        assert!(looks_like_view_source("view-source:https://x"));
        assert!(looks_like_view_source("<td class=\"line-content\">"));
        assert!(!looks_like_view_source("<html><body>hi</body></html>"));
    }

    #[test]
    fn flatten_reveals_encoded_markup() {
        let text = flatten("<span>&lt;td&gt;Roll Number&lt;/td&gt;&lt;td&gt;12&amp;3&lt;/td&gt;</span>");
        assert_eq!(text, "Roll Number\n12&3");
        assert_eq!(flatten("a&#65;&#x42;&nbsp;c"), "aAB c");
    }

    #[test]
    fn answer_triples_in_order() {
        let answers = recover_answers("12 A B ... 13 C C ...");
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].question_number, 12);
        assert_eq!(answers[0].user_answer, UserAnswer::Chosen(Choice::A));
        assert_eq!(answers[0].correct_answer, Choice::B);
        assert!(!answers[0].is_correct);
        assert_eq!(answers[0].marks, -0.5);
        assert_eq!(answers[1].question_number, 13);
        assert!(answers[1].is_correct);
        assert_eq!(answers[1].marks, 2.0);
    }

    #[test]
    fn duplicates_collapse_to_first_and_range_is_enforced() {
        let answers = recover_answers("7 D D\n3 A B\n7 A B\n0 A A\n201 B B\n150 C D\n3 C C");
        let numbers: Vec<u32> = answers.iter().map(|q| q.question_number).collect();
        assert_eq!(numbers, vec![3, 7, 150]);
        assert!(answers[1].is_correct);
        assert!(!answers[0].is_correct);
    }

    #[test]
    fn words_are_not_answers() {
        assert!(recover_answers("5 CANDIDATES and 10 BAD rows").is_empty());
        assert!(recover_answers("2405027590").is_empty());
    }

    #[test]
    fn fields_from_encoded_dump() {
        let raw = dump(&[
            "<table class=\"main-info-tbl\">",
            "<tr><td>Candidate Name</td><td>ASHA KUMARI</td></tr>",
            "<tr><td>Roll Number</td><td>2405027590</td></tr>",
            "<tr><td>Exam Date</td><td>15/12/2024</td></tr>",
            "<tr><td>Exam Time</td><td>9:00 AM - 10:00 AM</td></tr>",
            "<tr><td>Venue Name</td><td>iON Digital Zone</td></tr>",
            "</table>",
        ]);
        let page = recover(&raw);
        assert_eq!(page.fields.candidate_name.as_deref(), Some("ASHA KUMARI"));
        assert_eq!(page.fields.roll_number.as_deref(), Some("2405027590"));
        assert_eq!(page.fields.exam_date.as_deref(), Some("15/12/2024"));
        assert_eq!(page.fields.exam_time.as_deref(), Some("9:00 AM - 10:00 AM"));
        assert_eq!(page.fields.venue_name.as_deref(), Some("iON Digital Zone"));
        assert_eq!(page.fields.exam_name, None);
    }

    #[test]
    fn colon_labels_in_plain_text() {
        let page = recover("Candidate Name : RAVI SHARMA\nRoll No: 3001234567\nExam Name: CGL Tier 1");
        assert_eq!(page.fields.candidate_name.as_deref(), Some("RAVI SHARMA"));
        assert_eq!(page.fields.roll_number.as_deref(), Some("3001234567"));
        assert_eq!(page.fields.exam_name.as_deref(), Some("CGL Tier 1"));
    }

    #[test]
    fn synthetic_html_round_trips_through_grid_extraction() {
        let mut lines = vec!["<table>".to_string()];
        for n in (1..=60u32).rev() {
            let user = ["A", "B", "C", "D"][(n % 4) as usize];
            let correct = ["A", "B", "C", "D"][(n % 3) as usize];
            lines.push(format!("<tr><td>{n}</td><td>{user}</td><td>{correct}</td></tr>"));
        }
        lines.push("</table>".to_string());
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let recovered = recover(&dump(&refs));
        assert_eq!(recovered.answers.len(), 60);

        let page = Page::parse(&recovered.to_synthetic_html());
        let subjects = extract_subjects(&page);
        assert_eq!(subjects.len(), 3);
        assert_eq!(subjects[2].questions.len(), 10);
        let round_tripped: Vec<Question> = subjects.into_iter().flat_map(|s| s.questions).collect();
        assert_eq!(round_tripped, recovered.answers);
    }

    #[test]
    fn tiny_answer_sets_still_form_a_grid() {
        let recovered = recover("view-source: 1 A A 2 B C");
        let subjects = extract_subjects(&Page::parse(&recovered.to_synthetic_html()));
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].questions, recovered.answers);
    }
}
