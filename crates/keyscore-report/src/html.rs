//! HTML scorecard generator.
//!
//! Produces a self-contained HTML file with all CSS inlined.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use keyscore_core::engine::{CandidateRecord, Submission};
use keyscore_core::extract::page::html_escape;
use keyscore_core::model::{Candidate, ExamResult, KeyOrigin, SubjectScore};

/// What a scorecard shows: a stored result, plus how it was produced when
/// that is known.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scorecard<'a> {
    pub candidate: &'a Candidate,
    pub result: &'a ExamResult,
    pub subject_scores: &'a [SubjectScore],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<KeyOrigin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<&'a str>,
}

impl<'a> From<&'a Submission> for Scorecard<'a> {
    fn from(s: &'a Submission) -> Self {
        Self {
            candidate: &s.candidate,
            result: &s.result,
            subject_scores: &s.subject_scores,
            origin: Some(s.origin),
            fallback_reason: s.fallback_reason.as_deref(),
        }
    }
}

impl<'a> From<&'a CandidateRecord> for Scorecard<'a> {
    fn from(r: &'a CandidateRecord) -> Self {
        Self {
            candidate: &r.candidate,
            result: &r.result,
            subject_scores: &r.subject_scores,
            origin: None,
            fallback_reason: None,
        }
    }
}

/// Generate an HTML scorecard.
pub fn generate_html(card: &Scorecard<'_>) -> String {
    let c = card.candidate;
    let r = card.result;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>Scorecard: {} ({})</title>\n",
        html_escape(&c.candidate_name),
        html_escape(&c.roll_number)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&c.exam_name)));
    html.push_str(&format!(
        "<p class=\"meta\">{} | Roll No. {} | {} {} | {} | generated {}</p>\n",
        html_escape(&c.candidate_name),
        html_escape(&c.roll_number),
        html_escape(&c.exam_date),
        html_escape(&c.exam_time),
        html_escape(&c.venue_name),
        r.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    if let Some(notice) = notice(card) {
        html.push_str(&format!("<p class=\"notice\">{}</p>\n", html_escape(&notice)));
    }

    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Result</h2>\n");
    html.push_str("<table class=\"summary\">\n<tbody>\n");
    let rows = [
        ("Score", format!("{} / {}", r.overall_score, r.max_score)),
        ("Percentile", format!("{:.2}", r.percentile)),
        ("Overall rank", r.overall_rank.to_string()),
        (
            "Category rank",
            format!("{} ({})", r.category_rank, html_escape(&c.category)),
        ),
        ("Shift rank", r.shift_rank.to_string()),
        ("Category average", format!("{:.2}", r.category_average)),
        ("Shift average", format!("{:.2}", r.shift_average)),
        (
            "Attempted",
            format!(
                "{} ({} correct, {} wrong, {} not attempted)",
                r.total_attempted, r.total_correct, r.total_wrong, r.total_not_attempted
            ),
        ),
    ];
    for (label, value) in rows {
        html.push_str(&format!("<tr><th>{label}</th><td>{value}</td></tr>\n"));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    html.push_str("<section class=\"subjects\">\n");
    html.push_str("<h2>Subjects</h2>\n");
    html.push_str("<table class=\"subject-table\">\n");
    html.push_str("<thead><tr><th>Subject</th><th>Attempted</th><th>Correct</th><th>Wrong</th><th>Not attempted</th><th>Marks</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for s in card.subject_scores {
        let class = if s.total_marks >= 0.0 { "pass" } else { "fail" };
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"{}\">{} / {}</td></tr>\n",
            html_escape(&s.subject_name),
            s.attempted,
            s.correct,
            s.wrong,
            s.not_attempted,
            class,
            s.total_marks,
            s.max_marks
        ));
    }
    html.push_str("</tbody></table>\n");
    if !card.subject_scores.is_empty() {
        html.push_str(&generate_bar_chart(card.subject_scores));
    }
    html.push_str("</section>\n");

    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(card).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML scorecard to a file, creating parent directories.
pub fn write_html_report(card: &Scorecard<'_>, path: &Path) -> Result<()> {
    let html = generate_html(card);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write scorecard: {}", path.display()))?;
    Ok(())
}

/// Banner text for scorecards not scored from a real answer key.
fn notice(card: &Scorecard<'_>) -> Option<String> {
    if let Some(reason) = card.fallback_reason {
        return Some(format!(
            "The answer key could not be fetched ({reason}); demo data was scored instead."
        ));
    }
    match card.origin {
        Some(KeyOrigin::Demo) => Some("Scored from demo data.".to_string()),
        Some(KeyOrigin::Synthetic) => {
            Some("No answer grid was found; answers were generated.".to_string())
        }
        _ => None,
    }
}

/// Horizontal bars of marks as a share of each subject's maximum.
fn generate_bar_chart(subjects: &[SubjectScore]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let total_height = subjects.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 80,
        total_height
    );

    for (i, s) in subjects.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let share = if s.max_marks > 0.0 {
            (s.total_marks / s.max_marks).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let width = (share * max_width as f64) as usize;

        let color = if share >= 0.6 {
            "#22c55e"
        } else if share >= 0.3 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&s.subject_name)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{} / {}</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            s.total_marks,
            s.max_marks
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; --warn: #fef3c7; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; --warn: #78350f; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.notice { padding: 0.75rem 1rem; background: var(--warn); border-radius: 8px; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;
