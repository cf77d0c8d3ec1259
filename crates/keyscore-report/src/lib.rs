//! keyscore-report: scorecard rendering.

pub mod html;

pub use html::{generate_html, write_html_report, Scorecard};
