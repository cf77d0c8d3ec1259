//! A parsed answer-key page and the text helpers the heuristics share.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

static CELL: LazyLock<Selector> = LazyLock::new(|| parse_static("td, th"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| parse_static("title"));

/// Parse a selector literal written in this crate.
pub(crate) fn parse_static(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e}"))
}

/// A table cell that may carry a label, with the text of the cell after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCell {
    pub text: String,
    pub next: Option<String>,
}

/// An answer-key page parsed into a DOM, plus the flattened label cells.
pub struct Page {
    document: Html,
    cells: Vec<LabelCell>,
}

impl Page {
    /// Parse (possibly malformed) HTML. Never fails.
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let cells = document
            .select(&CELL)
            .filter(|cell| is_leaf_cell(*cell))
            .map(|cell| LabelCell {
                text: element_text(cell),
                next: next_cell(cell).map(element_text),
            })
            .collect();
        Self { document, cells }
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Innermost table cells in document order.
    pub fn cells(&self) -> &[LabelCell] {
        &self.cells
    }

    /// Text of the `<title>` element, if any.
    pub fn title(&self) -> Option<String> {
        self.document
            .select(&TITLE)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
    }

    /// Text of every element matching `css`, in document order.
    pub fn texts_matching(&self, css: &str) -> Vec<String> {
        match Selector::parse(css) {
            Ok(selector) => self.document.select(&selector).map(element_text).collect(),
            Err(_) => Vec::new(),
        }
    }
}

fn is_cell(element: &ElementRef<'_>) -> bool {
    matches!(element.value().name(), "td" | "th")
}

/// A cell with no nested cells; layout cells wrapping whole tables are skipped.
fn is_leaf_cell(cell: ElementRef<'_>) -> bool {
    !cell
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|e| is_cell(&e))
}

fn next_cell(cell: ElementRef<'_>) -> Option<ElementRef<'_>> {
    cell.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|e| is_cell(e))
}

/// Whitespace-normalized text content of an element.
pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_ws(&element.text().collect::<String>())
}

/// Collapse runs of whitespace into a single space and trim.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape text for insertion into generated HTML.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_cells_pair_with_their_neighbour() {
        let page = Page::parse(
            "<table><tr><td>Candidate Name</td><td> Jane\n Doe </td></tr>\
             <tr><td>Roll Number:</td></tr></table>",
        );
        assert_eq!(
            page.cells(),
            &[
                LabelCell {
                    text: "Candidate Name".into(),
                    next: Some("Jane Doe".into()),
                },
                LabelCell {
                    text: "Jane Doe".into(),
                    next: None,
                },
                LabelCell {
                    text: "Roll Number:".into(),
                    next: None,
                },
            ]
        );
    }

    #[test]
    fn layout_cells_wrapping_tables_are_skipped() {
        let page = Page::parse(
            "<table><tr><td><table><tr><td>Venue</td><td>Hall 5</td></tr></table></td></tr></table>",
        );
        assert_eq!(page.cells().len(), 2);
        assert_eq!(page.cells()[0].text, "Venue");
    }

    #[test]
    fn title_and_class_text() {
        let page = Page::parse(
            "<html><head><title> CGL 2024 </title></head><body><span class=\"exam-date\">01/02/2024</span></body></html>",
        );
        assert_eq!(page.title().as_deref(), Some("CGL 2024"));
        assert_eq!(page.texts_matching(".exam-date"), vec!["01/02/2024"]);
        assert!(page.texts_matching("[[bad").is_empty());
    }

    #[test]
    fn escape_round_trips_through_the_parser() {
        let page = Page::parse(&format!(
            "<table><tr><td>{}</td></tr></table>",
            html_escape("A & B <Centre>")
        ));
        assert_eq!(page.cells()[0].text, "A & B <Centre>");
    }
}
