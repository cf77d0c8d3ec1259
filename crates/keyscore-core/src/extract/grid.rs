//! Answer-grid extraction from structured HTML.

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::answers::{
    normalize_questions, read_correct_answer, read_question_number, read_user_answer,
};
use super::page::{element_text, parse_static, Page};
use crate::model::{Question, Subject};

/// Canonical subject names, assigned to grids in document order.
pub const SUBJECT_NAMES: [&str; 4] = [
    "General Intelligence",
    "General Awareness",
    "Quantitative Aptitude",
    "English Language",
];

/// A block needs more rows than this to count as an answer grid.
pub const MIN_GRID_ROWS: usize = 10;
/// Highest question number accepted from a grid row on an ordinary page.
pub const MAX_GRID_QUESTION: u32 = 100;
/// Questions kept per subject.
pub const QUESTIONS_PER_SUBJECT: usize = 25;

static BLOCK: LazyLock<Selector> =
    LazyLock::new(|| parse_static("table, .question-grid, .answer-section"));
static ROW: LazyLock<Selector> = LazyLock::new(|| parse_static("tr"));
static CELL: LazyLock<Selector> = LazyLock::new(|| parse_static("td, th"));

/// Name for the subject at `index` (0-based).
pub fn subject_name(index: usize) -> String {
    SUBJECT_NAMES
        .get(index)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("Subject {}", index + 1))
}

/// Extract one subject per qualifying answer grid, in document order.
///
/// Only innermost blocks are considered, so a layout table wrapping a grid
/// does not produce a second copy of its questions.
pub fn extract_subjects(page: &Page) -> Vec<Subject> {
    extract_subjects_up_to(page, MAX_GRID_QUESTION)
}

/// [`extract_subjects`] with a different highest accepted question number.
pub fn extract_subjects_up_to(page: &Page, max_question: u32) -> Vec<Subject> {
    let mut subjects = Vec::new();
    for block in page.document().select(&BLOCK) {
        if contains_block(block) {
            continue;
        }
        let rows: Vec<ElementRef<'_>> = block.select(&ROW).collect();
        if rows.len() <= MIN_GRID_ROWS {
            continue;
        }
        let questions = grid_questions(&rows, max_question);
        if questions.is_empty() {
            continue;
        }
        let name = subject_name(subjects.len());
        tracing::debug!("answer grid {name}: {} questions", questions.len());
        subjects.push(Subject { name, questions });
    }
    subjects
}

fn contains_block(block: ElementRef<'_>) -> bool {
    block
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|e| BLOCK.matches(&e))
}

fn grid_questions(rows: &[ElementRef<'_>], max_question: u32) -> Vec<Question> {
    let accepted = rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let cells: Vec<String> = row.select(&CELL).map(element_text).collect();
            row_question(index, &cells, max_question)
        })
        .collect();
    let mut questions = normalize_questions(accepted);
    questions.truncate(QUESTIONS_PER_SUBJECT);
    questions
}

/// Build a question from one row's cell texts.
///
/// Column 0 is the question number (falling back to the row index), column 1
/// the candidate's answer, column 2 the official answer. Rows with fewer than
/// three cells or a number outside `1..=max_question` yield nothing.
pub fn row_question(row_index: usize, cells: &[String], max_question: u32) -> Option<Question> {
    if cells.len() < 3 {
        return None;
    }
    let number = read_question_number(&cells[0]).unwrap_or(row_index as u32);
    if !(1..=max_question).contains(&number) {
        return None;
    }
    Some(Question::new(
        number,
        read_user_answer(&cells[1]),
        read_correct_answer(&cells[2]),
    ))
}
