//! Reading question numbers and answer options out of loose cell text.

use std::collections::HashSet;

use crate::model::{Choice, Question, UserAnswer};

/// Markers pages use for an unanswered question.
const NOT_ATTEMPTED_MARKERS: [&str; 8] = [
    "",
    "-",
    "--",
    "na",
    "n/a",
    "not attempted",
    "not answered",
    "unattempted",
];

/// Read an answer option from cell text.
///
/// Accepts `A`-`D` in any case, `1`-`4`, and decorated forms such as
/// `Option B`, `(c)` or `Ans: D`.
pub fn read_choice(text: &str) -> Option<Choice> {
    let lowered = text.trim().to_ascii_lowercase();
    let stripped = lowered
        .trim_start_matches("chosen option")
        .trim_start_matches("option")
        .trim_start_matches("opt")
        .trim_start_matches("ans");
    let core: String = stripped
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if core.len() != 1 {
        return None;
    }
    let c = core.chars().next()?;
    match c {
        'a'..='d' => c.to_ascii_uppercase().to_string().parse().ok(),
        '1'..='4' => c.to_digit(10).and_then(Choice::from_index),
        _ => None,
    }
}

/// Read the candidate's answer from cell text.
///
/// Empty cells and explicit markers are not attempted. Text that is neither
/// a marker nor an option is also scored as not attempted rather than as a
/// wrong answer.
pub fn read_user_answer(text: &str) -> UserAnswer {
    let normalized = text.trim().to_ascii_lowercase();
    if NOT_ATTEMPTED_MARKERS.contains(&normalized.as_str()) {
        return UserAnswer::NotAttempted;
    }
    match read_choice(text) {
        Some(choice) => UserAnswer::Chosen(choice),
        None => {
            tracing::debug!("unreadable user answer {text:?}, scoring as not attempted");
            UserAnswer::NotAttempted
        }
    }
}

/// Read the official answer from cell text, defaulting to `A`.
pub fn read_correct_answer(text: &str) -> Choice {
    read_choice(text).unwrap_or_else(|| {
        if !text.trim().is_empty() {
            tracing::debug!("unreadable correct answer {text:?}, defaulting to A");
        }
        Choice::A
    })
}

/// Read a question number from the leading digits of cell text.
///
/// `12`, `12.`, `Q12`, `Q.No. 12` all read as 12; text with no leading
/// number reads as `None`.
pub fn read_question_number(text: &str) -> Option<u32> {
    let trimmed = text.trim();
    let without_prefix = trimmed
        .strip_prefix("Q.No.")
        .or_else(|| trimmed.strip_prefix("Q."))
        .or_else(|| trimmed.strip_prefix('Q'))
        .or_else(|| trimmed.strip_prefix('q'))
        .unwrap_or(trimmed)
        .trim_start();
    let digits: String = without_prefix
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Collapse duplicate question numbers and order questions ascending.
///
/// The first occurrence of a number wins; later duplicates are dropped.
pub fn normalize_questions(questions: Vec<Question>) -> Vec<Question> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Question> = questions
        .into_iter()
        .filter(|q| seen.insert(q.question_number))
        .collect();
    unique.sort_by_key(|q| q.question_number);
    unique
}
