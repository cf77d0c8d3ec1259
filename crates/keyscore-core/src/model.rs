//! Core data model types for keyscore.
//!
//! Field names serialize in camelCase; the JSON shape of [`ParsedAnswerKey`]
//! and [`CalculatedResults`] is relied on by every consumer of the pipeline.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marks awarded for a correct answer.
pub const CORRECT_MARKS: f64 = 2.0;
/// Marks awarded for a question left unanswered.
pub const UNATTEMPTED_MARKS: f64 = 0.0;
/// Marks awarded (deducted) for a wrong answer.
pub const WRONG_MARKS: f64 = -0.5;
/// Maximum marks any single question can contribute.
pub const MAX_MARKS_PER_QUESTION: f64 = 2.0;

/// Sentinel text for an unanswered question.
pub const NOT_ATTEMPTED: &str = "Not Attempted";

/// One of the four answer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    A,
    B,
    C,
    D,
}

impl Choice {
    pub const ALL: [Choice; 4] = [Choice::A, Choice::B, Choice::C, Choice::D];

    /// Map a 1-based option index (as some pages print them) to a choice.
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            1 => Some(Choice::A),
            2 => Some(Choice::B),
            3 => Some(Choice::C),
            4 => Some(Choice::D),
            _ => None,
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Choice::A => "A",
            Choice::B => "B",
            Choice::C => "C",
            Choice::D => "D",
        };
        f.write_str(letter)
    }
}

impl FromStr for Choice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Choice::A),
            "B" => Ok(Choice::B),
            "C" => Ok(Choice::C),
            "D" => Ok(Choice::D),
            other => Err(format!("unknown option: {other}")),
        }
    }
}

/// What the candidate marked for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum UserAnswer {
    Chosen(Choice),
    NotAttempted,
}

impl UserAnswer {
    pub fn is_attempted(&self) -> bool {
        matches!(self, UserAnswer::Chosen(_))
    }
}

impl fmt::Display for UserAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserAnswer::Chosen(choice) => write!(f, "{choice}"),
            UserAnswer::NotAttempted => f.write_str(NOT_ATTEMPTED),
        }
    }
}

impl From<UserAnswer> for String {
    fn from(answer: UserAnswer) -> Self {
        answer.to_string()
    }
}

impl TryFrom<String> for UserAnswer {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.eq_ignore_ascii_case(NOT_ATTEMPTED) {
            return Ok(UserAnswer::NotAttempted);
        }
        value.parse().map(UserAnswer::Chosen)
    }
}

impl From<Choice> for UserAnswer {
    fn from(choice: Choice) -> Self {
        UserAnswer::Chosen(choice)
    }
}

/// A single scored question.
///
/// `is_correct` and `marks` are derived from the two answers whenever a
/// question is built or deserialized, so they can never disagree with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "QuestionAnswers")]
pub struct Question {
    pub question_number: u32,
    pub user_answer: UserAnswer,
    pub correct_answer: Choice,
    pub is_correct: bool,
    pub marks: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionAnswers {
    question_number: u32,
    user_answer: UserAnswer,
    correct_answer: Choice,
}

impl From<QuestionAnswers> for Question {
    fn from(q: QuestionAnswers) -> Self {
        Question::new(q.question_number, q.user_answer, q.correct_answer)
    }
}

impl Question {
    pub fn new(question_number: u32, user_answer: UserAnswer, correct_answer: Choice) -> Self {
        let is_correct = user_answer == UserAnswer::Chosen(correct_answer);
        let marks = if is_correct {
            CORRECT_MARKS
        } else if user_answer.is_attempted() {
            WRONG_MARKS
        } else {
            UNATTEMPTED_MARKS
        };
        Self {
            question_number,
            user_answer,
            correct_answer,
            is_correct,
            marks,
        }
    }
}

/// A subject section of the answer key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub name: String,
    pub questions: Vec<Question>,
}

/// Which extraction path produced an answer key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyOrigin {
    /// Answer grids were found in structured HTML.
    Parsed,
    /// A raw view-source dump was recovered, then parsed.
    Recovered,
    /// No answer grid was found; subjects are random fallback data.
    Synthetic,
    /// Demo data, requested explicitly or substituted after a failed fetch.
    Demo,
}

impl KeyOrigin {
    /// Returns `true` if the answers came from the candidate's actual page.
    pub fn is_genuine(&self) -> bool {
        matches!(self, KeyOrigin::Parsed | KeyOrigin::Recovered)
    }
}

impl fmt::Display for KeyOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyOrigin::Parsed => write!(f, "parsed"),
            KeyOrigin::Recovered => write!(f, "recovered"),
            KeyOrigin::Synthetic => write!(f, "synthetic"),
            KeyOrigin::Demo => write!(f, "demo"),
        }
    }
}

/// The normalized result of extracting an answer-key page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedAnswerKey {
    pub candidate_name: String,
    pub roll_number: String,
    pub exam_name: String,
    pub exam_date: String,
    pub exam_time: String,
    pub venue_name: String,
    pub subjects: Vec<Subject>,
    /// Which extraction path produced this key.
    pub origin: KeyOrigin,
}

impl ParsedAnswerKey {
    /// The exam session this key belongs to.
    pub fn shift(&self) -> Shift {
        Shift::new(&self.exam_date, &self.exam_time)
    }

    /// Total number of questions across all subjects.
    pub fn question_count(&self) -> usize {
        self.subjects.iter().map(|s| s.questions.len()).sum()
    }

    /// Iterate every question in subject order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.subjects.iter().flat_map(|s| s.questions.iter())
    }
}

/// An exam sitting, identified by its date and time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub exam_date: String,
    pub exam_time: String,
}

impl Shift {
    pub fn new(exam_date: &str, exam_time: &str) -> Self {
        Self {
            exam_date: exam_date.to_string(),
            exam_time: exam_time.to_string(),
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.exam_date, self.exam_time)
    }
}

// ---------------------------------------------------------------------------
// Stored entities
// ---------------------------------------------------------------------------

/// Fields supplied when creating a [`Candidate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCandidate {
    pub candidate_name: String,
    pub roll_number: String,
    pub exam_name: String,
    pub exam_date: String,
    pub exam_time: String,
    pub venue_name: String,
    pub category: String,
    #[serde(default)]
    pub sub_category: Option<String>,
    pub gender: String,
    pub state: String,
    pub language: String,
    #[serde(default)]
    pub answer_key_url: Option<String>,
}

/// A submitted candidate. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: Uuid,
    pub candidate_name: String,
    pub roll_number: String,
    pub exam_name: String,
    pub exam_date: String,
    pub exam_time: String,
    pub venue_name: String,
    pub category: String,
    pub sub_category: Option<String>,
    pub gender: String,
    pub state: String,
    pub language: String,
    pub answer_key_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Candidate {
    pub fn shift(&self) -> Shift {
        Shift::new(&self.exam_date, &self.exam_time)
    }
}

/// Fields supplied when creating an [`ExamResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExamResult {
    pub candidate_id: Uuid,
    pub overall_score: f64,
    pub max_score: f64,
    pub total_attempted: u32,
    pub total_not_attempted: u32,
    pub total_correct: u32,
    pub total_wrong: u32,
    pub percentile: f64,
    pub overall_rank: u32,
    pub shift_rank: u32,
    pub category_rank: u32,
    pub shift_average: f64,
    pub category_average: f64,
}

/// The scored outcome of one submission. One-to-one with a [`Candidate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub overall_score: f64,
    pub max_score: f64,
    pub total_attempted: u32,
    pub total_not_attempted: u32,
    pub total_correct: u32,
    pub total_wrong: u32,
    pub percentile: f64,
    pub overall_rank: u32,
    pub shift_rank: u32,
    pub category_rank: u32,
    pub shift_average: f64,
    pub category_average: f64,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a [`SubjectScore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubjectScore {
    pub result_id: Uuid,
    pub subject_name: String,
    pub attempted: u32,
    pub not_attempted: u32,
    pub correct: u32,
    pub wrong: u32,
    pub total_marks: f64,
    pub max_marks: f64,
}

/// Per-subject breakdown of an [`ExamResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectScore {
    pub id: Uuid,
    pub result_id: Uuid,
    pub subject_name: String,
    pub attempted: u32,
    pub not_attempted: u32,
    pub correct: u32,
    pub wrong: u32,
    pub total_marks: f64,
    pub max_marks: f64,
}

// ---------------------------------------------------------------------------
// Calculator output
// ---------------------------------------------------------------------------

/// Counts and marks for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectBreakdown {
    pub subject_name: String,
    pub attempted: u32,
    pub not_attempted: u32,
    pub correct: u32,
    pub wrong: u32,
    pub total_marks: f64,
    pub max_marks: f64,
}

/// Everything the score calculator derives for one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedResults {
    pub overall_score: f64,
    pub max_score: f64,
    pub total_attempted: u32,
    pub total_not_attempted: u32,
    pub total_correct: u32,
    pub total_wrong: u32,
    pub percentile: f64,
    pub overall_rank: u32,
    pub shift_rank: u32,
    pub category_rank: u32,
    pub shift_average: f64,
    pub category_average: f64,
    pub subject_scores: Vec<SubjectBreakdown>,
}

impl CalculatedResults {
    /// Build the store record for this result.
    pub fn to_new_result(&self, candidate_id: Uuid) -> NewExamResult {
        NewExamResult {
            candidate_id,
            overall_score: self.overall_score,
            max_score: self.max_score,
            total_attempted: self.total_attempted,
            total_not_attempted: self.total_not_attempted,
            total_correct: self.total_correct,
            total_wrong: self.total_wrong,
            percentile: self.percentile,
            overall_rank: self.overall_rank,
            shift_rank: self.shift_rank,
            category_rank: self.category_rank,
            shift_average: self.shift_average,
            category_average: self.category_average,
        }
    }

    /// Build the per-subject store records for this result.
    pub fn to_new_subject_scores(&self, result_id: Uuid) -> Vec<NewSubjectScore> {
        self.subject_scores
            .iter()
            .map(|s| NewSubjectScore {
                result_id,
                subject_name: s.subject_name.clone(),
                attempted: s.attempted,
                not_attempted: s.not_attempted,
                correct: s.correct,
                wrong: s.wrong,
                total_marks: s.total_marks,
                max_marks: s.max_marks,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_marks_follow_the_scheme() {
        let correct = Question::new(1, Choice::C.into(), Choice::C);
        assert!(correct.is_correct);
        assert_eq!(correct.marks, 2.0);

        let wrong = Question::new(2, Choice::A.into(), Choice::B);
        assert!(!wrong.is_correct);
        assert_eq!(wrong.marks, -0.5);

        let skipped = Question::new(3, UserAnswer::NotAttempted, Choice::A);
        assert!(!skipped.is_correct);
        assert_eq!(skipped.marks, 0.0);
    }

    #[test]
    fn marks_are_two_exactly_when_correct() {
        for user in Choice::ALL
            .iter()
            .map(|c| UserAnswer::Chosen(*c))
            .chain(std::iter::once(UserAnswer::NotAttempted))
        {
            for correct in Choice::ALL {
                let q = Question::new(1, user, correct);
                assert!([2.0, 0.0, -0.5].contains(&q.marks));
                assert_eq!(q.marks == 2.0, q.is_correct);
            }
        }
    }

    #[test]
    fn user_answer_serializes_as_letter_or_sentinel() {
        assert_eq!(
            serde_json::to_string(&UserAnswer::Chosen(Choice::B)).unwrap(),
            "\"B\""
        );
        assert_eq!(
            serde_json::to_string(&UserAnswer::NotAttempted).unwrap(),
            "\"Not Attempted\""
        );
        let parsed: UserAnswer = serde_json::from_str("\"not attempted\"").unwrap();
        assert_eq!(parsed, UserAnswer::NotAttempted);
        assert!(serde_json::from_str::<UserAnswer>("\"E\"").is_err());
    }

    #[test]
    fn deserialized_question_recomputes_derived_fields() {
        let json = r#"{"questionNumber":7,"userAnswer":"D","correctAnswer":"D","isCorrect":false,"marks":-0.5}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert!(q.is_correct);
        assert_eq!(q.marks, 2.0);
    }

    #[test]
    fn parsed_key_uses_camel_case_contract() {
        let key = ParsedAnswerKey {
            candidate_name: "A".into(),
            roll_number: "1".into(),
            exam_name: "E".into(),
            exam_date: "01/01/2024".into(),
            exam_time: "09:00 AM".into(),
            venue_name: "V".into(),
            subjects: vec![Subject {
                name: "S".into(),
                questions: vec![Question::new(1, Choice::A.into(), Choice::A)],
            }],
            origin: KeyOrigin::Parsed,
        };
        let value = serde_json::to_value(&key).unwrap();
        assert_eq!(value["candidateName"], "A");
        assert_eq!(value["venueName"], "V");
        assert_eq!(value["origin"], "parsed");
        assert_eq!(value["subjects"][0]["questions"][0]["isCorrect"], true);
        assert_eq!(key.question_count(), 1);
        assert_eq!(key.shift(), Shift::new("01/01/2024", "09:00 AM"));
    }

    #[test]
    fn choice_parse_and_index() {
        assert_eq!(" c ".parse::<Choice>().unwrap(), Choice::C);
        assert!("E".parse::<Choice>().is_err());
        assert_eq!(Choice::from_index(4), Some(Choice::D));
        assert_eq!(Choice::from_index(0), None);
    }
}
