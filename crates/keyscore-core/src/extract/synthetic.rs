//! Randomly generated answer keys for demo mode and the no-grid fallback.
//!
//! Keys built here are always flagged with [`KeyOrigin::Demo`] or
//! [`KeyOrigin::Synthetic`] so they can never be mistaken for parsed data.

use rand::Rng;

use super::fields::CandidateFields;
use super::grid::{QUESTIONS_PER_SUBJECT, SUBJECT_NAMES};
use crate::model::{Choice, KeyOrigin, ParsedAnswerKey, Question, Subject, UserAnswer};

/// Share of generated questions left unanswered.
pub const NOT_ATTEMPTED_RATE: f64 = 0.1;

pub const DEMO_CANDIDATE_NAME: &str = "DEMO CANDIDATE";
pub const DEMO_ROLL_NUMBER: &str = "2405027590";
pub const DEMO_EXAM_NAME: &str = "SSC CGL Tier 1 Examination 2024";
pub const DEMO_EXAM_DATE: &str = "15/12/2024";
pub const DEMO_EXAM_TIME: &str = "02:30 PM - 04:30 PM";
pub const DEMO_VENUE_NAME: &str = "XYZ EXAMINATION CENTER, NEW DELHI";

/// Four 25-question subjects with random answers, numbered 1..=100.
pub fn random_subjects(rng: &mut impl Rng) -> Vec<Subject> {
    SUBJECT_NAMES
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let first = (index * QUESTIONS_PER_SUBJECT) as u32 + 1;
            let questions = (0..QUESTIONS_PER_SUBJECT as u32)
                .map(|i| random_question(rng, first + i))
                .collect();
            Subject {
                name: name.to_string(),
                questions,
            }
        })
        .collect()
}

fn random_question(rng: &mut impl Rng, question_number: u32) -> Question {
    let user_answer = if rng.gen_bool(NOT_ATTEMPTED_RATE) {
        UserAnswer::NotAttempted
    } else {
        UserAnswer::Chosen(random_choice(rng))
    };
    Question::new(question_number, user_answer, random_choice(rng))
}

fn random_choice(rng: &mut impl Rng) -> Choice {
    Choice::ALL[rng.gen_range(0..Choice::ALL.len())]
}

/// The demo key: fixed candidate metadata, random answers.
pub fn demo_answer_key() -> ParsedAnswerKey {
    demo_answer_key_with(&mut rand::thread_rng())
}

/// [`demo_answer_key`] with a caller-supplied generator.
pub fn demo_answer_key_with(rng: &mut impl Rng) -> ParsedAnswerKey {
    ParsedAnswerKey {
        candidate_name: DEMO_CANDIDATE_NAME.to_string(),
        roll_number: DEMO_ROLL_NUMBER.to_string(),
        exam_name: DEMO_EXAM_NAME.to_string(),
        exam_date: DEMO_EXAM_DATE.to_string(),
        exam_time: DEMO_EXAM_TIME.to_string(),
        venue_name: DEMO_VENUE_NAME.to_string(),
        subjects: random_subjects(rng),
        origin: KeyOrigin::Demo,
    }
}

/// Fallback key for a page with no answer grid: the page's own candidate
/// fields, random answers.
pub fn synthetic_answer_key(fields: CandidateFields, rng: &mut impl Rng) -> ParsedAnswerKey {
    tracing::warn!(
        "no answer grid found for roll number {:?}, substituting synthetic answers",
        fields.roll_number
    );
    ParsedAnswerKey {
        candidate_name: fields.candidate_name,
        roll_number: fields.roll_number,
        exam_name: fields.exam_name,
        exam_date: fields.exam_date,
        exam_time: fields.exam_time,
        venue_name: fields.venue_name,
        subjects: random_subjects(rng),
        origin: KeyOrigin::Synthetic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn demo_key_shape() {
        let key = demo_answer_key();
        assert_eq!(key.candidate_name, "DEMO CANDIDATE");
        assert_eq!(key.roll_number, "2405027590");
        assert_eq!(key.origin, KeyOrigin::Demo);
        assert_eq!(key.subjects.len(), 4);
        assert!(key.subjects.iter().all(|s| s.questions.len() == 25));
        assert_eq!(key.question_count(), 100);
        let numbers: Vec<u32> = key.questions().map(|q| q.question_number).collect();
        assert_eq!(numbers, (1..=100).collect::<Vec<_>>());
        assert_eq!(key.subjects[2].name, "Quantitative Aptitude");
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = demo_answer_key_with(&mut StdRng::seed_from_u64(7));
        let b = demo_answer_key_with(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn roughly_a_tenth_is_not_attempted() {
        let mut rng = StdRng::seed_from_u64(42);
        let not_attempted = (0..50)
            .flat_map(|_| random_subjects(&mut rng))
            .flat_map(|s| s.questions)
            .filter(|q| !q.user_answer.is_attempted())
            .count();
        // 5000 questions at p = 0.1
        assert!((350..650).contains(&not_attempted), "{not_attempted}");
    }

    #[test]
    fn synthetic_key_keeps_page_fields() {
        let fields = CandidateFields {
            candidate_name: "ASHA".into(),
            roll_number: "1234567".into(),
            exam_name: "CGL".into(),
            exam_date: "01/01/2024".into(),
            exam_time: "9:00 AM".into(),
            venue_name: "Hall 5, Delhi".into(),
        };
        let key = synthetic_answer_key(fields, &mut StdRng::seed_from_u64(1));
        assert_eq!(key.origin, KeyOrigin::Synthetic);
        assert!(!key.origin.is_genuine());
        assert_eq!(key.candidate_name, "ASHA");
        assert_eq!(key.question_count(), 100);
    }
}
