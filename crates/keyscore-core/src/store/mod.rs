//! The `PopulationStore` trait and the population state its backends share.
//!
//! All writes are append-only: candidates, results, and subject scores are
//! created once and never updated or deleted. Callers that read the
//! population, compute a rank, and write a result must serialize that
//! sequence themselves and bracket it with [`PopulationStore::begin`] and a
//! commit or rollback; see [`crate::engine::ScoreEngine`].

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{
    Candidate, ExamResult, NewCandidate, NewExamResult, NewSubjectScore, Shift, SubjectScore,
};
use crate::statistics::mean;

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Abstraction over the candidate population backend.
///
/// Queries only see committed-or-staged writes made before the call; a
/// submission that has created its candidate but not yet its result does not
/// appear in any result query.
#[async_trait]
pub trait PopulationStore: Send + Sync {
    /// Persist a new candidate. Roll numbers are not required to be unique.
    async fn create_candidate(&self, candidate: NewCandidate) -> Result<Candidate, StoreError>;

    /// The first candidate stored with this roll number.
    async fn get_candidate_by_roll_number(
        &self,
        roll_number: &str,
    ) -> Result<Option<Candidate>, StoreError>;

    /// Persist the result for an existing candidate.
    async fn create_exam_result(&self, result: NewExamResult) -> Result<ExamResult, StoreError>;

    /// The result recorded for a candidate, if any.
    async fn get_exam_result(&self, candidate_id: Uuid) -> Result<Option<ExamResult>, StoreError>;

    async fn get_all_exam_results(&self) -> Result<Vec<ExamResult>, StoreError>;

    /// Results whose candidate belongs to `category`.
    async fn get_exam_results_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<ExamResult>, StoreError>;

    /// Results whose candidate sat the given shift.
    async fn get_exam_results_by_shift(&self, shift: &Shift)
        -> Result<Vec<ExamResult>, StoreError>;

    /// Persist a batch of subject scores for an existing result.
    async fn create_subject_scores(
        &self,
        scores: Vec<NewSubjectScore>,
    ) -> Result<Vec<SubjectScore>, StoreError>;

    async fn get_subject_scores_by_result_id(
        &self,
        result_id: Uuid,
    ) -> Result<Vec<SubjectScore>, StoreError>;

    /// Number of candidates created so far, with or without a result.
    async fn get_total_candidates_count(&self) -> Result<usize, StoreError>;

    /// Mean overall score of results in `category`, or 0 if there are none.
    async fn get_category_average_score(&self, category: &str) -> Result<f64, StoreError> {
        let results = self.get_exam_results_by_category(category).await?;
        Ok(mean(&overall_scores(&results)))
    }

    /// Mean overall score of results in `shift`, or 0 if there are none.
    async fn get_shift_average_score(&self, shift: &Shift) -> Result<f64, StoreError> {
        let results = self.get_exam_results_by_shift(shift).await?;
        Ok(mean(&overall_scores(&results)))
    }

    /// Start a read-compute-write unit. Backends shared between processes
    /// take an exclusive lock here and refresh their view of the population;
    /// the lock is released by [`commit`](Self::commit) or
    /// [`rollback`](Self::rollback).
    async fn begin(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Make every write since the last commit durable.
    async fn commit(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Discard every write since the last commit.
    async fn rollback(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Overall scores of a slice of results, in order.
pub fn overall_scores(results: &[ExamResult]) -> Vec<f64> {
    results.iter().map(|r| r.overall_score).collect()
}

// ---------------------------------------------------------------------------
// Shared population state
// ---------------------------------------------------------------------------

/// The full, append-only population. Insertion order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Population {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub exam_results: Vec<ExamResult>,
    #[serde(default)]
    pub subject_scores: Vec<SubjectScore>,
}

impl Population {
    pub(crate) fn insert_candidate(&mut self, new: NewCandidate) -> Candidate {
        let candidate = Candidate {
            id: Uuid::new_v4(),
            candidate_name: new.candidate_name,
            roll_number: new.roll_number,
            exam_name: new.exam_name,
            exam_date: new.exam_date,
            exam_time: new.exam_time,
            venue_name: new.venue_name,
            category: new.category,
            sub_category: new.sub_category.filter(|s| !s.is_empty()),
            gender: new.gender,
            state: new.state,
            language: new.language,
            answer_key_url: new.answer_key_url.filter(|s| !s.is_empty()),
            created_at: Utc::now(),
        };
        self.candidates.push(candidate.clone());
        candidate
    }

    pub(crate) fn insert_exam_result(
        &mut self,
        new: NewExamResult,
    ) -> Result<ExamResult, StoreError> {
        if !self.candidates.iter().any(|c| c.id == new.candidate_id) {
            return Err(StoreError::MissingReference {
                kind: "candidate",
                id: new.candidate_id.to_string(),
            });
        }
        let result = ExamResult {
            id: Uuid::new_v4(),
            candidate_id: new.candidate_id,
            overall_score: new.overall_score,
            max_score: new.max_score,
            total_attempted: new.total_attempted,
            total_not_attempted: new.total_not_attempted,
            total_correct: new.total_correct,
            total_wrong: new.total_wrong,
            percentile: new.percentile,
            overall_rank: new.overall_rank,
            shift_rank: new.shift_rank,
            category_rank: new.category_rank,
            shift_average: new.shift_average,
            category_average: new.category_average,
            created_at: Utc::now(),
        };
        self.exam_results.push(result.clone());
        Ok(result)
    }

    pub(crate) fn insert_subject_scores(
        &mut self,
        batch: Vec<NewSubjectScore>,
    ) -> Result<Vec<SubjectScore>, StoreError> {
        // Validate the whole batch before writing any of it.
        for new in &batch {
            if !self.exam_results.iter().any(|r| r.id == new.result_id) {
                return Err(StoreError::MissingReference {
                    kind: "exam result",
                    id: new.result_id.to_string(),
                });
            }
        }
        let scores: Vec<SubjectScore> = batch
            .into_iter()
            .map(|new| SubjectScore {
                id: Uuid::new_v4(),
                result_id: new.result_id,
                subject_name: new.subject_name,
                attempted: new.attempted,
                not_attempted: new.not_attempted,
                correct: new.correct,
                wrong: new.wrong,
                total_marks: new.total_marks,
                max_marks: new.max_marks,
            })
            .collect();
        self.subject_scores.extend(scores.iter().cloned());
        Ok(scores)
    }

    /// Append every entity of `other` whose id is not already present.
    pub(crate) fn append(&mut self, other: Population) {
        let known: HashSet<Uuid> = self.candidates.iter().map(|c| c.id).collect();
        self.candidates
            .extend(other.candidates.into_iter().filter(|c| !known.contains(&c.id)));
        let known: HashSet<Uuid> = self.exam_results.iter().map(|r| r.id).collect();
        self.exam_results
            .extend(other.exam_results.into_iter().filter(|r| !known.contains(&r.id)));
        let known: HashSet<Uuid> = self.subject_scores.iter().map(|s| s.id).collect();
        self.subject_scores
            .extend(other.subject_scores.into_iter().filter(|s| !known.contains(&s.id)));
    }

    pub(crate) fn candidate_by_roll_number(&self, roll_number: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.roll_number == roll_number)
    }

    pub(crate) fn exam_result_for(&self, candidate_id: Uuid) -> Option<&ExamResult> {
        self.exam_results
            .iter()
            .find(|r| r.candidate_id == candidate_id)
    }

    /// Results whose candidate satisfies `predicate`.
    pub(crate) fn results_where(&self, predicate: impl Fn(&Candidate) -> bool) -> Vec<ExamResult> {
        let ids: HashSet<Uuid> = self
            .candidates
            .iter()
            .filter(|c| predicate(c))
            .map(|c| c.id)
            .collect();
        self.exam_results
            .iter()
            .filter(|r| ids.contains(&r.candidate_id))
            .cloned()
            .collect()
    }

    pub(crate) fn subject_scores_for(&self, result_id: Uuid) -> Vec<SubjectScore> {
        self.subject_scores
            .iter()
            .filter(|s| s.result_id == result_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn new_candidate(roll: &str, category: &str, date: &str, time: &str) -> NewCandidate {
        NewCandidate {
            candidate_name: format!("Candidate {roll}"),
            roll_number: roll.into(),
            exam_name: "SSC CGL".into(),
            exam_date: date.into(),
            exam_time: time.into(),
            venue_name: "Centre".into(),
            category: category.into(),
            sub_category: None,
            gender: "Female".into(),
            state: "Delhi".into(),
            language: "English".into(),
            answer_key_url: None,
        }
    }

    pub(crate) fn new_result(candidate_id: Uuid, score: f64) -> NewExamResult {
        NewExamResult {
            candidate_id,
            overall_score: score,
            max_score: 200.0,
            total_attempted: 0,
            total_not_attempted: 0,
            total_correct: 0,
            total_wrong: 0,
            percentile: 0.0,
            overall_rank: 1,
            shift_rank: 1,
            category_rank: 1,
            shift_average: 0.0,
            category_average: 0.0,
        }
    }

    #[test]
    fn result_requires_existing_candidate() {
        let mut population = Population::default();
        let err = population
            .insert_exam_result(new_result(Uuid::new_v4(), 10.0))
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingReference { kind: "candidate", .. }));
    }

    #[test]
    fn subject_batch_is_all_or_nothing() {
        let mut population = Population::default();
        let c = population.insert_candidate(new_candidate("1", "GEN", "d", "t"));
        let r = population.insert_exam_result(new_result(c.id, 10.0)).unwrap();
        let good = NewSubjectScore {
            result_id: r.id,
            subject_name: "Maths".into(),
            attempted: 1,
            not_attempted: 0,
            correct: 1,
            wrong: 0,
            total_marks: 2.0,
            max_marks: 2.0,
        };
        let bad = NewSubjectScore {
            result_id: Uuid::new_v4(),
            ..good.clone()
        };
        assert!(population.insert_subject_scores(vec![good, bad]).is_err());
        assert!(population.subject_scores.is_empty());
    }

    #[test]
    fn append_skips_known_entities() {
        let mut base = Population::default();
        let c = base.insert_candidate(new_candidate("1", "GEN", "d", "t"));
        let mut other = base.clone();
        other.insert_candidate(new_candidate("2", "GEN", "d", "t"));
        let r = other.insert_exam_result(new_result(c.id, 4.0)).unwrap();

        base.append(other);
        assert_eq!(base.candidates.len(), 2);
        assert_eq!(base.exam_results.len(), 1);
        assert_eq!(base.exam_results[0].id, r.id);
    }

    #[test]
    fn empty_optionals_are_stored_as_none() {
        let mut population = Population::default();
        let mut new = new_candidate("1", "GEN", "d", "t");
        new.sub_category = Some(String::new());
        new.answer_key_url = Some(String::new());
        let c = population.insert_candidate(new);
        assert!(c.sub_category.is_none());
        assert!(c.answer_key_url.is_none());
    }
}
