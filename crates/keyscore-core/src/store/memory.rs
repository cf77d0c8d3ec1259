//! In-memory population store.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::{Population, PopulationStore};
use crate::error::StoreError;
use crate::model::{
    Candidate, ExamResult, NewCandidate, NewExamResult, NewSubjectScore, Shift, SubjectScore,
};

/// A population held entirely in memory. Writes cannot fail except for
/// dangling references, and nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    population: RwLock<Population>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing population.
    pub fn with_population(population: Population) -> Self {
        Self {
            population: RwLock::new(population),
        }
    }

    /// A copy of the current population.
    pub fn snapshot(&self) -> Population {
        self.read().clone()
    }

    /// Replace the whole population.
    pub fn replace(&self, population: Population) {
        *self.write() = population;
    }

    // A panic while holding the lock cannot leave a half-applied write:
    // every mutation is a single push or a pre-validated extend.
    fn read(&self) -> RwLockReadGuard<'_, Population> {
        self.population.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Population> {
        self.population
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PopulationStore for MemoryStore {
    async fn create_candidate(&self, candidate: NewCandidate) -> Result<Candidate, StoreError> {
        Ok(self.write().insert_candidate(candidate))
    }

    async fn get_candidate_by_roll_number(
        &self,
        roll_number: &str,
    ) -> Result<Option<Candidate>, StoreError> {
        Ok(self.read().candidate_by_roll_number(roll_number).cloned())
    }

    async fn create_exam_result(&self, result: NewExamResult) -> Result<ExamResult, StoreError> {
        self.write().insert_exam_result(result)
    }

    async fn get_exam_result(&self, candidate_id: Uuid) -> Result<Option<ExamResult>, StoreError> {
        Ok(self.read().exam_result_for(candidate_id).cloned())
    }

    async fn get_all_exam_results(&self) -> Result<Vec<ExamResult>, StoreError> {
        Ok(self.read().exam_results.clone())
    }

    async fn get_exam_results_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<ExamResult>, StoreError> {
        Ok(self.read().results_where(|c| c.category == category))
    }

    async fn get_exam_results_by_shift(
        &self,
        shift: &Shift,
    ) -> Result<Vec<ExamResult>, StoreError> {
        Ok(self
            .read()
            .results_where(|c| c.exam_date == shift.exam_date && c.exam_time == shift.exam_time))
    }

    async fn create_subject_scores(
        &self,
        scores: Vec<NewSubjectScore>,
    ) -> Result<Vec<SubjectScore>, StoreError> {
        self.write().insert_subject_scores(scores)
    }

    async fn get_subject_scores_by_result_id(
        &self,
        result_id: Uuid,
    ) -> Result<Vec<SubjectScore>, StoreError> {
        Ok(self.read().subject_scores_for(result_id))
    }

    async fn get_total_candidates_count(&self) -> Result<usize, StoreError> {
        Ok(self.read().candidates.len())
    }
}
