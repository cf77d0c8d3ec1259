//! Score calculation: per-subject tallies, totals, and standing against the
//! stored population.

use crate::error::StoreError;
use crate::model::{
    CalculatedResults, ParsedAnswerKey, Shift, Subject, SubjectBreakdown, MAX_MARKS_PER_QUESTION,
};
use crate::statistics::{percentile, strict_rank};
use crate::store::{overall_scores, PopulationStore};

/// Tally one subject under the fixed marking scheme.
pub fn tally_subject(subject: &Subject) -> SubjectBreakdown {
    let attempted = subject
        .questions
        .iter()
        .filter(|q| q.user_answer.is_attempted())
        .count() as u32;
    let correct = subject.questions.iter().filter(|q| q.is_correct).count() as u32;
    let question_count = subject.questions.len() as u32;
    SubjectBreakdown {
        subject_name: subject.name.clone(),
        attempted,
        not_attempted: question_count - attempted,
        correct,
        wrong: attempted - correct,
        total_marks: subject.questions.iter().map(|q| q.marks).sum(),
        max_marks: question_count as f64 * MAX_MARKS_PER_QUESTION,
    }
}

/// Aggregate totals for a key, before any population lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    pub overall_score: f64,
    pub max_score: f64,
    pub total_attempted: u32,
    pub total_not_attempted: u32,
    pub total_correct: u32,
    pub total_wrong: u32,
    pub subject_scores: Vec<SubjectBreakdown>,
}

/// Tally every subject and sum the results.
pub fn totals(key: &ParsedAnswerKey) -> Totals {
    let subject_scores: Vec<SubjectBreakdown> = key.subjects.iter().map(tally_subject).collect();
    Totals {
        overall_score: subject_scores.iter().map(|s| s.total_marks).sum(),
        max_score: subject_scores.iter().map(|s| s.max_marks).sum(),
        total_attempted: subject_scores.iter().map(|s| s.attempted).sum(),
        total_not_attempted: subject_scores.iter().map(|s| s.not_attempted).sum(),
        total_correct: subject_scores.iter().map(|s| s.correct).sum(),
        total_wrong: subject_scores.iter().map(|s| s.wrong).sum(),
        subject_scores,
    }
}

/// Prices a parsed answer key against the stored population.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreCalculator;

impl ScoreCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Score `key` and rank it against the results already in `store`.
    ///
    /// Ranks and averages only see stored results, so the submission being
    /// scored is never compared with itself. The percentile denominator is
    /// the candidate count, which includes a candidate created for this
    /// submission before scoring.
    pub async fn calculate(
        &self,
        key: &ParsedAnswerKey,
        category: &str,
        shift: &Shift,
        store: &dyn PopulationStore,
    ) -> Result<CalculatedResults, StoreError> {
        let totals = totals(key);
        let score = totals.overall_score;

        let category_average = store.get_category_average_score(category).await?;
        let shift_average = store.get_shift_average_score(shift).await?;

        let all = store.get_all_exam_results().await?;
        let in_category = store.get_exam_results_by_category(category).await?;
        let in_shift = store.get_exam_results_by_shift(shift).await?;

        let overall_rank = strict_rank(&overall_scores(&all), score);
        let category_rank = strict_rank(&overall_scores(&in_category), score);
        let shift_rank = strict_rank(&overall_scores(&in_shift), score);

        let total_candidates = store.get_total_candidates_count().await?;
        let percentile = percentile(total_candidates, overall_rank);

        tracing::debug!(
            "scored {score}/{} in category {category:?}, shift {shift}: rank {overall_rank}/{total_candidates}",
            totals.max_score
        );

        Ok(CalculatedResults {
            overall_score: score,
            max_score: totals.max_score,
            total_attempted: totals.total_attempted,
            total_not_attempted: totals.total_not_attempted,
            total_correct: totals.total_correct,
            total_wrong: totals.total_wrong,
            percentile,
            overall_rank,
            shift_rank,
            category_rank,
            shift_average,
            category_average,
            subject_scores: totals.subject_scores,
        })
    }
}
