//! Submission engine.
//!
//! Wires the extractor, the score calculator, and a population store into
//! the submit / lookup / statistics operations. Every read-compute-write
//! sequence against the store runs under a single async lock and inside a
//! store unit ([`PopulationStore::begin`] to commit or rollback), so two
//! concurrent submissions always see each other in a consistent order, even
//! from different processes sharing a file store.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{InputError, LookupError, StoreError, SubmitError};
use crate::extract::{demo_answer_key, is_demo_source, AnswerKeyExtractor};
use crate::model::{
    CalculatedResults, Candidate, ExamResult, KeyOrigin, NewCandidate, ParsedAnswerKey,
    SubjectScore,
};
use crate::scoring::ScoreCalculator;
use crate::statistics::mean;
use crate::store::{overall_scores, PopulationStore};
use crate::traits::PageFetcher;

/// Where a submission's answer key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerSource {
    /// An answer-key URL, or a demo sentinel such as `demo`.
    Url(String),
    /// Page content supplied directly.
    Content(String),
    /// An uploaded document. Not supported.
    Document(PathBuf),
}

/// A candidate's submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionForm {
    pub source: Option<AnswerSource>,
    pub category: String,
    pub sub_category: Option<String>,
    pub gender: String,
    pub state: String,
    pub language: String,
}

impl SubmissionForm {
    /// Check required fields and the URL shape.
    pub fn validate(&self) -> Result<(), InputError> {
        for (field, value) in [
            ("category", &self.category),
            ("gender", &self.gender),
            ("state", &self.state),
            ("language", &self.language),
        ] {
            if value.trim().is_empty() {
                return Err(InputError::MissingField(field));
            }
        }
        if let Some(AnswerSource::Url(url)) = &self.source {
            let url = url.trim();
            if !url.is_empty() && !is_demo_source(url) && !is_http_url(url) {
                return Err(InputError::InvalidUrl);
            }
        }
        Ok(())
    }

    fn answer_key_url(&self) -> Option<String> {
        match &self.source {
            Some(AnswerSource::Url(url)) => Some(url.trim().to_string()),
            _ => None,
        }
    }
}

fn is_http_url(s: &str) -> bool {
    url::Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Everything recorded for one successful submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub candidate: Candidate,
    pub result: ExamResult,
    pub subject_scores: Vec<SubjectScore>,
    pub calculated_results: CalculatedResults,
    /// Which extraction path produced the scored key.
    pub origin: KeyOrigin,
    /// Why demo data was substituted for the requested URL, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

/// A stored candidate with their result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub candidate: Candidate,
    pub result: ExamResult,
    pub subject_scores: Vec<SubjectScore>,
}

/// Population-wide figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_candidates: usize,
    pub average_score: f64,
    pub total_submissions: usize,
}

/// The submission pipeline over one population store.
pub struct ScoreEngine {
    extractor: AnswerKeyExtractor,
    calculator: ScoreCalculator,
    store: Arc<dyn PopulationStore>,
    write_lock: Mutex<()>,
}

impl ScoreEngine {
    pub fn new(fetcher: Arc<dyn PageFetcher>, store: Arc<dyn PopulationStore>) -> Self {
        Self {
            extractor: AnswerKeyExtractor::new(fetcher),
            calculator: ScoreCalculator::new(),
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn PopulationStore> {
        &self.store
    }

    /// Extract, score, and record a submission.
    pub async fn submit(&self, form: SubmissionForm) -> Result<Submission, SubmitError> {
        form.validate()?;
        let (key, fallback_reason) = self.resolve(&form).await?;
        tracing::info!(
            "scoring {} questions for roll number {} ({})",
            key.question_count(),
            key.roll_number,
            key.origin
        );

        let _guard = self.write_lock.lock().await;
        match self.record(&form, &key, fallback_reason).await {
            Ok(submission) => Ok(submission),
            Err(e) => {
                tracing::warn!("submission failed, rolling back: {e}");
                if let Err(rollback_err) = self.store.rollback().await {
                    tracing::error!("rollback failed: {rollback_err}");
                }
                Err(e.into())
            }
        }
    }

    /// Turn the form's source into an answer key. Fetch failures fall back
    /// to demo data; the reason is returned alongside.
    async fn resolve(
        &self,
        form: &SubmissionForm,
    ) -> Result<(ParsedAnswerKey, Option<String>), InputError> {
        match &form.source {
            None => Err(InputError::MissingSource),
            Some(AnswerSource::Document(path)) => {
                tracing::debug!("rejecting document upload {}", path.display());
                Err(InputError::DocumentUnsupported)
            }
            Some(AnswerSource::Content(content)) => {
                Ok((self.extractor.parse_from_html(content), None))
            }
            Some(AnswerSource::Url(url)) => {
                let url = url.trim();
                if url.is_empty() {
                    return Err(InputError::EmptyUrl);
                }
                match self.extractor.parse_from_url(url).await {
                    Ok(key) => Ok((key, None)),
                    Err(e) => {
                        tracing::warn!("failed to parse {url}, falling back to demo data: {e}");
                        Ok((demo_answer_key(), Some(e.to_string())))
                    }
                }
            }
        }
    }

    /// Begin, candidate, then scoring, then result and subject scores, then
    /// commit. Must be called with the write lock held.
    async fn record(
        &self,
        form: &SubmissionForm,
        key: &ParsedAnswerKey,
        fallback_reason: Option<String>,
    ) -> Result<Submission, StoreError> {
        self.store.begin().await?;
        let candidate = self
            .store
            .create_candidate(NewCandidate {
                candidate_name: key.candidate_name.clone(),
                roll_number: key.roll_number.clone(),
                exam_name: key.exam_name.clone(),
                exam_date: key.exam_date.clone(),
                exam_time: key.exam_time.clone(),
                venue_name: key.venue_name.clone(),
                category: form.category.clone(),
                sub_category: form.sub_category.clone(),
                gender: form.gender.clone(),
                state: form.state.clone(),
                language: form.language.clone(),
                answer_key_url: form.answer_key_url(),
            })
            .await?;

        let calculated = self
            .calculator
            .calculate(key, &form.category, &key.shift(), self.store.as_ref())
            .await?;

        let result = self
            .store
            .create_exam_result(calculated.to_new_result(candidate.id))
            .await?;
        let subject_scores = self
            .store
            .create_subject_scores(calculated.to_new_subject_scores(result.id))
            .await?;
        self.store.commit().await?;

        tracing::info!(
            "recorded roll number {}: {}/{}, rank {}, percentile {:.2}",
            candidate.roll_number,
            result.overall_score,
            result.max_score,
            result.overall_rank,
            result.percentile
        );

        Ok(Submission {
            candidate,
            result,
            subject_scores,
            calculated_results: calculated,
            origin: key.origin,
            fallback_reason,
        })
    }

    /// Find a candidate's stored result by roll number.
    pub async fn lookup(&self, roll_number: &str) -> Result<CandidateRecord, LookupError> {
        let _guard = self.write_lock.lock().await;
        let candidate = self
            .store
            .get_candidate_by_roll_number(roll_number)
            .await?
            .ok_or(LookupError::CandidateNotFound)?;
        let result = self
            .store
            .get_exam_result(candidate.id)
            .await?
            .ok_or(LookupError::ResultNotFound)?;
        let subject_scores = self.store.get_subject_scores_by_result_id(result.id).await?;
        Ok(CandidateRecord {
            candidate,
            result,
            subject_scores,
        })
    }

    /// Candidate and submission counts with the overall mean score.
    pub async fn statistics(&self) -> Result<Statistics, StoreError> {
        let _guard = self.write_lock.lock().await;
        let total_candidates = self.store.get_total_candidates_count().await?;
        let results = self.store.get_all_exam_results().await?;
        Ok(Statistics {
            total_candidates,
            average_score: mean(&overall_scores(&results)),
            total_submissions: results.len(),
        })
    }
}
