//! JSON snapshot-backed population store.
//!
//! Writes are staged in memory and only reach disk on [`commit`]. Several
//! processes may share one snapshot: [`begin`] takes an exclusive lock on a
//! sidecar `<file>.lock` and reloads the snapshot, and [`commit`] merges the
//! staged writes into whatever is on disk under that lock before replacing
//! the file atomically (temp file + rename). A reader never sees a
//! half-written file, a concurrent writer's records are never overwritten,
//! and a failed submission leaves nothing behind after [`rollback`].
//!
//! [`begin`]: PopulationStore::begin
//! [`commit`]: PopulationStore::commit
//! [`rollback`]: PopulationStore::rollback

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use fs4::fs_std::FileExt;
use uuid::Uuid;

use super::{MemoryStore, Population, PopulationStore};
use crate::error::StoreError;
use crate::model::{
    Candidate, ExamResult, NewCandidate, NewExamResult, NewSubjectScore, Shift, SubjectScore,
};

/// A population persisted as a single JSON snapshot file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock_path: PathBuf,
    /// Committed snapshot plus pending writes, as queries see it.
    staged: MemoryStore,
    /// Writes made since the last commit or rollback.
    pending: Mutex<Population>,
    /// The locked sidecar handle while a unit is open. Closing it unlocks.
    held: Mutex<Option<File>>,
}

impl JsonFileStore {
    /// Open the snapshot at `path`, starting empty if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let population = load_snapshot(&path)?;
        tracing::debug!(
            "opened population store at {} ({} candidates)",
            path.display(),
            population.candidates.len()
        );
        Ok(Self {
            lock_path: lock_path_for(&path),
            path,
            staged: MemoryStore::with_population(population),
            pending: Mutex::default(),
            held: Mutex::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn pending(&self) -> MutexGuard<'_, Population> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn held(&self) -> MutexGuard<'_, Option<File>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("population"));
    name.push(".lock");
    path.with_file_name(name)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Block until this process holds the exclusive lock on `lock_path`.
fn acquire_lock(lock_path: &Path) -> Result<File, StoreError> {
    std::fs::create_dir_all(parent_dir(lock_path))?;
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path)?;
    file.lock_exclusive()?;
    tracing::debug!("locked {}", lock_path.display());
    Ok(file)
}

fn load_snapshot(path: &Path) -> Result<Population, StoreError> {
    if !path.exists() {
        return Ok(Population::default());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Population::default());
    }
    Ok(serde_json::from_str(&content)?)
}

fn write_snapshot(path: &Path, population: &Population) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(population)?;
    let dir = parent_dir(path);
    std::fs::create_dir_all(&dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// Run file I/O on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
}

#[async_trait]
impl PopulationStore for JsonFileStore {
    async fn create_candidate(&self, candidate: NewCandidate) -> Result<Candidate, StoreError> {
        let candidate = self.staged.create_candidate(candidate).await?;
        self.pending().candidates.push(candidate.clone());
        Ok(candidate)
    }

    async fn get_candidate_by_roll_number(
        &self,
        roll_number: &str,
    ) -> Result<Option<Candidate>, StoreError> {
        self.staged.get_candidate_by_roll_number(roll_number).await
    }

    async fn create_exam_result(&self, result: NewExamResult) -> Result<ExamResult, StoreError> {
        let result = self.staged.create_exam_result(result).await?;
        self.pending().exam_results.push(result.clone());
        Ok(result)
    }

    async fn get_exam_result(&self, candidate_id: Uuid) -> Result<Option<ExamResult>, StoreError> {
        self.staged.get_exam_result(candidate_id).await
    }

    async fn get_all_exam_results(&self) -> Result<Vec<ExamResult>, StoreError> {
        self.staged.get_all_exam_results().await
    }

    async fn get_exam_results_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<ExamResult>, StoreError> {
        self.staged.get_exam_results_by_category(category).await
    }

    async fn get_exam_results_by_shift(
        &self,
        shift: &Shift,
    ) -> Result<Vec<ExamResult>, StoreError> {
        self.staged.get_exam_results_by_shift(shift).await
    }

    async fn create_subject_scores(
        &self,
        scores: Vec<NewSubjectScore>,
    ) -> Result<Vec<SubjectScore>, StoreError> {
        let scores = self.staged.create_subject_scores(scores).await?;
        self.pending().subject_scores.extend(scores.iter().cloned());
        Ok(scores)
    }

    async fn get_subject_scores_by_result_id(
        &self,
        result_id: Uuid,
    ) -> Result<Vec<SubjectScore>, StoreError> {
        self.staged.get_subject_scores_by_result_id(result_id).await
    }

    async fn get_total_candidates_count(&self) -> Result<usize, StoreError> {
        self.staged.get_total_candidates_count().await
    }

    async fn begin(&self) -> Result<(), StoreError> {
        let already_held = self.held().is_some();
        let (path, lock_path) = (self.path.clone(), self.lock_path.clone());
        let (lock, mut population) = blocking(move || {
            let lock = if already_held {
                None
            } else {
                Some(acquire_lock(&lock_path)?)
            };
            Ok((lock, load_snapshot(&path)?))
        })
        .await?;
        if let Some(lock) = lock {
            *self.held() = Some(lock);
        }
        population.append(self.pending().clone());
        self.staged.replace(population);
        Ok(())
    }

    async fn commit(&self) -> Result<(), StoreError> {
        let held = self.held().take();
        let pending = self.pending().clone();
        let (path, lock_path) = (self.path.clone(), self.lock_path.clone());
        let population = blocking(move || {
            let _lock = match held {
                Some(lock) => lock,
                None => acquire_lock(&lock_path)?,
            };
            let mut population = load_snapshot(&path)?;
            population.append(pending);
            write_snapshot(&path, &population)?;
            Ok(population)
        })
        .await?;
        *self.pending() = Population::default();
        tracing::debug!(
            "committed population snapshot to {} ({} candidates)",
            self.path.display(),
            population.candidates.len()
        );
        self.staged.replace(population);
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        let held = self.held().take();
        *self.pending() = Population::default();
        let path = self.path.clone();
        let committed = blocking(move || {
            let committed = load_snapshot(&path);
            drop(held);
            committed
        })
        .await?;
        self.staged.replace(committed);
        tracing::warn!("rolled back uncommitted population writes");
        Ok(())
    }
}
