pub mod init;
pub mod parse;
pub mod result;
pub mod stats;
pub mod submit;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use serde::Serialize;

use keyscore_core::engine::ScoreEngine;
use keyscore_core::model::{Candidate, ExamResult, SubjectScore};
use keyscore_core::response::Envelope;
use keyscore_core::store::JsonFileStore;
use keyscore_fetch::{create_fetcher, load_config_from, KeyscoreConfig};

/// Options shared by every subcommand.
pub struct Context {
    pub config: Option<PathBuf>,
    pub store: Option<PathBuf>,
}

impl Context {
    pub fn load_config(&self) -> Result<KeyscoreConfig> {
        let mut config = load_config_from(self.config.as_deref())?;
        if let Some(store) = &self.store {
            config.store_path = store.clone();
        }
        Ok(config)
    }

    /// An engine over the configured file store and an HTTP fetcher.
    pub fn engine(&self, config: &KeyscoreConfig) -> Result<ScoreEngine> {
        tracing::debug!("using population store {}", config.store_path.display());
        let store = JsonFileStore::open(&config.store_path).with_context(|| {
            format!("failed to open population store: {}", config.store_path.display())
        })?;
        let fetcher = create_fetcher(config)?;
        Ok(ScoreEngine::new(Arc::new(fetcher), Arc::new(store)))
    }
}

/// Write `envelope` as pretty JSON to `output`, or stdout.
pub fn emit_json<T: Serialize>(envelope: &Envelope<T>, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(envelope)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub fn subject_table(subjects: &[SubjectScore]) -> comfy_table::Table {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Subject",
        "Attempted",
        "Correct",
        "Wrong",
        "Not attempted",
        "Marks",
    ]);
    for s in subjects {
        table.add_row(vec![
            Cell::new(&s.subject_name),
            Cell::new(s.attempted),
            Cell::new(s.correct),
            Cell::new(s.wrong),
            Cell::new(s.not_attempted),
            Cell::new(format!("{} / {}", s.total_marks, s.max_marks)),
        ]);
    }
    table
}

/// Candidate header, standing and subject breakdown as text.
pub fn print_record(candidate: &Candidate, result: &ExamResult, subjects: &[SubjectScore]) {
    use comfy_table::{Cell, Table};

    println!(
        "{} ({}), {}",
        candidate.candidate_name, candidate.roll_number, candidate.exam_name
    );
    println!(
        "{} {} at {}",
        candidate.exam_date, candidate.exam_time, candidate.venue_name
    );

    let mut table = Table::new();
    table.set_header(vec!["Score", "Percentile", "Rank", "Category rank", "Shift rank"]);
    table.add_row(vec![
        Cell::new(format!("{} / {}", result.overall_score, result.max_score)),
        Cell::new(format!("{:.2}", result.percentile)),
        Cell::new(result.overall_rank),
        Cell::new(format!("{} ({})", result.category_rank, candidate.category)),
        Cell::new(result.shift_rank),
    ]);
    println!("\n{table}");
    println!(
        "Category average {:.2}, shift average {:.2}",
        result.category_average, result.shift_average
    );
    println!("\n{}", subject_table(subjects));
}
