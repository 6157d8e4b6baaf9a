// src/report.rs
//
// Run outputs: one JSON line per judged crossing while the stream is being
// processed, and a summary report once it ends.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::analysis::technique_analyzer::Verdict;
use crate::pipeline::metrics::MetricsSummary;
use crate::pipeline::stats::Stats;
use crate::stream::StreamSummary;
use crate::types::AnalyzerConfig;

fn stream_stem(source: &Path) -> String {
    source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("stream")
        .to_string()
}

// ============================================================================
// PER-CROSSING LOG
// ============================================================================

#[derive(Serialize)]
struct CrossingRecord<'a> {
    frame: u64,
    status: &'static str,
    indeterminate: bool,
    #[serde(flatten)]
    verdict: &'a Verdict,
}

pub struct CrossingLog {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
}

impl CrossingLog {
    pub fn create(output_dir: &Path, source: &Path) -> Result<Self> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("failed to create output dir {}", output_dir.display()))?;
        let path = output_dir.join(format!("{}_crossings.jsonl", stream_stem(source)));
        let file = File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
        info!("💾 Crossings will be written to: {}", path.display());
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn append(&mut self, verdict: &Verdict) -> Result<()> {
        let record = CrossingRecord {
            frame: verdict.event.frame_index,
            status: verdict.status().as_str(),
            indeterminate: verdict.is_indeterminate(),
            verdict,
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer
            .flush()
            .with_context(|| format!("failed to flush {}", self.path.display()))?;
        Ok(self.path)
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

// ============================================================================
// RUN REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub total_crossings: u64,
    pub legal_crossings: u64,
    pub illegal_crossings: u64,
    pub indeterminate_crossings: u64,
    pub accuracy_percent: f64,
    pub stream_lines: u64,
    pub malformed_lines: u64,
    pub metrics: MetricsSummary,
    pub config: AnalyzerConfig,
}

impl RunReport {
    pub fn new(
        source: &Path,
        stats: Stats,
        metrics: MetricsSummary,
        stream: StreamSummary,
        config: &AnalyzerConfig,
    ) -> Self {
        Self {
            source: source.display().to_string(),
            generated_at: Utc::now(),
            total_crossings: stats.total_crossings,
            legal_crossings: stats.legal_crossings,
            illegal_crossings: stats.illegal_crossings(),
            indeterminate_crossings: stats.indeterminate_crossings,
            accuracy_percent: stats.accuracy_percent(),
            stream_lines: stream.lines,
            malformed_lines: stream.malformed,
            metrics,
            config: config.clone(),
        }
    }

    /// Writes `<output_dir>/<stream stem>_report.json`.
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("failed to create output dir {}", output_dir.display()))?;
        let path = output_dir.join(format!("{}_report.json", stream_stem(Path::new(&self.source))));
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}
