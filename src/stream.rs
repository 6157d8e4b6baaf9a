// src/stream.rs
//
// Recorded detection streams: discovery on disk and a reader thread that
// decodes `.jsonl` lines ahead of the analyzer. Frames travel through one
// bounded channel, so the analyzer still sees them in file order and a slow
// consumer throttles the reader.

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{bounded, Receiver};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::detector::RecordedFrame;

const STREAM_EXTENSIONS: [&str; 2] = ["jsonl", "JSONL"];

/// A single file is returned as-is; a directory is searched recursively for
/// `.jsonl` streams, sorted by path.
pub fn find_detection_streams(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        anyhow::bail!("input path {} does not exist", input.display());
    }

    let mut streams = Vec::new();
    for entry in WalkDir::new(input)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(ext) = path.extension() {
            if STREAM_EXTENSIONS.contains(&ext.to_str().unwrap_or("")) {
                streams.push(path.to_path_buf());
            }
        }
    }
    streams.sort();

    info!("Found {} detection stream(s) in {}", streams.len(), input.display());
    Ok(streams)
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamFrame {
    pub frame_index: u64,
    pub frame: RecordedFrame,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StreamSummary {
    pub lines: u64,
    pub frames: u64,
    pub malformed: u64,
}

pub struct DetectionStream {
    path: PathBuf,
    rx: Receiver<StreamFrame>,
    handle: JoinHandle<Result<StreamSummary>>,
}

impl DetectionStream {
    pub fn open(path: &Path, queue_capacity: usize) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open detection stream {}", path.display()))?;
        info!("Opening detection stream: {}", path.display());

        let (tx, rx) = bounded(queue_capacity.max(1));
        let name = path.display().to_string();
        let handle = thread::Builder::new()
            .name("stream-reader".to_string())
            .spawn(move || -> Result<StreamSummary> {
                let mut summary = StreamSummary::default();
                let mut next_index: u64 = 0;

                for (line_no, line) in BufReader::new(file).lines().enumerate() {
                    let line = line.with_context(|| format!("read error in {} at line {}", name, line_no + 1))?;
                    summary.lines += 1;
                    if line.trim().is_empty() {
                        continue;
                    }

                    let frame: RecordedFrame = match serde_json::from_str(&line) {
                        Ok(f) => f,
                        Err(e) => {
                            summary.malformed += 1;
                            warn!("{}:{}: skipping malformed line: {}", name, line_no + 1, e);
                            continue;
                        }
                    };

                    let frame_index = frame.frame.unwrap_or(next_index);
                    next_index = frame_index.saturating_add(1);
                    summary.frames += 1;

                    if tx.send(StreamFrame { frame_index, frame }).is_err() {
                        debug!("{}: consumer stopped, reader exiting", name);
                        break;
                    }
                }
                Ok(summary)
            })
            .context("failed to spawn stream reader thread")?;

        Ok(Self {
            path: path.to_path_buf(),
            rx,
            handle,
        })
    }

    /// Blocks until the next frame arrives; `None` once the reader is done.
    pub fn next_frame(&self) -> Option<StreamFrame> {
        self.rx.recv().ok()
    }

    /// Stop reading (if still running) and collect the reader's summary.
    pub fn finish(self) -> Result<StreamSummary> {
        let Self { rx, handle, path } = self;
        drop(rx);
        handle
            .join()
            .map_err(|_| anyhow!("stream reader for {} panicked", path.display()))?
    }
}

impl Iterator for DetectionStream {
    type Item = StreamFrame;

    fn next(&mut self) -> Option<StreamFrame> {
        self.next_frame()
    }
}
