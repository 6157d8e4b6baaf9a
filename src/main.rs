// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use slalom_analyzer::detector::{ConfidenceGate, Detector, RecordedDetector};
use slalom_analyzer::pipeline::{PipelineEvent, SlalomPipeline, Stats};
use slalom_analyzer::report::{CrossingLog, RunReport};
use slalom_analyzer::stream::{find_detection_streams, DetectionStream};
use slalom_analyzer::types::Config;

#[derive(Parser, Debug)]
#[command(name = "slalom-analyzer", version, about = "Judge slalom cone crossings from recorded detections")]
struct Args {
    /// Detection stream (.jsonl) or a directory of streams
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// YAML config; defaults are used when the file is missing
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Where crossing logs and reports are written
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Drop detections below this confidence
    #[arg(long)]
    min_confidence: Option<f32>,

    /// Skip the crossing log and JSON report
    #[arg(long)]
    no_report: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        Config::default()
    };
    if let Some(dir) = &args.output_dir {
        config.input.output_dir = dir.display().to_string();
    }
    if let Some(min_confidence) = args.min_confidence {
        config.input.min_confidence = min_confidence;
    }
    if args.no_report {
        config.input.write_report = false;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("⛸  Slalom Analyzer Starting");
    if args.config.exists() {
        info!("✓ Configuration loaded from {}", args.config.display());
    } else {
        info!("Config {} not found, using defaults", args.config.display());
    }

    config
        .analyzer
        .validate()
        .context("invalid analyzer configuration")?;
    config
        .grouping
        .validate()
        .context("invalid wheel grouping configuration")?;
    info!(
        "Thresholds: match={:.0}px, miss tolerance={} frames, cooldown={} frames, lift={:.0}px, release={:.0}px, min confidence={:.2}",
        config.analyzer.tracker.max_match_distance_px,
        config.analyzer.tracker.max_missed_frames,
        config.analyzer.crossing.cooldown_frames,
        config.analyzer.ground.lift_threshold_px,
        config.analyzer.ground.release_threshold_px,
        config.input.min_confidence
    );

    let input = args
        .input
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.input.input_dir));
    let streams = find_detection_streams(&input)?;
    if streams.is_empty() {
        error!("No detection streams found in {}", input.display());
        return Ok(());
    }

    let mut totals = Stats::default();
    for (idx, path) in streams.iter().enumerate() {
        info!("========================================");
        info!("Processing stream {}/{}: {}", idx + 1, streams.len(), path.display());
        info!("========================================");

        match process_stream(path, &config) {
            Ok(stats) => {
                totals.total_crossings += stats.total_crossings;
                totals.legal_crossings += stats.legal_crossings;
                totals.indeterminate_crossings += stats.indeterminate_crossings;
            }
            Err(e) => error!("Failed to process {}: {:#}", path.display(), e),
        }
    }

    if streams.len() > 1 {
        info!("📊 All streams:");
        log_stats(&totals);
    }
    Ok(())
}

fn process_stream(path: &Path, config: &Config) -> Result<Stats> {
    let mut pipeline = SlalomPipeline::new(&config.analyzer)?;
    let mut detector = ConfidenceGate::new(
        RecordedDetector::new(config.grouping.clone()),
        config.input.min_confidence,
    );
    let stream = DetectionStream::open(path, config.input.queue_capacity)?;

    let output_dir = Path::new(&config.input.output_dir);
    let mut crossing_log = if config.input.write_report {
        Some(CrossingLog::create(output_dir, path)?)
    } else {
        None
    };

    let mut rejected_frames: u64 = 0;
    while let Some(frame) = stream.next_frame() {
        let detections = detector.detect(&frame.frame)?;
        let output = match pipeline.process_frame(frame.frame_index, &detections) {
            Ok(output) => output,
            Err(e) => {
                rejected_frames += 1;
                warn!("{}: {}", path.display(), e);
                continue;
            }
        };

        if let Some(log) = crossing_log.as_mut() {
            for verdict in &output.verdicts {
                log.append(verdict)?;
            }
        }

        for event in pipeline.drain_events() {
            match event {
                PipelineEvent::TrackStarted {
                    frame_index,
                    track_id,
                    label,
                } => debug!("frame {}: {} track {} started", frame_index, label.as_str(), track_id),
                PipelineEvent::TrackLost {
                    frame_index,
                    track_id,
                } => debug!("frame {}: track {} lost", frame_index, track_id),
                PipelineEvent::TravelAxisChanged { frame_index, axis } => {
                    info!("↔️  frame {}: travel axis now {}", frame_index, axis.as_str())
                }
                PipelineEvent::CrossingDetected(_) | PipelineEvent::VerdictIssued(_) => {}
            }
        }
    }

    let stream_summary = stream.finish()?;
    let stats = pipeline.stats();
    let metrics = pipeline.metrics().summary();

    info!("📊 Final Report:");
    log_stats(&stats);
    info!("  Frames processed: {}", metrics.total_frames);
    if stream_summary.malformed > 0 || rejected_frames > 0 {
        warn!(
            "  Skipped input: {} malformed line(s), {} out-of-order frame(s)",
            stream_summary.malformed, rejected_frames
        );
    }
    if metrics.discarded_detections > 0 {
        info!("  Degenerate detections discarded: {}", metrics.discarded_detections);
    }
    info!(
        "  Low-confidence detections dropped: {}, unknown classes ignored: {}, ungrouped wheels: {}",
        detector.rejected_count(),
        detector.inner().ignored_count(),
        detector.inner().stray_wheel_count()
    );
    info!("  Processing Speed: {:.1} FPS", metrics.fps);

    if let Some(log) = crossing_log {
        let log_path = log.finish()?;
        let report = RunReport::new(path, stats, metrics, stream_summary, &config.analyzer);
        let report_path = report.write(output_dir)?;
        info!("💾 Crossings: {}", log_path.display());
        info!("💾 Report: {}", report_path.display());
    }

    Ok(stats)
}

fn log_stats(stats: &Stats) {
    info!("  Total crossings: {}", stats.total_crossings);
    info!("  ✅ Legal: {}", stats.legal_crossings);
    if stats.illegal_crossings() > 0 {
        warn!("  🚫 Illegal: {}", stats.illegal_crossings());
    } else {
        info!("  🚫 Illegal: 0");
    }
    if stats.indeterminate_crossings > 0 {
        warn!(
            "  ❔ Indeterminate (counted illegal): {}",
            stats.indeterminate_crossings
        );
    }
    info!("  Accuracy: {:.1}%", stats.accuracy_percent());
}
