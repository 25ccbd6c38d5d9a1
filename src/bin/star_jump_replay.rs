use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use starjump_tracker::classifier::{ExercisePhase, StarJumpClassifier};
use starjump_tracker::config::Config;
use starjump_tracker::pose::Person;
use starjump_tracker::session::TrackingSession;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Default, PartialEq, Eq)]
struct ReplaySummary {
    frames: usize,
    skipped: usize,
}

/// 1行分をデコード。空行は None
fn decode_line(bytes: &[u8]) -> Result<Option<Vec<Person>>> {
    let line = std::str::from_utf8(bytes).context("not valid UTF-8")?;
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let persons = serde_json::from_str(line).context("invalid frame JSON")?;
    Ok(Some(persons))
}

/// 読めない行は警告して飛ばし、残りを最後まで処理する
fn replay<R: BufRead>(mut reader: R, session: &TrackingSession) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    let mut last_phase: Option<ExercisePhase> = None;
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;

        let persons = match decode_line(&buf) {
            Ok(Some(p)) => p,
            Ok(None) => continue,
            Err(e) => {
                warn!("line {line_no}: skipped: {e:#}");
                summary.skipped += 1;
                continue;
            }
        };
        summary.frames += 1;

        let Some(outcome) = session.process_frame(&persons) else {
            continue;
        };
        let phase = outcome.classification.phase;
        if last_phase != Some(phase) {
            info!(
                frame = summary.frames,
                ?phase,
                confidence = outcome.classification.confidence,
                valid = outcome.counts.valid_count,
                error = outcome.counts.error_count,
                "phase changed"
            );
            last_phase = Some(phase);
        }
    }

    Ok(summary)
}

/// 記録済みキーポイント（1行 = 1フレームの検出人物 JSON 配列）を再生してカウントする
fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        bail!("usage: {} <frames.jsonl> [config.toml]", args[0]);
    }
    let frames_path = &args[1];
    let config_path = args.get(2).map_or(DEFAULT_CONFIG_PATH, String::as_str);
    let loaded = Config::load(config_path);
    let config = loaded.as_ref().cloned().unwrap_or_default();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Star Jump Replay ({})", env!("GIT_VERSION"));
    if let Err(e) = &loaded {
        warn!("config not loaded, using defaults: {e:#}");
    }

    let file = File::open(frames_path).with_context(|| format!("failed to open {frames_path}"))?;
    let session = TrackingSession::from_config(
        &config.session,
        Box::new(StarJumpClassifier::from_config(&config.classifier)),
    );

    let summary = replay(BufReader::new(file), &session)?;

    session.stop();
    let counts = session.counts().snapshot();
    println!("frames:  {} ({} skipped)", summary.frames, summary.skipped);
    println!("valid:   {}", counts.valid_count);
    println!("error:   {}", counts.error_count);
    Ok(())
}
