//! Log entries for `GET /api/logs`.
//!
//! Entries come from the tail of the configured log file when it exists and
//! from a fixed demo sequence otherwise.

use std::io::SeekFrom;
use std::path::Path;
use std::sync::OnceLock;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::models::{LogEntry, LogLevel};
use crate::error::Result;
use crate::hardware::HardwareStatus;

/// Entries returned when `lines` is absent or unparsable.
pub const DEFAULT_LINES: usize = 50;

/// Upper bound on `lines`.
pub const MAX_LINES: usize = 1000;

/// Bytes read from the end of a log file per request.
pub const TAIL_WINDOW: u64 = 512 * 1024;

/// Interpret the `lines` query parameter.
///
/// Falls back to [`DEFAULT_LINES`] on anything that is not a non-negative
/// integer and clamps to [`MAX_LINES`].
#[must_use]
pub fn parse_lines(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_LINES)
        .min(MAX_LINES)
}

/// The startup sequence shown when no log file is available.
///
/// Timestamps are spaced back from `now`; the result keeps the last `lines`.
#[must_use]
pub fn demo_entries(
    now: DateTime<Utc>,
    callsign: &str,
    hardware: HardwareStatus,
    lines: usize,
) -> Vec<LogEntry> {
    let yes_no = |present: bool| if present { "Yes" } else { "No" };
    let messages = [
        (300, "Leeds APRS Pi system starting up".to_string()),
        (240, "Direwolf APRS software initialized".to_string()),
        (180, "Connected to APRS-IS server".to_string()),
        (120, format!("First beacon sent from {callsign}")),
        (60, "System monitoring active".to_string()),
        (
            30,
            format!(
                "Hardware check: RTL-SDR={}, GPS={}, Audio={}",
                yes_no(hardware.rtl_sdr),
                yes_no(hardware.gps_device),
                if hardware.audio_device { "Yes" } else { "Demo" },
            ),
        ),
    ];

    let entries: Vec<LogEntry> = messages
        .into_iter()
        .map(|(ago, message)| LogEntry {
            timestamp: (now - Duration::seconds(ago)).timestamp_millis(),
            level: LogLevel::Info,
            message,
        })
        .collect();

    last_n(entries, lines)
}

/// Read the last `lines` non-blank lines of `path` as entries.
///
/// Only the final [`TAIL_WINDOW`] bytes are read. Invalid UTF-8 is replaced
/// rather than rejected. Lines without a leading timestamp are stamped with
/// the file's modification time.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub async fn tail_file(path: &Path, lines: usize) -> Result<Vec<LogEntry>> {
    let content = read_tail(path, TAIL_WINDOW).await?;
    let modified = tokio::fs::metadata(path)
        .await?
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    let tail: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = tail.len().saturating_sub(lines);
    Ok(tail[start..]
        .iter()
        .map(|line| parse_line(line, modified))
        .collect())
}

/// The last `window` bytes of `path`, starting at a line boundary.
async fn read_tail(path: &Path, window: u64) -> Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let len = file.metadata().await?.len();
    let offset = len.saturating_sub(window);
    // One byte early, so a window starting on a line keeps that line
    file.seek(SeekFrom::Start(offset.saturating_sub(1))).await?;

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).await?;

    let start = if offset > 0 {
        bytes.iter().position(|&b| b == b'\n').map_or(bytes.len(), |i| i + 1)
    } else {
        0
    };
    Ok(String::from_utf8_lossy(&bytes[start..]).into_owned())
}

/// Turn one log line into an entry.
#[must_use]
pub fn parse_line(line: &str, fallback: DateTime<Utc>) -> LogEntry {
    let (timestamp, rest) = match leading_timestamp(line) {
        Some((ts, len)) => (ts, &line[len..]),
        None => (fallback, line),
    };

    let message = rest
        .trim_start_matches(|c: char| c.is_whitespace() || c == '-' || c == '|')
        .trim_end()
        .to_string();

    LogEntry {
        timestamp: timestamp.timestamp_millis(),
        level: detect_level(line),
        message,
    }
}

fn timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^\[?(\d{4}-\d{2}-\d{2})[T ](\d{2}:\d{2}:\d{2})(?:[.,](\d{1,9}))?(Z|[+-]\d{2}:\d{2})?\]?",
        )
        .expect("timestamp pattern is valid")
    })
}

fn level_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b(CRITICAL|FATAL|ERROR|WARNING|WARN|DEBUG|TRACE)\b")
            .expect("level pattern is valid")
    })
}

/// Parse a leading timestamp, returning it and the byte length consumed.
fn leading_timestamp(line: &str) -> Option<(DateTime<Utc>, usize)> {
    let caps = timestamp_pattern().captures(line)?;
    let whole = caps.get(0)?;
    let date = caps.get(1)?.as_str();
    let time = caps.get(2)?.as_str();
    let fraction = caps.get(3).map_or("0", |m| m.as_str());

    let naive =
        NaiveDateTime::parse_from_str(&format!("{date} {time}.{fraction}"), "%Y-%m-%d %H:%M:%S%.f")
            .ok()?;

    let timestamp = match caps.get(4).map(|m| m.as_str()) {
        None | Some("Z") => Utc.from_utc_datetime(&naive),
        Some(offset) => DateTime::parse_from_rfc3339(&format!(
            "{}{offset}",
            naive.format("%Y-%m-%dT%H:%M:%S%.f")
        ))
        .ok()?
        .with_timezone(&Utc),
    };

    Some((timestamp, whole.end()))
}

fn detect_level(line: &str) -> LogLevel {
    match level_pattern().captures(line).and_then(|c| c.get(1)) {
        Some(m) => match m.as_str() {
            "CRITICAL" | "FATAL" | "ERROR" => LogLevel::Error,
            "WARNING" | "WARN" => LogLevel::Warning,
            _ => LogLevel::Debug,
        },
        None => LogLevel::Info,
    }
}

fn last_n<T>(mut items: Vec<T>, n: usize) -> Vec<T> {
    let start = items.len().saturating_sub(n);
    items.split_off(start)
}
