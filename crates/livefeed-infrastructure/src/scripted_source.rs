//! Event source that replays newline-delimited JSON scripts.
//!
//! Each handle maps to `<script_dir>/<handle>.jsonl`. Every non-blank line
//! that does not start with `#` is one step:
//!
//! ```text
//! {"event": "chat", "delay_ms": 500, "data": {"uniqueId": "bob", "comment": "hi"}}
//! {"event": "gift", "data": {"giftName": "Rose", "repeatCount": 3}}
//! {"event": "error", "data": {"reason": "stream ended"}}
//! ```
//!
//! `delay_ms` is waited before the step is delivered. The reserved `error`
//! event reports a connection failure and ends the replay.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use livefeed_core::error::{LiveFeedError, Result};
use livefeed_core::event::{RawEvent, SourceChannel};
use livefeed_core::source::{EventSource, SourceConnection, SourceHandler};
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

const FAILURE_EVENT: &str = "error";

#[derive(Debug, Deserialize)]
struct ScriptLine {
    event: String,
    #[serde(default)]
    delay_ms: u64,
    #[serde(default)]
    data: Value,
}

/// One parsed replay step.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Event { delay: Duration, raw: RawEvent },
    Failure { delay: Duration, reason: String },
}

/// Parses a script, skipping blank lines, `#` comments and lines that are
/// not valid steps.
pub fn parse_script(content: &str) -> Vec<ScriptStep> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .filter_map(|(number, line)| match serde_json::from_str::<ScriptLine>(line) {
            Ok(parsed) => Some(to_step(parsed)),
            Err(e) => {
                tracing::warn!("[ScriptedSource] Skipping line {}: {}", number + 1, e);
                None
            }
        })
        .collect()
}

fn to_step(line: ScriptLine) -> ScriptStep {
    let delay = Duration::from_millis(line.delay_ms);
    if line.event.eq_ignore_ascii_case(FAILURE_EVENT) {
        let reason = line
            .data
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or("stream ended")
            .to_string();
        return ScriptStep::Failure { delay, reason };
    }
    ScriptStep::Event {
        delay,
        raw: RawEvent::new(SourceChannel::from_name(&line.event), line.data),
    }
}

/// Opens [`ScriptedConnection`]s against a script directory.
pub struct ScriptedSource {
    script_dir: PathBuf,
}

impl ScriptedSource {
    pub fn new(script_dir: PathBuf) -> Self {
        Self { script_dir }
    }

    pub fn script_path(&self, handle: &str) -> PathBuf {
        self.script_dir.join(format!("{handle}.jsonl"))
    }
}

impl EventSource for ScriptedSource {
    fn open(&self, handle: &str, handler: Arc<dyn SourceHandler>) -> Arc<dyn SourceConnection> {
        Arc::new(ScriptedConnection {
            handle: handle.to_string(),
            path: self.script_path(handle),
            handler,
            cancel: CancellationToken::new(),
        })
    }
}

/// Replays one script file into a handler.
pub struct ScriptedConnection {
    handle: String,
    path: PathBuf,
    handler: Arc<dyn SourceHandler>,
    cancel: CancellationToken,
}

impl ScriptedConnection {
    async fn read_script(&self) -> Result<Vec<ScriptStep>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    LiveFeedError::connection(format!("no live stream found for @{}", self.handle))
                }
                _ => LiveFeedError::connection(format!("{}: {}", self.path.display(), e)),
            })?;
        Ok(parse_script(&content))
    }
}

#[async_trait]
impl SourceConnection for ScriptedConnection {
    async fn connect(&self) -> Result<()> {
        let steps = self.read_script().await?;
        tracing::info!(
            "[ScriptedSource] Replaying {} steps for @{} from {}",
            steps.len(),
            self.handle,
            self.path.display()
        );

        let handler = Arc::clone(&self.handler);
        let cancel = self.cancel.clone();
        let handle = self.handle.clone();
        tokio::spawn(async move {
            replay(steps, handler, cancel.clone()).await;
            tracing::debug!(
                "[ScriptedSource] Replay for @{} ended (cancelled: {})",
                handle,
                cancel.is_cancelled()
            );
        });
        Ok(())
    }

    async fn disconnect(&self) {
        self.cancel.cancel();
    }
}

async fn replay(steps: Vec<ScriptStep>, handler: Arc<dyn SourceHandler>, cancel: CancellationToken) {
    for step in steps {
        let delay = match &step {
            ScriptStep::Event { delay, .. } | ScriptStep::Failure { delay, .. } => *delay,
        };
        if !delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        if cancel.is_cancelled() {
            return;
        }

        match step {
            ScriptStep::Event { raw, .. } => handler.on_event(raw),
            ScriptStep::Failure { reason, .. } => {
                handler.on_failure(reason);
                return;
            }
        }
    }
}

/// Handles that have a script under `script_dir`, sorted.
///
/// An unreadable or missing directory yields an empty list.
pub fn available_handles(script_dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(script_dir) else {
        return Vec::new();
    };
    let mut handles: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "jsonl"))
        .filter_map(|path| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
        .collect();
    handles.sort();
    handles
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingHandler {
        events: Mutex<Vec<RawEvent>>,
        failures: Mutex<Vec<String>>,
    }

    impl SourceHandler for RecordingHandler {
        fn on_event(&self, raw: RawEvent) {
            self.events.lock().unwrap().push(raw);
        }

        fn on_failure(&self, reason: String) {
            self.failures.lock().unwrap().push(reason);
        }
    }

    fn write_script(dir: &TempDir, handle: &str, content: &str) {
        std::fs::write(dir.path().join(format!("{handle}.jsonl")), content).unwrap();
    }

    #[test]
    fn test_parse_skips_comments_and_bad_lines() {
        let steps = parse_script(
            "# warm-up\n\n{\"event\":\"chat\",\"data\":{\"comment\":\"hi\"}}\nnot json\n{\"event\":\"error\"}\n",
        );
        assert_eq!(steps.len(), 2);
        assert!(matches!(
            &steps[0],
            ScriptStep::Event { raw, .. } if raw.channel == SourceChannel::Chat
        ));
        assert_eq!(
            steps[1],
            ScriptStep::Failure {
                delay: Duration::ZERO,
                reason: "stream ended".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_script_fails_to_connect() {
        let temp_dir = TempDir::new().unwrap();
        let source = ScriptedSource::new(temp_dir.path().to_path_buf());
        let connection = source.open("ghost", Arc::new(RecordingHandler::default()));

        let err = connection.connect().await.unwrap_err();
        assert!(err.is_connection());
        assert!(err.to_string().contains("@ghost"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_honours_delays() {
        let temp_dir = TempDir::new().unwrap();
        write_script(
            &temp_dir,
            "alice",
            "{\"event\":\"chat\",\"data\":{\"comment\":\"one\"}}\n\
             {\"event\":\"gift\",\"delay_ms\":1000,\"data\":{\"giftName\":\"Rose\"}}\n\
             {\"event\":\"error\",\"delay_ms\":1000,\"data\":{\"reason\":\"offline\"}}\n",
        );
        let source = ScriptedSource::new(temp_dir.path().to_path_buf());
        let handler = Arc::new(RecordingHandler::default());
        let connection = source.open("alice", handler.clone());
        assert_eq!(available_handles(temp_dir.path()), vec!["alice"]);

        connection.connect().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(handler.events.lock().unwrap().len(), 1);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(handler.events.lock().unwrap().len(), 2);
        assert_eq!(handler.events.lock().unwrap()[1].channel, SourceChannel::Gift);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(*handler.failures.lock().unwrap(), vec!["offline".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_stops_replay() {
        let temp_dir = TempDir::new().unwrap();
        write_script(
            &temp_dir,
            "alice",
            "{\"event\":\"chat\",\"delay_ms\":500,\"data\":{\"comment\":\"late\"}}\n",
        );
        let source = ScriptedSource::new(temp_dir.path().to_path_buf());
        let handler = Arc::new(RecordingHandler::default());
        let connection = source.open("alice", handler.clone());

        connection.connect().await.unwrap();
        connection.disconnect().await;
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(handler.events.lock().unwrap().is_empty());
    }
}
