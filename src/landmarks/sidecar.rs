//! Hand landmark backend running as a long-lived helper process.
//!
//! Wire protocol, one exchange per frame:
//!
//! - request: `"<width> <height>\n"` then `width * height * 3` RGB bytes
//! - reply: one JSON line, `{"hands": [[[x, y, z], ...21], ...]}` or
//!   `{"error": "..."}`
//!
//! The process is spawned lazily on first use and respawned after any I/O
//! failure.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::Mutex;

use serde::Deserialize;

use super::{Frame, HandLandmarker, LandmarkError};
use crate::types::{Landmark, NUM_LANDMARKS};

struct SidecarProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl SidecarProcess {
    fn exchange(&mut self, frame: &Frame) -> Result<String, LandmarkError> {
        writeln!(self.stdin, "{} {}", frame.width(), frame.height())?;
        self.stdin.write_all(frame.data())?;
        self.stdin.flush()?;

        let mut line = String::new();
        let n = self.stdout.read_line(&mut line)?;
        if n == 0 {
            return Err(LandmarkError::Protocol("helper process closed its output".into()));
        }
        Ok(line)
    }

    fn shutdown(mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default)]
    hands: Vec<Vec<Landmark>>,
    #[serde(default)]
    error: Option<String>,
}

/// Parse and validate one reply line.
pub(crate) fn parse_reply(line: &str) -> Result<Vec<Vec<Landmark>>, LandmarkError> {
    let reply: Reply = serde_json::from_str(line.trim())
        .map_err(|e| LandmarkError::Protocol(format!("malformed reply: {e}")))?;
    if let Some(msg) = reply.error {
        return Err(LandmarkError::Backend(msg));
    }
    for (i, hand) in reply.hands.iter().enumerate() {
        if hand.len() != NUM_LANDMARKS {
            return Err(LandmarkError::Protocol(format!(
                "hand {i} has {} landmarks, expected {NUM_LANDMARKS}",
                hand.len()
            )));
        }
    }
    Ok(reply.hands)
}

/// Landmarker backed by an external helper process.
pub struct SidecarLandmarker {
    command: String,
    args: Vec<String>,
    process: Mutex<Option<SidecarProcess>>,
}

impl SidecarLandmarker {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            process: Mutex::new(None),
        }
    }

    fn spawn(&self) -> Result<SidecarProcess, LandmarkError> {
        tracing::info!(command = %self.command, args = ?self.args, "Starting hand landmark helper");

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                LandmarkError::Spawn(format!(
                    "failed to spawn '{}': {e}. Is the helper installed?",
                    self.command
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LandmarkError::Spawn("failed to capture stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| LandmarkError::Spawn("failed to capture stdout".into()))?;

        Ok(SidecarProcess {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    /// Start the helper now instead of on the first frame.
    pub fn warm_up(&self) -> Result<(), LandmarkError> {
        let mut guard = self.process.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_none() {
            *guard = Some(self.spawn()?);
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.process
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

impl HandLandmarker for SidecarLandmarker {
    fn detect(&self, frame: &Frame) -> Result<Vec<Vec<Landmark>>, LandmarkError> {
        let mut guard = self.process.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_none() {
            *guard = Some(self.spawn()?);
        }
        let Some(process) = guard.as_mut() else {
            return Err(LandmarkError::Spawn("helper process unavailable".into()));
        };

        match process.exchange(frame) {
            Ok(line) => parse_reply(&line),
            Err(e) => {
                // Stream is out of sync; drop the process so the next frame respawns it
                if let Some(dead) = guard.take() {
                    dead.shutdown();
                }
                Err(e)
            }
        }
    }

    fn describe(&self) -> String {
        format!("sidecar:{}", self.command)
    }
}

impl Drop for SidecarLandmarker {
    fn drop(&mut self) {
        let process = self
            .process
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(process) = process {
            process.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::ColorOrder;

    fn hand_json(points: usize) -> String {
        let pts: Vec<String> = (0..points).map(|i| format!("[{i}.0,0.5,0.0]")).collect();
        format!("{{\"hands\":[[{}]]}}\n", pts.join(","))
    }

    #[test]
    fn test_parse_reply_one_hand() {
        let hands = parse_reply(&hand_json(21)).unwrap();
        assert_eq!(hands.len(), 1);
        assert_eq!(hands[0][3], [3.0, 0.5, 0.0]);
    }

    #[test]
    fn test_parse_reply_no_hands() {
        assert!(parse_reply("{\"hands\":[]}").unwrap().is_empty());
        assert!(parse_reply("{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_reply_rejects_wrong_point_count() {
        assert!(matches!(
            parse_reply(&hand_json(20)),
            Err(LandmarkError::Protocol(_))
        ));
    }

    #[test]
    fn test_parse_reply_errors() {
        assert!(matches!(parse_reply("nope"), Err(LandmarkError::Protocol(_))));
        assert!(matches!(
            parse_reply("{\"error\":\"model missing\"}"),
            Err(LandmarkError::Backend(_))
        ));
    }

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let lm = SidecarLandmarker::new("/nonexistent/landmark-helper", vec![]);
        let frame = Frame::new(1, 1, vec![0, 0, 0], ColorOrder::Rgb).unwrap();
        assert!(matches!(lm.detect(&frame), Err(LandmarkError::Spawn(_))));
        assert!(!lm.is_running());
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_helper_round_trip() {
        // Reads each header, discards the pixels, answers with no hands
        let script = r#"while read w h; do head -c $((w*h*3)) >/dev/null; echo '{"hands":[]}'; done"#;
        let lm = SidecarLandmarker::new("sh", vec!["-c".into(), script.into()]);
        let frame = Frame::new(2, 2, vec![7; 12], ColorOrder::Rgb).unwrap();

        assert!(lm.detect(&frame).unwrap().is_empty());
        assert!(lm.detect(&frame).unwrap().is_empty());
        assert!(lm.is_running());
    }
}
