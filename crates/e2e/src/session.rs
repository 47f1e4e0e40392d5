//! Persistent Playwright browser session
//!
//! The session spawns a small Node driver (see `driver.js`) and speaks a
//! JSON-lines protocol to it over stdin/stdout. One command is in flight
//! at a time; responses are matched by id. This keeps the whole scenario
//! inside a single live browser page, which the editor and player flows
//! depend on.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tracing::{debug, warn};

use crate::console::ConsoleEntry;
use crate::error::{E2eError, E2eResult};

/// Driver source, staged into a temp directory at launch.
const DRIVER_JS: &str = include_str!("driver.js");

#[derive(Debug, Clone, Copy, Default)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// A single command sent to the driver.
///
/// Serialized shape is the wire format: `{"op": "...", ...fields}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Goto { url: String },
    Click { selector: String },
    ClickText { selector: String, text: String },
    Fill { selector: String, value: String },
    SelectLabel { selector: String, label: String },
    WaitFor { selector: String, timeout_ms: u64 },
    WaitGone { selector: String, timeout_ms: u64 },
    WaitText { selector: String, text: String, timeout_ms: u64 },
    Texts { selector: String },
    Count { selector: String },
    Attribute { selector: String, name: String },
    Evaluate { script: String },
    EnterFrame { selector: String },
    LeaveFrame,
    DrainConsole,
    Close,
}

impl Command {
    /// Short label used in error reports and debug logs.
    fn label(&self) -> String {
        match self {
            Command::Goto { url } => format!("goto:{}", url),
            Command::Click { selector } => format!("click:{}", selector),
            Command::ClickText { selector, .. } => format!("click_text:{}", selector),
            Command::Fill { selector, .. } => format!("fill:{}", selector),
            Command::SelectLabel { selector, .. } => format!("select:{}", selector),
            Command::WaitFor { selector, .. } => format!("wait_for:{}", selector),
            Command::WaitGone { selector, .. } => format!("wait_gone:{}", selector),
            Command::WaitText { selector, .. } => format!("wait_text:{}", selector),
            Command::Texts { selector } => format!("texts:{}", selector),
            Command::Count { selector } => format!("count:{}", selector),
            Command::Attribute { selector, name } => format!("attribute:{}@{}", selector, name),
            Command::Evaluate { .. } => "evaluate".to_string(),
            Command::EnterFrame { selector } => format!("enter_frame:{}", selector),
            Command::LeaveFrame => "leave_frame".to_string(),
            Command::DrainConsole => "drain_console".to_string(),
            Command::Close => "close".to_string(),
        }
    }
}

#[derive(Serialize)]
struct Request<'a> {
    id: u64,
    #[serde(flatten)]
    command: &'a Command,
}

#[derive(Debug, Deserialize)]
struct Response {
    id: i64,
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
}

/// Configuration for launching a browser session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub node_binary: PathBuf,
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Time allowed for the driver to report the browser as ready.
    pub launch_timeout: Duration,

    /// Time allowed for any single command round trip.
    pub command_timeout: Duration,

    /// Default timeout for `wait_for` / `wait_gone`.
    pub wait_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            node_binary: PathBuf::from("node"),
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            launch_timeout: Duration::from_secs(30),
            command_timeout: Duration::from_secs(30),
            wait_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Serialize)]
struct DriverConfig<'a> {
    browser: &'a str,
    headless: bool,
    viewport_width: u32,
    viewport_height: u32,
}

/// Handle to a live driver process and its browser page
pub struct Session {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    command_timeout: Duration,
    wait_timeout: Duration,
    // Keeps the staged driver script alive for the child's lifetime.
    _staging: tempfile::TempDir,
}

impl Session {
    /// Launch the driver and wait for its ready marker
    pub async fn launch(config: &SessionConfig) -> E2eResult<Self> {
        Self::check_node_installed(&config.node_binary)?;

        let staging = tempfile::tempdir()?;
        let driver_path = staging.path().join("driver.js");
        std::fs::write(&driver_path, DRIVER_JS)?;

        let driver_config = serde_json::to_string(&DriverConfig {
            browser: config.browser.as_str(),
            headless: config.headless,
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
        })?;

        debug!("Launching driver: {}", driver_path.display());

        let mut child = TokioCommand::new(&config.node_binary)
            .arg(&driver_path)
            .arg(&driver_config)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| E2eError::Driver(format!("failed to spawn driver: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Driver("driver stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Driver("driver stdout unavailable".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| E2eError::Driver("driver stderr unavailable".to_string()))?;

        // Forward driver stderr (Playwright noise, crashes) to the log.
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!("driver: {}", line);
            }
        });

        let mut session = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 1,
            command_timeout: config.command_timeout,
            wait_timeout: config.wait_timeout,
            _staging: staging,
        };

        // The driver emits `{"id": 0, "ok": true}` once the browser is up.
        let ready = tokio::time::timeout(config.launch_timeout, session.read_response(0))
            .await
            .map_err(|_| E2eError::Timeout("driver ready marker".to_string()))??;
        if !ready.ok {
            return Err(E2eError::Driver(
                ready.error.unwrap_or_else(|| "browser launch failed".to_string()),
            ));
        }

        Ok(session)
    }

    fn check_node_installed(node_binary: &PathBuf) -> E2eResult<()> {
        let output = std::process::Command::new(node_binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::DriverUnavailable),
        }
    }

    /// Send one command and wait for its response value
    async fn call(&mut self, command: Command) -> E2eResult<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let label = command.label();
        debug!("-> {}", label);

        let mut line = serde_json::to_string(&Request { id, command: &command })?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| E2eError::Driver(format!("driver write failed: {}", e)))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| E2eError::Driver(format!("driver flush failed: {}", e)))?;

        let response = tokio::time::timeout(self.command_timeout, self.read_response(id as i64))
            .await
            .map_err(|_| E2eError::Timeout(label.clone()))??;

        if response.ok {
            Ok(response.value)
        } else {
            Err(E2eError::CommandFailed {
                command: label,
                reason: response.error.unwrap_or_else(|| "unknown".to_string()),
            })
        }
    }

    /// Read stdout lines until a response with the given id appears
    async fn read_response(&mut self, id: i64) -> E2eResult<Response> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await
                .map_err(|e| E2eError::Driver(format!("driver read failed: {}", e)))?
                .ok_or_else(|| E2eError::Driver("driver exited unexpectedly".to_string()))?;

            match serde_json::from_str::<Response>(&line) {
                Ok(response) if response.id == id => return Ok(response),
                Ok(stale) => warn!("discarding stale driver response id {}", stale.id),
                Err(_) => warn!("discarding non-protocol driver output: {}", line),
            }
        }
    }

    pub async fn goto(&mut self, url: &str) -> E2eResult<()> {
        self.call(Command::Goto { url: url.to_string() }).await?;
        Ok(())
    }

    pub async fn click(&mut self, selector: &str) -> E2eResult<()> {
        self.call(Command::Click { selector: selector.to_string() }).await?;
        Ok(())
    }

    /// Click the first element matching `selector` whose text contains `text`
    pub async fn click_text(&mut self, selector: &str, text: &str) -> E2eResult<()> {
        self.call(Command::ClickText {
            selector: selector.to_string(),
            text: text.to_string(),
        })
        .await?;
        Ok(())
    }

    pub async fn fill(&mut self, selector: &str, value: &str) -> E2eResult<()> {
        self.call(Command::Fill {
            selector: selector.to_string(),
            value: value.to_string(),
        })
        .await?;
        Ok(())
    }

    /// Select a dropdown option by its visible label
    pub async fn select_label(&mut self, selector: &str, label: &str) -> E2eResult<()> {
        self.call(Command::SelectLabel {
            selector: selector.to_string(),
            label: label.to_string(),
        })
        .await?;
        Ok(())
    }

    pub async fn wait_for(&mut self, selector: &str) -> E2eResult<()> {
        let timeout_ms = self.wait_timeout.as_millis() as u64;
        self.call(Command::WaitFor {
            selector: selector.to_string(),
            timeout_ms,
        })
        .await?;
        Ok(())
    }

    /// Wait for every element matching `selector` to be hidden or detached
    pub async fn wait_gone(&mut self, selector: &str) -> E2eResult<()> {
        let timeout_ms = self.wait_timeout.as_millis() as u64;
        self.call(Command::WaitGone {
            selector: selector.to_string(),
            timeout_ms,
        })
        .await?;
        Ok(())
    }

    /// Wait for some element matching `selector` to contain `text`
    pub async fn wait_text(&mut self, selector: &str, text: &str) -> E2eResult<()> {
        let timeout_ms = self.wait_timeout.as_millis() as u64;
        self.call(Command::WaitText {
            selector: selector.to_string(),
            text: text.to_string(),
            timeout_ms,
        })
        .await?;
        Ok(())
    }

    /// Inner texts of all elements matching `selector`, in DOM order
    pub async fn texts(&mut self, selector: &str) -> E2eResult<Vec<String>> {
        let value = self.call(Command::Texts { selector: selector.to_string() }).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Inner text of the last element matching `selector`
    pub async fn last_text(&mut self, selector: &str) -> E2eResult<String> {
        let mut texts = self.texts(selector).await?;
        texts.pop().ok_or_else(|| E2eError::CommandFailed {
            command: format!("texts:{}", selector),
            reason: "no matching elements".to_string(),
        })
    }

    pub async fn count(&mut self, selector: &str) -> E2eResult<usize> {
        let value = self.call(Command::Count { selector: selector.to_string() }).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Attribute value of the first matching element, or None if unset
    pub async fn attribute(&mut self, selector: &str, name: &str) -> E2eResult<Option<String>> {
        let value = self
            .call(Command::Attribute {
                selector: selector.to_string(),
                name: name.to_string(),
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Evaluate a JavaScript expression in the current DOM context
    pub async fn evaluate(&mut self, script: &str) -> E2eResult<Value> {
        self.call(Command::Evaluate { script: script.to_string() }).await
    }

    pub async fn eval_string(&mut self, script: &str) -> E2eResult<String> {
        let value = self.evaluate(script).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Switch the DOM context into the iframe matched by `selector`
    pub async fn enter_frame(&mut self, selector: &str) -> E2eResult<()> {
        self.call(Command::EnterFrame { selector: selector.to_string() }).await?;
        Ok(())
    }

    /// Switch the DOM context back to the top-level page
    pub async fn leave_frame(&mut self) -> E2eResult<()> {
        self.call(Command::LeaveFrame).await?;
        Ok(())
    }

    /// Take all console entries buffered since the last drain
    pub async fn drain_console(&mut self) -> E2eResult<Vec<ConsoleEntry>> {
        let value = self.call(Command::DrainConsole).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Close the browser and reap the driver process
    pub async fn close(mut self) -> E2eResult<()> {
        let _ = self.call(Command::Close).await;
        match tokio::time::timeout(Duration::from_secs(5), self.child.wait()).await {
            Ok(_) => Ok(()),
            Err(_) => {
                warn!("driver did not exit, killing");
                let _ = self.child.start_kill();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_wire_shape() {
        let request = Request {
            id: 7,
            command: &Command::Fill {
                selector: ".e2e-test-exploration-id-input-field".to_string(),
                value: "abc123".to_string(),
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "op": "fill",
                "selector": ".e2e-test-exploration-id-input-field",
                "value": "abc123",
            })
        );
    }

    #[test]
    fn test_unit_commands_have_no_payload() {
        let request = Request { id: 1, command: &Command::DrainConsole };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({ "id": 1, "op": "drain_console" }));
    }

    #[test]
    fn test_response_parse() {
        let ok: Response =
            serde_json::from_str(r#"{"id": 3, "ok": true, "value": ["a", "b"]}"#).unwrap();
        assert!(ok.ok);
        assert_eq!(ok.value, json!(["a", "b"]));

        let err: Response =
            serde_json::from_str(r#"{"id": 4, "ok": false, "error": "no such element"}"#).unwrap();
        assert!(!err.ok);
        assert_eq!(err.error.as_deref(), Some("no such element"));
        assert_eq!(err.value, Value::Null);
    }

    #[test]
    fn test_driver_understands_every_op() {
        let ops = [
            "goto", "click", "click_text", "fill", "select_label", "wait_for", "wait_gone",
            "wait_text", "texts", "count", "attribute", "evaluate", "enter_frame",
            "leave_frame", "drain_console", "close",
        ];
        for op in ops {
            assert!(
                DRIVER_JS.contains(&format!("case '{}':", op)),
                "driver.js is missing op {}",
                op
            );
        }
    }
}
