//! App management - reaching (or spawning) the Explora server under test

use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Handle to the Explora server the harness runs against.
///
/// The server is normally an already-running dev instance the harness
/// merely attaches to; a launch command can be configured to have the
/// harness own the process instead.
pub struct AppHandle {
    child: Option<Child>,
    base_url: String,
}

impl AppHandle {
    /// Spawn the server if configured, then wait for it to be ready
    pub async fn connect(config: AppConfig) -> E2eResult<Self> {
        let child = match &config.launch_command {
            Some(command) if !command.is_empty() => {
                info!("Spawning app server: {}", command.join(" "));
                let spawned = Command::new(&command[0])
                    .args(&command[1..])
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .spawn()
                    .map_err(|e| {
                        E2eError::AppStartup(format!("failed to spawn {}: {}", command[0], e))
                    })?;
                Some(spawned)
            }
            _ => None,
        };

        let handle = AppHandle { child, base_url: config.base_url.clone() };
        handle.wait_until_ready(&config).await?;

        info!("App is ready at {}", handle.base_url);
        Ok(handle)
    }

    /// Poll the readiness URL until it answers or the timeout elapses
    async fn wait_until_ready(&self, config: &AppConfig) -> E2eResult<()> {
        let ready_url = format!("{}{}", self.base_url, config.ready_path);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < config.startup_timeout {
            attempts += 1;

            match client.get(&ready_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    return Ok(());
                }
                Ok(resp) => {
                    warn!("Readiness check returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for app at {}...", ready_url);
                    }
                    // Connection refused is expected while the server is
                    // still starting.
                    if !e.is_connect() {
                        warn!("Readiness check error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(250)).await;
        }

        Err(E2eError::AppReadiness(attempts))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stop the server if this handle owns it
    pub fn stop(&mut self) -> E2eResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        info!("Stopping app server (pid: {})", child.id());

        // Try graceful shutdown first.
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        // Force kill if still running.
        let _ = child.kill();
        let _ = child.wait();

        Ok(())
    }
}

impl Drop for AppHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Configuration for reaching the app under test
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL the app serves from.
    pub base_url: String,

    /// Command to launch the app; None attaches to a running instance.
    pub launch_command: Option<Vec<String>>,

    /// Path polled for readiness, relative to the base URL.
    pub ready_path: String,

    pub startup_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8181".to_string(),
            launch_command: None,
            ready_path: "/".to_string(),
            startup_timeout: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_attaches() {
        let config = AppConfig::default();
        assert!(config.launch_command.is_none());
        assert_eq!(config.base_url, "http://localhost:8181");
    }
}
