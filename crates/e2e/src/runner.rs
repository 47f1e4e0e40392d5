//! Harness orchestration: app lifetime, per-scenario sessions, results

use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::app::{AppConfig, AppHandle};
use crate::console;
use crate::error::E2eResult;
use crate::scenarios::Scenario;
use crate::session::{Session, SessionConfig};

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of running the whole suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub started_at: String,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    /// Write the suite result as JSON into the output directory
    pub fn write(&self, output_dir: &PathBuf) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let path = output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

fn summarize(
    results: Vec<ScenarioResult>,
    duration_ms: u64,
    started_at: String,
) -> SuiteResult {
    let passed = results.iter().filter(|r| r.success).count();
    SuiteResult {
        total: results.len(),
        passed,
        failed: results.len() - passed,
        duration_ms,
        started_at,
        results,
    }
}

/// Configuration for the whole harness
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub app: AppConfig,
    pub session: SessionConfig,

    /// URL path under which the static host-page fixtures are served.
    pub scripts_path: String,

    /// Output directory for the results file.
    pub output_dir: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            app: AppConfig::default(),
            session: SessionConfig::default(),
            scripts_path: "/assets/scripts/".to_string(),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

impl HarnessConfig {
    pub fn base_url(&self) -> &str {
        &self.app.base_url
    }

    /// Absolute URL for an app path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Absolute URL for a static host-page fixture
    pub fn fixture_url(&self, filename: &str) -> String {
        format!("{}{}{}", self.base_url(), self.scripts_path, filename)
    }

    /// Allow-list entry for the benign bootstrap refusal a host fixture
    /// logs before a real exploration id is submitted
    pub fn benign_embed_bootstrap_error(&self, filename: &str) -> String {
        console::cross_origin_refusal(self.base_url(), &self.scripts_path, filename)
    }
}

/// Main E2E harness: one app, one fresh browser session per scenario
pub struct Harness {
    config: HarnessConfig,
    app: Option<AppHandle>,
    results: Vec<ScenarioResult>,
    started: Instant,
    started_at: String,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            app: None,
            results: Vec::new(),
            started: Instant::now(),
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Reach (or spawn) the app under test
    pub async fn ensure_app(&mut self) -> E2eResult<()> {
        if self.app.is_some() {
            return Ok(());
        }
        let app = AppHandle::connect(self.config.app.clone()).await?;
        self.app = Some(app);
        Ok(())
    }

    /// Run scenarios in order, each in a fresh browser session.
    ///
    /// Scenario failures are recorded, not propagated; only harness
    /// breakage (app unreachable, driver unavailable) is an error.
    pub async fn run_scenarios(&mut self, scenarios: &[Scenario]) -> E2eResult<()> {
        self.ensure_app().await?;

        info!("Running {} scenario(s)...", scenarios.len());

        for scenario in scenarios {
            let mut session = Session::launch(&self.config.session).await?;
            let start = Instant::now();

            let outcome = (scenario.run)(&mut session, &self.config).await;
            let duration_ms = start.elapsed().as_millis() as u64;
            if let Err(e) = session.close().await {
                warn!("Session shutdown failed: {}", e);
            }

            match &outcome {
                Ok(()) => {
                    info!("✓ {} ({} ms)", scenario.name, duration_ms);
                }
                Err(e) => {
                    error!("✗ {} - {}", scenario.name, e);
                }
            }

            self.results.push(ScenarioResult {
                name: scenario.name.to_string(),
                success: outcome.is_ok(),
                duration_ms,
                error: outcome.err().map(|e| e.to_string()),
            });
        }

        Ok(())
    }

    /// Stop the app (if owned) and summarize the run
    pub fn finish(mut self) -> SuiteResult {
        if let Some(mut app) = self.app.take() {
            let _ = app.stop();
        }

        let duration_ms = self.started.elapsed().as_millis() as u64;
        let suite = summarize(self.results, duration_ms, self.started_at);

        info!(
            "Suite: {} passed, {} failed ({} ms)",
            suite.passed, suite.failed, suite.duration_ms
        );
        suite
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_url() {
        let config = HarnessConfig::default();
        assert_eq!(
            config.fixture_url("embedding_tests_dev_0.0.1.min.html"),
            "http://localhost:8181/assets/scripts/embedding_tests_dev_0.0.1.min.html"
        );
    }

    #[test]
    fn test_benign_bootstrap_error_tracks_base_url() {
        let mut config = HarnessConfig::default();
        config.app.base_url = "http://localhost:9001".to_string();
        let entry = config.benign_embed_bootstrap_error("embedding_tests_dev_i18n_0.0.1.html");
        assert!(entry.starts_with(
            "http://localhost:9001/assets/scripts/embedding_tests_dev_i18n_0.0.1.html"
        ));
        assert!(entry.contains("idToBeReplaced"));
    }

    #[test]
    fn test_summarize_counts() {
        let results = vec![
            ScenarioResult {
                name: "a".to_string(),
                success: true,
                duration_ms: 10,
                error: None,
            },
            ScenarioResult {
                name: "b".to_string(),
                success: false,
                duration_ms: 20,
                error: Some("boom".to_string()),
            },
        ];
        let suite = summarize(results, 30, "2026-01-01T00:00:00Z".to_string());
        assert_eq!(suite.total, 2);
        assert_eq!(suite.passed, 1);
        assert_eq!(suite.failed, 1);
    }
}
