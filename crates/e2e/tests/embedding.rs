//! Embedding E2E harness entry point
//!
//! This file is the test binary that runs the embedding scenarios
//! against a live Explora server and a real browser.
//! Run with: cargo test --package explora-e2e --test embedding

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use explora_e2e::app::AppConfig;
use explora_e2e::runner::{Harness, HarnessConfig};
use explora_e2e::scenarios;
use explora_e2e::session::{Browser, SessionConfig};
use explora_e2e::E2eResult;

#[derive(Parser, Debug)]
#[command(name = "explora-e2e")]
#[command(about = "Embedding E2E harness for Explora")]
struct Args {
    /// Base URL of the Explora server under test
    #[arg(long, default_value = "http://localhost:8181")]
    base_url: String,

    /// Command to launch the server; attaches to a running one if unset
    #[arg(long, num_args = 1.., value_delimiter = ' ')]
    app_command: Option<Vec<String>>,

    /// Run only the scenario with this name
    #[arg(short, long)]
    name: Option<String>,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long, default_value = "chromium")]
    browser: String,

    /// Run in headless mode
    #[arg(long, default_value = "true")]
    headless: bool,

    /// Node binary used to run the Playwright driver
    #[arg(long, default_value = "node")]
    node: PathBuf,

    /// Viewport width
    #[arg(long, default_value = "1280")]
    viewport_width: u32,

    /// Viewport height
    #[arg(long, default_value = "720")]
    viewport_height: u32,

    /// URL path serving the static host-page fixtures
    #[arg(long, default_value = "/assets/scripts/")]
    scripts_path: String,

    /// Output directory for results
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let result = rt.block_on(async_main(args));

    match result {
        Ok(success) => {
            if success {
                std::process::exit(0);
            } else {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> E2eResult<bool> {
    let browser = match args.browser.as_str() {
        "firefox" => Browser::Firefox,
        "webkit" => Browser::Webkit,
        _ => Browser::Chromium,
    };

    let config = HarnessConfig {
        app: AppConfig {
            base_url: args.base_url,
            launch_command: args.app_command,
            ..Default::default()
        },
        session: SessionConfig {
            node_binary: args.node,
            browser,
            headless: args.headless,
            viewport_width: args.viewport_width,
            viewport_height: args.viewport_height,
            ..Default::default()
        },
        scripts_path: args.scripts_path,
        output_dir: args.output,
    };

    let scenarios = scenarios::all();
    let selected: Vec<_> = match &args.name {
        Some(name) => scenarios.into_iter().filter(|s| s.name == *name).collect(),
        None => scenarios,
    };

    let output_dir = config.output_dir.clone();
    let mut harness = Harness::new(config);
    harness.run_scenarios(&selected).await?;

    let suite = harness.finish();
    suite.write(&output_dir)?;

    Ok(suite.failed == 0)
}
