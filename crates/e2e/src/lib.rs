//! Explora Embedding E2E Harness
//!
//! This crate drives a real browser through Playwright to verify
//! Explora's embedding (iframe distribution) feature end to end:
//! - Authors and publishes an exploration through the editor UI
//! - Plays it inside static host pages' standard and deferred embeds
//! - Checks the host pages' lifecycle hooks via captured console logs
//! - Checks language fallback of the embedded player's placeholder text
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Embedding Harness (Rust)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Harness                                                    │
//! │    ├── ensure_app() -> AppHandle (attach or spawn)          │
//! │    ├── Session::launch() -> Node/Playwright driver          │
//! │    └── run_scenarios([Scenario]) -> SuiteResult             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (async fn over Session + HarnessConfig)           │
//! │    ├── pages::{accounts, editor, player}                    │
//! │    ├── ExplorationSpec (YAML, validated)                    │
//! │    └── embedding::{HostEvent, expected_events}              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  driver.js (Node + Playwright)                              │
//! │    └── JSON-lines protocol: one command in, one response    │
//! │        out; console messages buffered until drained         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod app;
pub mod console;
pub mod embedding;
pub mod error;
pub mod exploration;
pub mod pages;
pub mod runner;
pub mod scenarios;
pub mod session;

pub use error::{E2eError, E2eResult};
pub use exploration::ExplorationSpec;
pub use runner::{Harness, HarnessConfig};
pub use session::Session;
