//! Embedding host fixtures and lifecycle event model
//!
//! The embedding host pages hook exploration lifecycle events and log
//! them to the browser console with a fixed prefix. This module models
//! those events, parses them back out of raw console lines, and builds
//! the sequence a scenario expects for a given set of fixtures.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::exploration::Answer;

/// Marker the host pages prepend to every lifecycle log line.
pub const HOST_LOG_PREFIX: &str = "Embedding test: ";

/// A static host page embedding the exploration under test
#[derive(Debug, Clone, Copy)]
pub struct HostFixture {
    pub filename: &'static str,

    /// Whether the page's legacy embed loads only after a button click.
    pub deferred_load: bool,
}

/// The two distribution-mode fixtures, in playthrough order.
pub const HOST_FIXTURES: &[HostFixture] = &[
    HostFixture { filename: "embedding_tests_dev_0.0.1.min.html", deferred_load: true },
    HostFixture { filename: "embedding_tests_dev_0.0.2.min.html", deferred_load: false },
];

/// Internationalized host fixture used by the placeholder scenario.
pub const I18N_FIXTURE: &str = "embedding_tests_dev_i18n_0.0.1.html";

/// A lifecycle event reported by an embedding host page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Loaded,
    Transitioned {
        from: String,
        answer: String,
        to: String,
    },
    Completed,
}

impl HostEvent {
    pub fn transition(from: &str, answer: &Answer, to: &str) -> Self {
        HostEvent::Transitioned {
            from: from.to_string(),
            answer: answer.logged(),
            to: to.to_string(),
        }
    }

    /// Total parse of a raw console line.
    ///
    /// Lines without the host prefix, and prefixed lines whose payload is
    /// not a known event, yield `None`. Webdriver-style log serialization
    /// quotes the whole message and escapes inner quotes; the trailing
    /// quotation mark and the escapes are stripped before matching.
    pub fn parse_line(line: &str) -> Option<HostEvent> {
        let start = line.find(HOST_LOG_PREFIX)? + HOST_LOG_PREFIX.len();
        let payload = line[start..].strip_suffix('"').unwrap_or(&line[start..]);
        let payload = payload.replace("\\\"", "\"");

        match payload.as_str() {
            "Exploration loaded" => Some(HostEvent::Loaded),
            "Exploration completed" => Some(HostEvent::Completed),
            other => {
                let captures = transition_re().captures(other)?;
                Some(HostEvent::Transitioned {
                    from: captures[1].to_string(),
                    answer: captures[2].to_string(),
                    to: captures[3].to_string(),
                })
            }
        }
    }
}

fn transition_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // State names may contain spaces; the answer binds up to the last
    // " to state " so quoted text answers survive intact.
    RE.get_or_init(|| {
        Regex::new(r"^Transitioned from state (.+?) via answer (.+) to state (.+)$")
            .expect("valid transition regex")
    })
}

impl fmt::Display for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostEvent::Loaded => write!(f, "Exploration loaded"),
            HostEvent::Transitioned { from, answer, to } => {
                write!(f, "Transitioned from state {} via answer {} to state {}", from, answer, to)
            }
            HostEvent::Completed => write!(f, "Exploration completed"),
        }
    }
}

/// Expected event sequence for playing each fixture's two embeds once.
///
/// A deferred-load fixture produces the full cycle per playthrough. A
/// fixture without deferred loading starts both iframes immediately, so
/// both load events fire before either playthrough proceeds; the
/// remaining events then follow per playthrough. This ordering is
/// documented behavior of the embedding host, not a defect.
pub fn expected_events(fixtures: &[HostFixture], cycle: &[HostEvent; 4]) -> Vec<HostEvent> {
    let mut expected = Vec::new();
    for fixture in fixtures {
        if fixture.deferred_load {
            expected.extend_from_slice(cycle);
            expected.extend_from_slice(cycle);
        } else {
            expected.push(cycle[0].clone());
            expected.push(cycle[0].clone());
            expected.extend_from_slice(&cycle[1..]);
            expected.extend_from_slice(&cycle[1..]);
        }
    }
    expected
}
