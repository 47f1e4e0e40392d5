//! Host lifecycle event parsing and ordering, without a browser
//!
//! These tests feed simulated console drains through the same filtering
//! the embedding scenario uses and check the expected sequences for both
//! distribution modes.

use explora_e2e::console::ConsoleEntry;
use explora_e2e::embedding::{
    expected_events, HostEvent, HostFixture, HOST_FIXTURES, HOST_LOG_PREFIX,
};
use explora_e2e::exploration::Answer;

fn cycle() -> [HostEvent; 4] {
    [
        HostEvent::Loaded,
        HostEvent::transition("Intro", &Answer::Number(6.0), "correct but why"),
        HostEvent::transition("correct but why", &Answer::Text("factorial".to_string()), "END"),
        HostEvent::Completed,
    ]
}

/// Render an event the way webdriver serializes a console message:
/// source location, then the quoted message with inner quotes escaped.
fn webdriver_line(event: &HostEvent) -> String {
    let message = format!("{}{}", HOST_LOG_PREFIX, event).replace('"', "\\\"");
    format!("http://localhost:8181/assets/scripts/host.html 451:11 \"{}\"", message)
}

fn entry(level: &str, text: String) -> ConsoleEntry {
    ConsoleEntry { level: level.to_string(), text }
}

#[test]
fn simulated_drain_filters_down_to_the_expected_sequence() {
    let cycle = cycle();
    let expected = expected_events(HOST_FIXTURES, &cycle);

    // Interleave lifecycle lines with unrelated console noise, mixing
    // clean and webdriver-style serializations.
    let mut entries = Vec::new();
    entries.push(entry("log", "booting embed host".to_string()));
    for (i, event) in expected.iter().enumerate() {
        if i % 2 == 0 {
            entries.push(entry("log", format!("{}{}", HOST_LOG_PREFIX, event)));
        } else {
            entries.push(entry("log", webdriver_line(event)));
        }
        entries.push(entry("debug", format!("frame heartbeat {}", i)));
    }
    entries.push(entry("warning", "slow resource".to_string()));

    let actual: Vec<HostEvent> = entries
        .iter()
        .filter_map(|e| HostEvent::parse_line(&e.text))
        .collect();

    assert_eq!(actual, expected);
}

#[test]
fn deferred_fixture_expects_two_contiguous_full_cycles() {
    let fixture = [HostFixture { filename: "deferred.html", deferred_load: true }];
    let cycle = cycle();

    let expected = expected_events(&fixture, &cycle);
    let mut twice = cycle.to_vec();
    twice.extend(cycle.to_vec());

    assert_eq!(expected, twice);
}

#[test]
fn immediate_fixture_expects_both_loads_before_either_playthrough() {
    let fixture = [HostFixture { filename: "immediate.html", deferred_load: false }];
    let cycle = cycle();

    let expected = expected_events(&fixture, &cycle);

    assert_eq!(expected[0], HostEvent::Loaded);
    assert_eq!(expected[1], HostEvent::Loaded);
    assert_eq!(&expected[2..5], &cycle[1..]);
    assert_eq!(&expected[5..8], &cycle[1..]);
    assert_eq!(expected.len(), 8);
}

#[test]
fn shipped_fixture_order_plays_deferred_first() {
    assert_eq!(HOST_FIXTURES.len(), 2);
    assert!(HOST_FIXTURES[0].deferred_load);
    assert!(!HOST_FIXTURES[1].deferred_load);
    assert_eq!(HOST_FIXTURES[0].filename, "embedding_tests_dev_0.0.1.min.html");
    assert_eq!(HOST_FIXTURES[1].filename, "embedding_tests_dev_0.0.2.min.html");
}

#[test]
fn transition_lines_match_the_host_vocabulary_exactly() {
    let cycle = cycle();
    assert_eq!(
        cycle[1].to_string(),
        "Transitioned from state Intro via answer 6 to state correct but why"
    );
    assert_eq!(
        cycle[2].to_string(),
        "Transitioned from state correct but why via answer \"factorial\" to state END"
    );
}
