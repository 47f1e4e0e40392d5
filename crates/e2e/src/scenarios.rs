//! The embedding test scenarios
//!
//! Each scenario is a plain async fn over a fresh [`Session`] and the
//! harness config; control flow is explicit and sequential, so every
//! dependency (notably the exploration id) is visible in the code.

use std::future::Future;
use std::pin::Pin;

use tracing::info;

use crate::console;
use crate::embedding::{self, HostEvent, HOST_FIXTURES, I18N_FIXTURE};
use crate::error::{E2eError, E2eResult};
use crate::exploration::{Answer, ExplorationSpec};
use crate::pages::{accounts, editor, player};
use crate::runner::HarnessConfig;
use crate::session::Session;

const COUNTING_YAML: &str = include_str!("../explorations/counting.yaml");
const LANGUAGE_TEST_YAML: &str = include_str!("../explorations/language_test.yaml");

const COUNTING_QUESTION: &str = "Given three balls of different colors. \
                                 How many ways are there to arrange them in a straight line?";

const ID_INPUT: &str = ".e2e-test-exploration-id-input-field";
const ID_SUBMIT: &str = ".e2e-test-exploration-id-submit-button";
const STANDARD_IFRAME: &str = ".e2e-test-standard > iframe";
const OLD_VERSION_IFRAME: &str = ".e2e-test-old-version > iframe";
const OLD_VERSION_LOAD_BUTTON: &str = ".e2e-test-old-version > explora > div > button";
const I18N_IFRAME: &str = ".e2e-test-embedded-exploration > iframe";

pub type ScenarioFuture<'a> = Pin<Box<dyn Future<Output = E2eResult<()>> + 'a>>;
pub type ScenarioFn = for<'a> fn(&'a mut Session, &'a HarnessConfig) -> ScenarioFuture<'a>;

/// A named scenario the runner can execute
pub struct Scenario {
    pub name: &'static str,
    pub run: ScenarioFn,
}

/// Every scenario in this suite, in execution order
pub fn all() -> Vec<Scenario> {
    vec![
        Scenario { name: "embedded-playthroughs", run: run_embedded_playthroughs },
        Scenario { name: "language-fallback-placeholder", run: run_language_fallback },
    ]
}

fn run_embedded_playthroughs<'a>(
    session: &'a mut Session,
    config: &'a HarnessConfig,
) -> ScenarioFuture<'a> {
    Box::pin(embedded_playthroughs(session, config))
}

fn run_language_fallback<'a>(
    session: &'a mut Session,
    config: &'a HarnessConfig,
) -> ScenarioFuture<'a> {
    Box::pin(language_fallback_placeholder(session, config))
}

/// The four-event lifecycle cycle a counting-exploration playthrough
/// produces in the host page.
fn counting_cycle() -> [HostEvent; 4] {
    [
        HostEvent::Loaded,
        HostEvent::transition("Intro", &Answer::Number(6.0), "correct but why"),
        HostEvent::transition("correct but why", &Answer::Text("factorial".to_string()), "END"),
        HostEvent::Completed,
    ]
}

/// Play the counting exploration inside the current iframe context.
///
/// The standard embed shows the latest version (whose initial card was
/// edited to "Version 3"); the legacy embed pins version 2 with the
/// original question.
async fn play_counting_exploration(session: &mut Session, version: u32) -> E2eResult<()> {
    player::wait_for_player(session).await?;

    let expected = if version == 2 { COUNTING_QUESTION } else { "Version 3" };
    player::expect_content(session, expected).await?;

    player::submit_answer(session, &Answer::Number(6.0)).await?;
    player::expect_content(session, "Right! Why do you think it is 6?").await?;
    player::expect_exploration_to_not_be_over(session).await?;

    player::submit_answer(session, &Answer::Text("factorial".to_string())).await?;
    player::click_through_to_next_card(session).await?;
    player::expect_exploration_to_be_over(session).await
}

/// Embedded-playthrough verification.
///
/// Authors and publishes the counting exploration, plays it through both
/// host fixtures' standard and legacy embeds, and checks that the host
/// pages' lifecycle hooks logged exactly the expected event sequence.
pub async fn embedded_playthroughs(
    session: &mut Session,
    config: &HarnessConfig,
) -> E2eResult<()> {
    let spec = ExplorationSpec::from_yaml(COUNTING_YAML)?;

    accounts::create_user(session, config, "user1@embedding.com", "user1Embedding").await?;
    accounts::login(session, config, "user1@embedding.com", true).await?;

    // Version 1 is the creation of the exploration; everything below
    // depends on its id, retrieved before any fixture interaction.
    let exploration_id = editor::create_new(session, config).await?;

    // Version 2 carries the authored content, published.
    editor::apply_spec(session, &spec).await?;
    editor::save_changes(session, "Done!").await?;
    editor::publish(session).await?;

    // Version 3 replaces the initial card's content.
    editor::open(session, config, &exploration_id).await?;
    editor::set_content(session, "Version 3").await?;
    editor::save_changes(session, "demonstration edit").await?;

    for fixture in HOST_FIXTURES {
        info!("Playing through fixture {}", fixture.filename);

        session.goto(&config.fixture_url(fixture.filename)).await?;
        session.fill(ID_INPUT, &exploration_id).await?;
        session.click(ID_SUBMIT).await?;

        // Standard embedding loads immediately and plays the latest
        // version.
        session.enter_frame(STANDARD_IFRAME).await?;
        play_counting_exploration(session, 3).await?;
        session.leave_frame().await?;

        // The legacy embed pins version 2; on the deferred-load fixture
        // it only starts after a click.
        if fixture.deferred_load {
            session.click(OLD_VERSION_LOAD_BUTTON).await?;
        }
        session.enter_frame(OLD_VERSION_IFRAME).await?;
        play_counting_exploration(session, 2).await?;
        session.leave_frame().await?;
    }

    // The host pages' lifecycle hooks log to the console; collect only
    // after all playthroughs are done.
    let mut console_log = session.drain_console().await?;

    let actual: Vec<HostEvent> = console_log
        .iter()
        .filter_map(|entry| HostEvent::parse_line(&entry.text))
        .collect();
    let expected = embedding::expected_events(HOST_FIXTURES, &counting_cycle());
    if actual != expected {
        return Err(E2eError::LogMismatch {
            expected: expected.iter().map(|e| e.to_string()).collect(),
            actual: actual.iter().map(|e| e.to_string()).collect(),
        });
    }

    accounts::logout(session, config).await?;

    console_log.extend(session.drain_console().await?);
    console::check_console_errors(&console_log, &[])
}

/// Language-driven placeholder verification.
///
/// An exploration authored in a language the site does not support must
/// fall back to the default-language placeholder; a supported language
/// must localize it.
pub async fn language_fallback_placeholder(
    session: &mut Session,
    config: &HarnessConfig,
) -> E2eResult<()> {
    let spec = ExplorationSpec::from_yaml(LANGUAGE_TEST_YAML)?;

    accounts::create_user(session, config, "embedder2@example.com", "Embedder2").await?;
    accounts::login(session, config, "embedder2@example.com", true).await?;

    let exploration_id = editor::create_new(session, config).await?;
    editor::apply_spec(session, &spec).await?;
    editor::save_changes(session, "Done!").await?;
    editor::publish(session).await?;

    // Thai is not a supported site language; the default-language
    // placeholder is expected.
    editor::open(session, config, &exploration_id).await?;
    editor::set_language(session, "ภาษาไทย").await?;
    editor::save_changes(session, "Changing the language to a not supported one.").await?;
    check_placeholder(session, config, &exploration_id, "Type a number").await?;

    // Spanish is supported.
    editor::open(session, config, &exploration_id).await?;
    editor::set_language(session, "español").await?;
    editor::save_changes(session, "Changing the language to a supported one.").await?;
    check_placeholder(session, config, &exploration_id, "Ingresa un número").await?;

    accounts::logout(session, config).await?;

    // The i18n fixture boots its iframe against a placeholder id, which
    // the browser refuses to display once per load; that error is
    // expected noise.
    let console_log = session.drain_console().await?;
    let allowed = vec![config.benign_embed_bootstrap_error(I18N_FIXTURE)];
    console::check_console_errors(&console_log, &allowed)
}

/// Open the i18n host fixture and assert the embedded player's numeric
/// input carries the expected placeholder
async fn check_placeholder(
    session: &mut Session,
    config: &HarnessConfig,
    exploration_id: &str,
    expected: &str,
) -> E2eResult<()> {
    session.goto(&config.fixture_url(I18N_FIXTURE)).await?;
    session.fill(ID_INPUT, exploration_id).await?;
    session.click(ID_SUBMIT).await?;

    session.enter_frame(I18N_IFRAME).await?;
    session.wait_for(player::FLOAT_FORM_INPUT).await?;
    let placeholder = session.attribute(player::FLOAT_FORM_INPUT, "placeholder").await?;
    session.leave_frame().await?;

    if placeholder.as_deref() != Some(expected) {
        return Err(E2eError::AssertionFailed(format!(
            "placeholder mismatch: expected '{}', got {:?}",
            expected, placeholder
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipped_explorations_are_valid() {
        let counting = ExplorationSpec::from_yaml(COUNTING_YAML).unwrap();
        assert_eq!(counting.init_state, "Intro");
        assert_eq!(counting.states.len(), 4);
        assert_eq!(
            counting.state("Intro").unwrap().content,
            COUNTING_QUESTION
        );

        let language = ExplorationSpec::from_yaml(LANGUAGE_TEST_YAML).unwrap();
        assert_eq!(language.init_state, "(initial)");
        assert_eq!(language.states.len(), 2);
    }

    #[test]
    fn test_counting_cycle_renders_the_host_log_lines() {
        let cycle = counting_cycle();
        assert_eq!(cycle[0].to_string(), "Exploration loaded");
        assert_eq!(
            cycle[1].to_string(),
            "Transitioned from state Intro via answer 6 to state correct but why"
        );
        assert_eq!(
            cycle[2].to_string(),
            "Transitioned from state correct but why via answer \"factorial\" to state END"
        );
        assert_eq!(cycle[3].to_string(), "Exploration completed");
    }

    #[test]
    fn test_counting_spec_matches_the_played_route() {
        // The scenario submits 6 and then "factorial"; the spec must
        // route exactly that traversal.
        let spec = ExplorationSpec::from_yaml(COUNTING_YAML).unwrap();

        let intro = spec.state("Intro").unwrap();
        let six = &intro.responses[0];
        assert_eq!(six.when.ui_name(), "Equals");
        assert_eq!(six.when.argument(), "6");
        assert_eq!(six.dest.as_deref(), Some("correct but why"));
        assert!(six.correct);

        let why = spec.state("correct but why").unwrap();
        let factorial = &why.responses[1];
        assert_eq!(factorial.when.ui_name(), "Contains");
        assert_eq!(factorial.when.argument(), "factorial");
        assert_eq!(factorial.dest.as_deref(), Some("END"));
        assert!(!factorial.correct);
    }
}
