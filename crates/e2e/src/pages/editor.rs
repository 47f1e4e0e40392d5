//! Exploration editor flows
//!
//! Drives the authoring UI: state naming and content, interactions,
//! answer-triggered responses, default outcomes, exploration settings,
//! saving, and publishing. [`apply_spec`] authors a whole
//! [`ExplorationSpec`] in one pass.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{E2eError, E2eResult};
use crate::exploration::{ExplorationSpec, Interaction, OutcomeSpec, ResponseSpec};
use crate::runner::HarnessConfig;
use crate::session::Session;

/// Name the editor gives the first card of a fresh exploration.
pub const DEFAULT_STATE_NAME: &str = "(initial)";

const CREATE_BUTTON: &str = ".e2e-test-create-new-exploration-button";
const STATE_NAME_CONTAINER: &str = ".e2e-test-state-name-container";
const STATE_NAME_INPUT: &str = ".e2e-test-state-name-input";
const STATE_NAME_SUBMIT: &str = ".e2e-test-state-name-submit";
const NODE_LABEL: &str = ".e2e-test-node-label";
const EDIT_CONTENT: &str = ".e2e-test-edit-content";
const CONTENT_EDITOR: &str = ".e2e-test-state-content-editor";
const SAVE_CONTENT: &str = ".e2e-test-save-state-content";
const OPEN_INTERACTION_PANEL: &str = ".e2e-test-open-interaction-panel";
const SAVE_INTERACTION: &str = ".e2e-test-save-interaction";
const TEXT_INPUT_PLACEHOLDER_FIELD: &str = ".e2e-test-text-input-placeholder-field";
const TEXT_INPUT_ROWS_FIELD: &str = ".e2e-test-text-input-rows-field";
const CONTINUE_BUTTON_TEXT_FIELD: &str = ".e2e-test-continue-button-text-field";
const OPEN_ADD_RESPONSE_MODAL: &str = ".e2e-test-open-add-response-modal";
const ADD_RESPONSE_MODAL: &str = ".e2e-test-add-response-modal";
const RULE_SELECT: &str = ".e2e-test-rule-select";
const RULE_ARGUMENT_INPUT: &str = ".e2e-test-rule-argument-input";
const RESPONSE_FEEDBACK_EDITOR: &str = ".e2e-test-response-feedback-editor";
const DESTINATION_SELECT: &str = ".e2e-test-destination-select";
const NEW_CARD_NAME_INPUT: &str = ".e2e-test-new-card-name-input";
const MARK_CORRECT_CHECKBOX: &str = ".e2e-test-mark-correct-checkbox";
const ADD_RESPONSE_BUTTON: &str = ".e2e-test-add-response-button";
const DEFAULT_RESPONSE_TAB: &str = ".e2e-test-default-response-tab";
const DEFAULT_FEEDBACK_EDITOR: &str = ".e2e-test-default-feedback-editor";
const DEFAULT_DESTINATION_SELECT: &str = ".e2e-test-default-destination-select";
const SAVE_DEFAULT_OUTCOME: &str = ".e2e-test-save-default-outcome";
const SETTINGS_TAB: &str = ".e2e-test-settings-tab";
const TITLE_INPUT: &str = ".e2e-test-exploration-title-input";
const CATEGORY_SELECT: &str = ".e2e-test-exploration-category-select";
const OBJECTIVE_INPUT: &str = ".e2e-test-exploration-objective-input";
const LANGUAGE_SELECT: &str = ".e2e-test-exploration-language-select";
const SAVE_CHANGES_BUTTON: &str = ".e2e-test-save-changes-button";
const COMMIT_MESSAGE_INPUT: &str = ".e2e-test-commit-message-input";
const CLOSE_SAVE_MODAL_BUTTON: &str = ".e2e-test-close-save-modal-button";
const PUBLISH_BUTTON: &str = ".e2e-test-publish-exploration-button";
const CONFIRM_PUBLISH_BUTTON: &str = ".e2e-test-confirm-publish-button";

/// Dropdown option that creates a fresh card as the destination.
const NEW_CARD_OPTION: &str = "A New Card Called...";

/// Create a new exploration from the creator dashboard.
///
/// Returns the exploration id once the editor is open, so every later
/// step can depend on it explicitly.
pub async fn create_new(session: &mut Session, config: &HarnessConfig) -> E2eResult<String> {
    session.goto(&config.url("/creator-dashboard")).await?;
    session.click(CREATE_BUTTON).await?;
    session.wait_for(STATE_NAME_CONTAINER).await?;

    let id = exploration_id(session).await?;
    info!("Created exploration {}", id);
    Ok(id)
}

/// Open an existing exploration in the editor
pub async fn open(
    session: &mut Session,
    config: &HarnessConfig,
    exploration_id: &str,
) -> E2eResult<()> {
    session.goto(&config.url(&format!("/create/{}", exploration_id))).await?;
    session.wait_for(STATE_NAME_CONTAINER).await
}

/// Read the exploration id out of the editor's URL
pub async fn exploration_id(session: &mut Session) -> E2eResult<String> {
    let path = session.eval_string("location.pathname").await?;
    parse_exploration_id(&path).ok_or_else(|| {
        E2eError::AssertionFailed(format!("no exploration id in editor path '{}'", path))
    })
}

fn parse_exploration_id(path: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"/create/([A-Za-z0-9_-]+)").expect("valid exploration id regex")
    });
    re.captures(path).map(|c| c[1].to_string())
}

/// Rename the current state
pub async fn set_state_name(session: &mut Session, name: &str) -> E2eResult<()> {
    session.click(STATE_NAME_CONTAINER).await?;
    session.fill(STATE_NAME_INPUT, name).await?;
    session.click(STATE_NAME_SUBMIT).await?;
    Ok(())
}

/// Switch the editor to the state node with the given name
pub async fn move_to_state(session: &mut Session, name: &str) -> E2eResult<()> {
    debug!("Moving to state '{}'", name);
    session.click_text(NODE_LABEL, name).await?;
    session.wait_text(STATE_NAME_CONTAINER, name).await
}

pub async fn set_content(session: &mut Session, content: &str) -> E2eResult<()> {
    session.click(EDIT_CONTENT).await?;
    session.fill(CONTENT_EDITOR, content).await?;
    session.click(SAVE_CONTENT).await?;
    Ok(())
}

/// Choose and customize the current state's interaction
pub async fn set_interaction(session: &mut Session, interaction: &Interaction) -> E2eResult<()> {
    session.click(OPEN_INTERACTION_PANEL).await?;
    session
        .click(&format!(".e2e-test-interaction-tile-{}", interaction.id()))
        .await?;

    match interaction {
        Interaction::NumericInput | Interaction::EndExploration => {}
        Interaction::TextInput { placeholder, rows } => {
            if let Some(placeholder) = placeholder {
                session.fill(TEXT_INPUT_PLACEHOLDER_FIELD, placeholder).await?;
            }
            session.fill(TEXT_INPUT_ROWS_FIELD, &rows.to_string()).await?;
        }
        Interaction::Continue { button_text } => {
            if let Some(button_text) = button_text {
                session.fill(CONTINUE_BUTTON_TEXT_FIELD, button_text).await?;
            }
        }
    }

    session.click(SAVE_INTERACTION).await?;
    Ok(())
}

/// Add an answer-triggered response to the current state.
///
/// `new_dest` marks a destination card that does not exist yet, which
/// the response creates through the "new card" dropdown option.
pub async fn add_response(
    session: &mut Session,
    response: &ResponseSpec,
    new_dest: bool,
) -> E2eResult<()> {
    session.click(OPEN_ADD_RESPONSE_MODAL).await?;
    session.select_label(RULE_SELECT, response.when.ui_name()).await?;
    session.fill(RULE_ARGUMENT_INPUT, &response.when.argument()).await?;

    if let Some(feedback) = &response.feedback {
        session.fill(RESPONSE_FEEDBACK_EDITOR, feedback).await?;
    }
    if let Some(dest) = &response.dest {
        set_destination(session, DESTINATION_SELECT, dest, new_dest).await?;
    }
    if response.correct {
        session.click(MARK_CORRECT_CHECKBOX).await?;
    }

    session.click(ADD_RESPONSE_BUTTON).await?;
    session.wait_gone(ADD_RESPONSE_MODAL).await
}

/// Edit the current state's default outcome
pub async fn set_default_outcome(
    session: &mut Session,
    outcome: &OutcomeSpec,
    new_dest: bool,
) -> E2eResult<()> {
    session.click(DEFAULT_RESPONSE_TAB).await?;

    if let Some(feedback) = &outcome.feedback {
        session.fill(DEFAULT_FEEDBACK_EDITOR, feedback).await?;
    }
    if let Some(dest) = &outcome.dest {
        set_destination(session, DEFAULT_DESTINATION_SELECT, dest, new_dest).await?;
    }
    if outcome.correct {
        session.click(MARK_CORRECT_CHECKBOX).await?;
    }

    session.click(SAVE_DEFAULT_OUTCOME).await?;
    Ok(())
}

async fn set_destination(
    session: &mut Session,
    select: &str,
    dest: &str,
    new_dest: bool,
) -> E2eResult<()> {
    if new_dest {
        session.select_label(select, NEW_CARD_OPTION).await?;
        session.fill(NEW_CARD_NAME_INPUT, dest).await?;
    } else {
        session.select_label(select, dest).await?;
    }
    Ok(())
}

pub async fn set_title(session: &mut Session, title: &str) -> E2eResult<()> {
    session.click(SETTINGS_TAB).await?;
    session.fill(TITLE_INPUT, title).await
}

pub async fn set_category(session: &mut Session, category: &str) -> E2eResult<()> {
    session.click(SETTINGS_TAB).await?;
    session.select_label(CATEGORY_SELECT, category).await
}

pub async fn set_objective(session: &mut Session, objective: &str) -> E2eResult<()> {
    session.click(SETTINGS_TAB).await?;
    session.fill(OBJECTIVE_INPUT, objective).await
}

/// Change the exploration's authored language
pub async fn set_language(session: &mut Session, language: &str) -> E2eResult<()> {
    session.click(SETTINGS_TAB).await?;
    session.select_label(LANGUAGE_SELECT, language).await
}

/// Save a new version with a commit message
pub async fn save_changes(session: &mut Session, commit_message: &str) -> E2eResult<()> {
    debug!("Saving changes: {}", commit_message);
    session.click(SAVE_CHANGES_BUTTON).await?;
    session.fill(COMMIT_MESSAGE_INPUT, commit_message).await?;
    session.click(CLOSE_SAVE_MODAL_BUTTON).await?;
    session.wait_gone(COMMIT_MESSAGE_INPUT).await
}

/// Publish the exploration to the library
pub async fn publish(session: &mut Session) -> E2eResult<()> {
    session.click(PUBLISH_BUTTON).await?;
    session.click(CONFIRM_PUBLISH_BUTTON).await?;
    session.wait_gone(CONFIRM_PUBLISH_BUTTON).await
}

/// Author a whole exploration from its spec.
///
/// States are authored in spec order; a destination card is created the
/// first time a response or default outcome routes to it, so later
/// `move_to_state` calls find every node in the graph.
pub async fn apply_spec(session: &mut Session, spec: &ExplorationSpec) -> E2eResult<()> {
    spec.validate()?;
    info!("Authoring exploration '{}'", spec.title);

    if spec.init_state != DEFAULT_STATE_NAME {
        set_state_name(session, &spec.init_state).await?;
    }

    let mut cards: HashSet<&str> = HashSet::new();
    cards.insert(spec.init_state.as_str());

    for (index, state) in spec.states.iter().enumerate() {
        if index > 0 {
            move_to_state(session, &state.name).await?;
        }

        set_content(session, &state.content).await?;
        set_interaction(session, &state.interaction).await?;

        for response in &state.responses {
            let new_dest = match response.dest.as_deref() {
                Some(dest) => cards.insert(dest),
                None => false,
            };
            add_response(session, response, new_dest).await?;
        }

        if let Some(outcome) = &state.default_outcome {
            let new_dest = match outcome.dest.as_deref() {
                Some(dest) => cards.insert(dest),
                None => false,
            };
            set_default_outcome(session, outcome, new_dest).await?;
        }
    }

    set_title(session, &spec.title).await?;
    set_category(session, &spec.category).await?;
    set_objective(session, &spec.objective).await?;
    if let Some(language) = &spec.language {
        set_language(session, language).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exploration_id() {
        assert_eq!(parse_exploration_id("/create/aB3xYz09"), Some("aB3xYz09".to_string()));
        assert_eq!(
            parse_exploration_id("/create/aB3xYz09/gui/Intro"),
            Some("aB3xYz09".to_string())
        );
        assert_eq!(parse_exploration_id("/creator-dashboard"), None);
    }
}
