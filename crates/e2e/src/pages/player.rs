//! Exploration player flows
//!
//! Used inside embedding iframes: the session's DOM context must already
//! be switched into the player frame.

use crate::error::{E2eError, E2eResult};
use crate::exploration::Answer;
use crate::session::Session;

const CONVERSATION_CONTENT: &str = ".e2e-test-conversation-content";
const CONVERSATION_END: &str = ".e2e-test-conversation-end";
const SUBMIT_ANSWER_BUTTON: &str = ".e2e-test-submit-answer-button";
const NEXT_CARD_BUTTON: &str = ".e2e-test-next-card-button";
const TEXT_ANSWER_INPUT: &str = ".e2e-test-text-answer-input";

/// Numeric answer input; its `placeholder` attribute carries the
/// localized prompt the i18n scenario asserts on.
pub const FLOAT_FORM_INPUT: &str = ".e2e-test-float-form-input";

/// Wait for the player to show its first card
pub async fn wait_for_player(session: &mut Session) -> E2eResult<()> {
    session.wait_for(CONVERSATION_CONTENT).await
}

/// Assert the latest card's content equals `expected`
pub async fn expect_content(session: &mut Session, expected: &str) -> E2eResult<()> {
    session.wait_text(CONVERSATION_CONTENT, expected).await?;
    let actual = session.last_text(CONVERSATION_CONTENT).await?;
    if actual.trim() != expected {
        return Err(E2eError::AssertionFailed(format!(
            "content mismatch: expected '{}', got '{}'",
            expected,
            actual.trim()
        )));
    }
    Ok(())
}

/// Type an answer into the current interaction and submit it
pub async fn submit_answer(session: &mut Session, answer: &Answer) -> E2eResult<()> {
    let input = match answer {
        Answer::Number(_) => FLOAT_FORM_INPUT,
        Answer::Text(_) => TEXT_ANSWER_INPUT,
    };
    session.fill(input, &answer.typed()).await?;
    session.click(SUBMIT_ANSWER_BUTTON).await
}

/// Advance past the current card's feedback
pub async fn click_through_to_next_card(session: &mut Session) -> E2eResult<()> {
    session.click(NEXT_CARD_BUTTON).await
}

pub async fn expect_exploration_to_be_over(session: &mut Session) -> E2eResult<()> {
    session.wait_for(CONVERSATION_END).await?;
    let count = session.count(CONVERSATION_END).await?;
    if count == 0 {
        return Err(E2eError::AssertionFailed(
            "exploration should be over, but no terminal card is shown".to_string(),
        ));
    }
    Ok(())
}

pub async fn expect_exploration_to_not_be_over(session: &mut Session) -> E2eResult<()> {
    let count = session.count(CONVERSATION_END).await?;
    if count != 0 {
        return Err(E2eError::AssertionFailed(
            "exploration should not be over yet, but a terminal card is shown".to_string(),
        ));
    }
    Ok(())
}
