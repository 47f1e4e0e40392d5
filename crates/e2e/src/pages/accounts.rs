//! Account flows: sign-up, sign-in, sign-out

use tracing::debug;

use crate::error::E2eResult;
use crate::runner::HarnessConfig;
use crate::session::Session;

const EMAIL_INPUT: &str = ".e2e-test-sign-in-email-input";
const ADMIN_CHECKBOX: &str = ".e2e-test-sign-in-admin-checkbox";
const SIGN_IN_BUTTON: &str = ".e2e-test-sign-in-button";
const USERNAME_INPUT: &str = ".e2e-test-signup-username-input";
const AGREE_CHECKBOX: &str = ".e2e-test-agree-to-terms-checkbox";
const REGISTER_BUTTON: &str = ".e2e-test-register-user-button";
const TOP_NAVIGATION: &str = ".e2e-test-top-navigation";

/// Register a new account, then sign out again.
///
/// The first sign-in with an unknown email lands on the signup page,
/// where the username and terms agreement complete registration.
pub async fn create_user(
    session: &mut Session,
    config: &HarnessConfig,
    email: &str,
    username: &str,
) -> E2eResult<()> {
    debug!("Creating user {} ({})", username, email);

    session.goto(&config.url("/login")).await?;
    session.fill(EMAIL_INPUT, email).await?;
    session.click(SIGN_IN_BUTTON).await?;

    session.wait_for(USERNAME_INPUT).await?;
    session.fill(USERNAME_INPUT, username).await?;
    session.click(AGREE_CHECKBOX).await?;
    session.click(REGISTER_BUTTON).await?;
    session.wait_for(TOP_NAVIGATION).await?;

    logout(session, config).await
}

/// Sign in with an existing account, optionally as an admin
pub async fn login(
    session: &mut Session,
    config: &HarnessConfig,
    email: &str,
    admin: bool,
) -> E2eResult<()> {
    debug!("Logging in as {} (admin: {})", email, admin);

    session.goto(&config.url("/login")).await?;
    session.fill(EMAIL_INPUT, email).await?;
    if admin {
        session.click(ADMIN_CHECKBOX).await?;
    }
    session.click(SIGN_IN_BUTTON).await?;
    session.wait_for(TOP_NAVIGATION).await?;
    Ok(())
}

pub async fn logout(session: &mut Session, config: &HarnessConfig) -> E2eResult<()> {
    session.goto(&config.url("/logout")).await
}
