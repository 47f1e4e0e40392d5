//! Browser console log collection and error checking

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};

/// One console message captured by the driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleEntry {
    pub level: String,
    pub text: String,
}

impl ConsoleEntry {
    pub fn is_error(&self) -> bool {
        self.level == "error"
    }
}

/// Error entries whose text matches no allow-list fragment
pub fn unexpected_errors<'a>(
    entries: &'a [ConsoleEntry],
    allowed: &[String],
) -> Vec<&'a ConsoleEntry> {
    entries
        .iter()
        .filter(|e| e.is_error())
        .filter(|e| !allowed.iter().any(|fragment| e.text.contains(fragment)))
        .collect()
}

/// Fail if any console error was logged beyond the allow-listed ones
pub fn check_console_errors(entries: &[ConsoleEntry], allowed: &[String]) -> E2eResult<()> {
    let unexpected = unexpected_errors(entries, allowed);
    if unexpected.is_empty() {
        return Ok(());
    }
    let joined = unexpected
        .iter()
        .map(|e| e.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    Err(E2eError::ConsoleErrors(joined))
}

/// Allow-list entry for the benign frame-display refusal logged while an
/// embedding host page still carries its placeholder exploration id.
///
/// The fixture boots its iframe against the literal id `idToBeReplaced`
/// before a real id is submitted, and the browser logs a cross-origin
/// refusal for that URL. Everything after `secret=` varies per load, so
/// the allow-list entry stops there and is matched as a fragment.
pub fn cross_origin_refusal(base_url: &str, scripts_path: &str, filename: &str) -> String {
    format!(
        "{base}{scripts}{filename} - Refused to display \
         '{base}/explore/idToBeReplaced?iframed=true&locale=en#version=0.0.1&secret=",
        base = base_url,
        scripts = scripts_path,
        filename = filename,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: &str, text: &str) -> ConsoleEntry {
        ConsoleEntry { level: level.to_string(), text: text.to_string() }
    }

    #[test]
    fn test_non_errors_are_ignored() {
        let entries = vec![
            entry("log", "Embedding test: Exploration loaded"),
            entry("warning", "deprecated API"),
        ];
        assert!(check_console_errors(&entries, &[]).is_ok());
    }

    #[test]
    fn test_unexpected_error_fails() {
        let entries = vec![entry("error", "TypeError: undefined is not a function")];
        let result = check_console_errors(&entries, &[]);
        assert!(matches!(result, Err(E2eError::ConsoleErrors(_))));
    }

    #[test]
    fn test_allow_listed_error_is_tolerated() {
        let allowed = vec![cross_origin_refusal(
            "http://localhost:8181",
            "/assets/scripts/",
            "embedding_tests_dev_i18n_0.0.1.html",
        )];
        let entries = vec![entry(
            "error",
            "http://localhost:8181/assets/scripts/embedding_tests_dev_i18n_0.0.1.html - \
             Refused to display 'http://localhost:8181/explore/idToBeReplaced?iframed=true\
             &locale=en#version=0.0.1&secret=4fd6bc2' in a frame",
        )];
        assert!(check_console_errors(&entries, &allowed).is_ok());

        // The same allow-list must not swallow unrelated errors.
        let other = vec![entry("error", "Refused to display 'http://evil.example' in a frame")];
        assert!(check_console_errors(&other, &allowed).is_err());
    }
}
