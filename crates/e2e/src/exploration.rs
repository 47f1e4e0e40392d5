//! Declarative exploration specifications
//!
//! Scenarios author explorations through the editor UI from these specs
//! rather than from inline call sequences, so the same structure can be
//! validated up front: every destination a playthrough will attempt must
//! resolve to a state the spec actually defines.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};

/// A complete exploration: metadata plus an ordered set of named states.
///
/// The first entry of `states` must be the initial state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorationSpec {
    pub title: String,
    pub category: String,
    pub objective: String,

    /// Authored language, set through the editor settings when present.
    #[serde(default)]
    pub language: Option<String>,

    pub init_state: String,
    pub states: Vec<StateSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSpec {
    pub name: String,
    pub content: String,
    pub interaction: Interaction,

    /// Answer-triggered responses, in the order they are added.
    #[serde(default)]
    pub responses: Vec<ResponseSpec>,

    #[serde(default)]
    pub default_outcome: Option<OutcomeSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Interaction {
    NumericInput,
    TextInput {
        #[serde(default)]
        placeholder: Option<String>,
        #[serde(default = "default_rows")]
        rows: u32,
    },
    Continue {
        #[serde(default)]
        button_text: Option<String>,
    },
    EndExploration,
}

fn default_rows() -> u32 {
    1
}

impl Interaction {
    /// Interaction id as the editor's selection panel knows it
    pub fn id(&self) -> &'static str {
        match self {
            Interaction::NumericInput => "NumericInput",
            Interaction::TextInput { .. } => "TextInput",
            Interaction::Continue { .. } => "Continue",
            Interaction::EndExploration => "EndExploration",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Interaction::EndExploration)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseSpec {
    pub when: MatchRule,

    #[serde(default)]
    pub feedback: Option<String>,

    /// Destination state; None keeps the learner on the same card.
    #[serde(default)]
    pub dest: Option<String>,

    /// Whether a matching answer is labelled correct.
    #[serde(default)]
    pub correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum MatchRule {
    Equals { value: f64 },
    IsLessThanOrEqualTo { value: f64 },
    Contains { value: String },
}

impl MatchRule {
    /// Rule name as shown in the editor's rule dropdown
    pub fn ui_name(&self) -> &'static str {
        match self {
            MatchRule::Equals { .. } => "Equals",
            MatchRule::IsLessThanOrEqualTo { .. } => "IsLessThanOrEqualTo",
            MatchRule::Contains { .. } => "Contains",
        }
    }

    /// Rule argument as typed into the editor's argument field
    pub fn argument(&self) -> String {
        match self {
            MatchRule::Equals { value } | MatchRule::IsLessThanOrEqualTo { value } => {
                format_number(*value)
            }
            MatchRule::Contains { value } => value.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeSpec {
    #[serde(default)]
    pub feedback: Option<String>,

    #[serde(default)]
    pub dest: Option<String>,

    #[serde(default)]
    pub correct: bool,
}

/// A learner answer submitted through the player
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Number(f64),
    Text(String),
}

impl Answer {
    /// The characters typed into the input widget
    pub fn typed(&self) -> String {
        match self {
            Answer::Number(n) => format_number(*n),
            Answer::Text(s) => s.clone(),
        }
    }

    /// The rendering the embedding host uses in its transition logs:
    /// numbers bare, text wrapped in double quotes.
    pub fn logged(&self) -> String {
        match self {
            Answer::Number(n) => format_number(*n),
            Answer::Text(s) => format!("\"{}\"", s),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl ExplorationSpec {
    /// Parse a spec from YAML
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let spec: Self = serde_yaml::from_str(yaml)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Parse a spec from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load all specs from a directory tree
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            specs.push(Self::from_file(entry.path())?);
        }

        Ok(specs)
    }

    pub fn state(&self, name: &str) -> Option<&StateSpec> {
        self.states.iter().find(|s| s.name == name)
    }

    /// Structural validation: the states and transitions defined here
    /// must match what a playthrough can actually reach.
    pub fn validate(&self) -> E2eResult<()> {
        if self.states.is_empty() {
            return Err(invalid("no states defined"));
        }
        if self.states[0].name != self.init_state {
            return Err(invalid(format!(
                "initial state '{}' is not the first defined state",
                self.init_state
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for state in &self.states {
            if !seen.insert(state.name.as_str()) {
                return Err(invalid(format!("duplicate state '{}'", state.name)));
            }
        }

        let mut has_terminal = false;
        for state in &self.states {
            if state.interaction.is_terminal() {
                has_terminal = true;
                if !state.responses.is_empty() || state.default_outcome.is_some() {
                    return Err(invalid(format!(
                        "terminal state '{}' must have no outgoing transitions",
                        state.name
                    )));
                }
                continue;
            }

            for response in &state.responses {
                self.check_dest(&state.name, response.dest.as_deref(), &seen)?;
            }
            if let Some(outcome) = &state.default_outcome {
                self.check_dest(&state.name, outcome.dest.as_deref(), &seen)?;
            }
        }

        if !has_terminal {
            return Err(invalid("no terminal state defined"));
        }

        // The editor creates a card the first time something routes to
        // it, so a state no destination names can never be authored.
        let mut referenced = std::collections::HashSet::new();
        referenced.insert(self.init_state.as_str());
        for state in &self.states {
            for response in &state.responses {
                if let Some(dest) = response.dest.as_deref() {
                    referenced.insert(dest);
                }
            }
            if let Some(dest) = state.default_outcome.as_ref().and_then(|o| o.dest.as_deref()) {
                referenced.insert(dest);
            }
        }
        for state in &self.states {
            if !referenced.contains(state.name.as_str()) {
                return Err(invalid(format!("state '{}' is never routed to", state.name)));
            }
        }

        Ok(())
    }

    fn check_dest(
        &self,
        from: &str,
        dest: Option<&str>,
        known: &std::collections::HashSet<&str>,
    ) -> E2eResult<()> {
        if let Some(dest) = dest {
            if !known.contains(dest) {
                return Err(invalid(format!(
                    "state '{}' routes to undefined state '{}'",
                    from, dest
                )));
            }
        }
        Ok(())
    }
}

fn invalid(message: impl fmt::Display) -> E2eError {
    E2eError::Exploration(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const MINIMAL: &str = r#"
title: Minimal
category: Test
objective: a minimal two-state exploration
init_state: (initial)
states:
  - name: (initial)
    content: Pick a number
    interaction:
      kind: numeric_input
    responses:
      - when:
          rule: equals
          value: 1
        dest: END
        correct: true
    default_outcome:
      feedback: Try again
  - name: END
    content: Done
    interaction:
      kind: end_exploration
"#;

    #[test]
    fn test_parse_minimal_spec() {
        let spec = ExplorationSpec::from_yaml(MINIMAL).unwrap();
        assert_eq!(spec.init_state, "(initial)");
        assert_eq!(spec.states.len(), 2);

        let initial = spec.state("(initial)").unwrap();
        assert_eq!(initial.responses.len(), 1);
        assert_eq!(initial.responses[0].dest.as_deref(), Some("END"));
        assert!(initial.responses[0].correct);
        assert!(spec.state("END").unwrap().interaction.is_terminal());
    }

    #[test]
    fn test_undefined_destination_is_rejected() {
        let yaml = MINIMAL.replace("dest: END", "dest: nowhere");
        let err = ExplorationSpec::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("undefined state 'nowhere'"));
    }

    #[test]
    fn test_terminal_state_with_outcome_is_rejected() {
        let yaml = format!(
            "{}\n    default_outcome:\n      feedback: impossible\n",
            MINIMAL.trim_end()
        );
        let err = ExplorationSpec::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("no outgoing transitions"));
    }

    #[test]
    fn test_unrouted_state_is_rejected() {
        let yaml = format!(
            "{}\n  - name: orphan\n    content: unreachable\n    interaction:\n      kind: numeric_input\n",
            MINIMAL.trim_end()
        );
        let err = ExplorationSpec::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("never routed to"));
    }

    #[test]
    fn test_initial_state_must_come_first() {
        let yaml = MINIMAL.replace("init_state: (initial)", "init_state: END");
        assert!(ExplorationSpec::from_yaml(&yaml).is_err());
    }

    #[test_case(Answer::Number(6.0), "6", "6" ; "integral number")]
    #[test_case(Answer::Number(2.5), "2.5", "2.5" ; "fractional number")]
    #[test_case(Answer::Text("factorial".into()), "factorial", "\"factorial\"" ; "text")]
    fn test_answer_rendering(answer: Answer, typed: &str, logged: &str) {
        assert_eq!(answer.typed(), typed);
        assert_eq!(answer.logged(), logged);
    }

    #[test]
    fn test_rule_editor_rendering() {
        let rule = MatchRule::IsLessThanOrEqualTo { value: 0.0 };
        assert_eq!(rule.ui_name(), "IsLessThanOrEqualTo");
        assert_eq!(rule.argument(), "0");

        let rule = MatchRule::Contains { value: "permutation".into() };
        assert_eq!(rule.ui_name(), "Contains");
        assert_eq!(rule.argument(), "permutation");
    }
}
