use std::{fmt, str::FromStr};

use thiserror::Error;

/// Errors raised while reading a textual selection action.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionError {
    /// The verb or mode is not one the store knows.
    #[error("unrecognized operation `{0}`")]
    Unrecognized(String),
    /// The verb needs an argument that was not given.
    #[error("`{0}` needs a field path")]
    MissingPath(String),
    /// A `value` action without `=Name`.
    #[error("`value {0}` needs a value name, e.g. `value @type=Click`")]
    MissingValue(String),
}

/// A selection command expressed as text.
///
/// Grammar, one action per line:
///
/// ```text
/// select   actor.id
/// deselect actor
/// value    @type=Click
/// clear
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Select a field and every ancestor leading to it.
    Select(Vec<String>),
    /// Deselect a field and purge its selected subtree.
    Deselect(Vec<String>),
    /// Pick the value `variant` of the field at `path`.
    Value { path: Vec<String>, variant: String },
    /// Drop every selection.
    Clear,
}

fn split_path(path: &str) -> Vec<String> {
    path.split('.')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl FromStr for Action {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (verb, arg) = match s.split_once(char::is_whitespace) {
            Some((verb, arg)) => (verb, arg.trim()),
            None => (s, ""),
        };
        let need_path = |arg: &str| {
            let path = split_path(arg);
            if path.is_empty() {
                Err(ActionError::MissingPath(verb.to_string()))
            } else {
                Ok(path)
            }
        };
        match verb.to_ascii_lowercase().as_str() {
            "select" => Ok(Action::Select(need_path(arg)?)),
            "deselect" => Ok(Action::Deselect(need_path(arg)?)),
            "value" => {
                let (path, variant) = arg
                    .split_once('=')
                    .ok_or_else(|| ActionError::MissingValue(arg.to_string()))?;
                let variant = variant.trim();
                if variant.is_empty() {
                    return Err(ActionError::MissingValue(arg.to_string()));
                }
                Ok(Action::Value {
                    path: need_path(path.trim())?,
                    variant: variant.to_string(),
                })
            }
            "clear" => Ok(Action::Clear),
            _ => Err(ActionError::Unrecognized(verb.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Select(path) => write!(f, "select {}", path.join(".")),
            Action::Deselect(path) => write!(f, "deselect {}", path.join(".")),
            Action::Value { path, variant } => write!(f, "value {}={variant}", path.join(".")),
            Action::Clear => f.write_str("clear"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        assert_eq!(
            "select actor.id".parse::<Action>(),
            Ok(Action::Select(vec!["actor".to_string(), "id".to_string()]))
        );
        assert_eq!(
            "  Deselect   actor ".parse::<Action>(),
            Ok(Action::Deselect(vec!["actor".to_string()]))
        );
        assert_eq!(
            "value @type=Click".parse::<Action>(),
            Ok(Action::Value {
                path: vec!["@type".to_string()],
                variant: "Click".to_string()
            })
        );
        assert_eq!("clear".parse::<Action>(), Ok(Action::Clear));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "toggle actor".parse::<Action>(),
            Err(ActionError::Unrecognized("toggle".to_string()))
        );
        assert_eq!(
            "select".parse::<Action>(),
            Err(ActionError::MissingPath("select".to_string()))
        );
        assert_eq!(
            "value @type".parse::<Action>(),
            Err(ActionError::MissingValue("@type".to_string()))
        );
    }

    #[test]
    fn test_display_round_trips_text() {
        let action: Action = "value object.intent=Buy".parse().unwrap();
        assert_eq!(action.to_string(), "value object.intent=Buy");
    }
}
