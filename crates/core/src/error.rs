use crate::lexer::Token;
use crate::plugin::PluginKey;

/// Tokenizer failure for one line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    /// A single quote was opened and never closed; `token` spans from the
    /// opening quote to the end of the line.
    #[error("line {}: unclosed quote starting at column {}", .token.line, .token.start + 1)]
    UnclosedQuote { token: Token },
}

impl LexError {
    pub fn token(&self) -> &Token {
        match self {
            LexError::UnclosedQuote { token } => token,
        }
    }
}

/// A single mismatch between a token line and a statement shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A token is present where a different word was expected.
    #[error("'{}' may be {}", .token.raw, alternatives(.expected))]
    Wrong { token: Token, expected: Vec<String> },

    /// The line ended where a word was expected. `column` is the character
    /// offset just past the last token of the line.
    #[error("missing {}", alternatives(.expected))]
    Missing {
        expected: Vec<String>,
        line: usize,
        column: usize,
    },

    /// A token is left over after the statement shape was fully consumed.
    #[error("extra '{}'", .token.raw)]
    Extra { token: Token },
}

impl ParseError {
    /// Character span to underline, as half-open offsets within the line.
    pub fn span(&self) -> (usize, usize) {
        match self {
            ParseError::Wrong { token, .. } | ParseError::Extra { token } => {
                (token.start, token.end)
            }
            ParseError::Missing { column, .. } => (*column, *column + 1),
        }
    }

    pub fn line(&self) -> usize {
        match self {
            ParseError::Wrong { token, .. } | ParseError::Extra { token } => token.line,
            ParseError::Missing { line, .. } => *line,
        }
    }
}

fn alternatives(words: &[String]) -> String {
    words
        .iter()
        .map(|w| format!("'{}'", w))
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Errors raised while building a [`Registry`](crate::plugin::Registry).
///
/// All of these are construction-time failures: a registry that fails to
/// build never reaches execution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate statement in plugin '{plugin}': {key} (already registered by '{existing}')")]
    DuplicatePlugin {
        key: PluginKey,
        plugin: String,
        existing: String,
    },

    #[error("invalid phrase '{phrase}': {reason}")]
    InvalidPhrase { phrase: String, reason: String },

    #[error("invalid parameter name '{param}': {reason}")]
    InvalidParam { param: String, reason: String },
}

/// Defects found while turning a matched candidate into a statement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VisitError {
    /// Two parameter slots resolved to the same name.
    #[error("parameter '{0}' bound twice")]
    KeyExists(String),

    /// The candidate still carries parse errors.
    #[error("candidate for '{phrase}' has {errors} unresolved parse error(s)")]
    Unresolved { phrase: String, errors: usize },
}

/// Failures raised from inside a plugin handler through its
/// [`ExecutionContext`](crate::context::ExecutionContext).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContextError {
    #[error("parameter '{0}' is required but was not provided")]
    MissingParam(String),

    #[error("parameter '{name}' has the wrong type: {message}")]
    WrongType { name: String, message: String },

    #[error("statement requires an '{0}' clause")]
    MissingTarget(&'static str),

    #[error("'{clause}' target '{target}' must be a string or a list of strings")]
    InvalidTarget {
        clause: &'static str,
        target: String,
    },
}

/// The error a plugin handler settles with.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PluginError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("{0}")]
    Failed(String),
}

impl From<String> for PluginError {
    fn from(message: String) -> Self {
        PluginError::Failed(message)
    }
}

impl From<&str> for PluginError {
    fn from(message: &str) -> Self {
        PluginError::Failed(message.to_string())
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_lists_alternatives() {
        let err = ParseError::Wrong {
            token: Token::new("Like", 1, 7, 11),
            expected: vec!["love".to_string()],
        };
        assert_eq!(err.to_string(), "'Like' may be 'love'");
        assert_eq!(err.span(), (7, 11));
    }

    #[test]
    fn missing_spans_one_column() {
        let err = ParseError::Missing {
            expected: vec!["given".to_string(), "then".to_string()],
            line: 4,
            column: 0,
        };
        assert_eq!(err.to_string(), "missing 'given' or 'then'");
        assert_eq!(err.span(), (0, 1));
        assert_eq!(err.line(), 4);
    }

    #[test]
    fn plugin_error_from_message() {
        let err: PluginError = "boom".into();
        assert_eq!(err.to_string(), "boom");
    }
}
