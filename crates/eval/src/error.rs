use stanza_core::{LexError, ParseError, PluginError, PluginKey, VisitError};

use crate::interpreter::InterpreterError;

/// Everything that can abort [`Orchestrator::execute`](crate::Orchestrator::execute).
///
/// Each variant keeps the structured cause next to `report`, the rendered
/// message with source context; `Display` prints the report.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// An ignored line could not be tokenized.
    #[error("{report}")]
    Lex {
        line: usize,
        #[source]
        error: LexError,
        report: String,
    },

    /// An ignored line matched no registered statement cleanly.
    #[error("{report}")]
    Parse {
        line: usize,
        errors: Vec<ParseError>,
        report: String,
    },

    /// The winning candidate could not be turned into a statement.
    #[error("{report}")]
    Visit {
        line: usize,
        #[source]
        error: VisitError,
        report: String,
    },

    /// The ignored-statement log named a line the contract does not have.
    #[error("ignored statement reported at line {line}, but the contract has {lines} line(s): {text}")]
    UnknownLine {
        line: usize,
        lines: usize,
        text: String,
    },

    /// A parsed statement has no registered executor.
    #[error("{report}")]
    Unregistered {
        line: usize,
        key: PluginKey,
        report: String,
    },

    /// A handler settled with a failure.
    #[error("{report}")]
    Plugin {
        line: usize,
        #[source]
        error: PluginError,
        report: String,
    },

    /// The interpreter run failed.
    #[error("{report}")]
    Interpreter {
        #[source]
        error: InterpreterError,
        report: String,
    },
}

impl ExecError {
    /// Contract line the failure belongs to, when there is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            ExecError::Lex { line, .. }
            | ExecError::Parse { line, .. }
            | ExecError::UnknownLine { line, .. }
            | ExecError::Visit { line, .. }
            | ExecError::Unregistered { line, .. }
            | ExecError::Plugin { line, .. } => Some(*line),
            ExecError::Interpreter { .. } => None,
        }
    }
}
