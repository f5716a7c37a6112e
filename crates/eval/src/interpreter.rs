//! Boundary to the external contract interpreter.
//!
//! The interpreter is opaque: it takes contract text plus a [`ParamScope`]
//! and either returns a result object with its diagnostic log, or fails with
//! an error whose message is that log.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::scope::ParamScope;

/// A successful interpreter run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterpreterOutput {
    pub result: Map<String, Value>,
    pub logs: String,
}

/// A failed interpreter run; the message is the interpreter's log.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{logs}")]
pub struct InterpreterError {
    pub logs: String,
}

impl InterpreterError {
    pub fn new(logs: impl Into<String>) -> Self {
        InterpreterError { logs: logs.into() }
    }
}

/// The external interpreter.
#[async_trait]
pub trait Interpreter: Send + Sync {
    /// Run the contract for real.
    async fn execute(
        &self,
        contract: &str,
        scope: &ParamScope,
    ) -> Result<InterpreterOutput, InterpreterError>;

    /// Run the contract only to obtain its log, which reports the lines it
    /// did not understand. A failing run still yields its log.
    ///
    /// The default implementation performs a full run; implementations with
    /// a cheaper parse-only mode should override it.
    async fn diagnose(&self, contract: &str, scope: &ParamScope) -> String {
        match self.execute(contract, scope).await {
            Ok(output) => output.logs,
            Err(error) => error.logs,
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl Interpreter for Failing {
        async fn execute(
            &self,
            _contract: &str,
            _scope: &ParamScope,
        ) -> Result<InterpreterOutput, InterpreterError> {
            Err(InterpreterError::new("[W] oops\n[!] failed"))
        }
    }

    #[tokio::test]
    async fn diagnose_recovers_log_of_failed_run() {
        let logs = Failing.diagnose("x", &ParamScope::default()).await;
        assert_eq!(logs, "[W] oops\n[!] failed");
    }
}
