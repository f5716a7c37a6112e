//! stanza-eval: executes contracts that mix interpreter statements with
//! custom ones.
//!
//! The [`Orchestrator`] owns a [`Registry`](stanza_core::Registry) of custom
//! statements and an [`Interpreter`]. Custom `Given` statements run before the
//! interpreter, custom `Then` statements after it, all threading one
//! [`ParamScope`].

pub mod config;
pub mod error;
pub mod ignored;
pub mod interpreter;
pub mod orchestrator;
pub mod scope;

pub use config::{ConfigError, ExecConfig};
pub use error::ExecError;
pub use ignored::{IgnoredLine, IgnoredStatements, MarkerScraper};
pub use interpreter::{Interpreter, InterpreterError, InterpreterOutput};
pub use orchestrator::{ExecOutput, Orchestrator};
pub use scope::ParamScope;
