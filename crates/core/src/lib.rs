//! stanza-core: custom statement matching for contracts.
//!
//! A contract mixes statements an external interpreter understands with
//! custom ones it skips. This crate turns each skipped line into a
//! [`Statement`] bound to a registered handler:
//!
//! - [`tokenize()`] -- split one line into positioned tokens
//! - [`Registry`] -- statement shapes ([`PluginKey`]) mapped to [`Executor`]s
//! - [`match_line()`] -- error-scored matching of a line against every shape
//! - [`visit()`] -- winning candidate to canonical statement
//! - [`diagnostic`] -- source-context reports for every failure
//!
//! Running statements around the interpreter is `stanza-eval`'s job.

pub mod ast;
pub mod context;
pub mod diagnostic;
pub mod error;
pub mod lexer;
pub mod matcher;
pub mod plugin;
pub mod visitor;

// ── Convenience re-exports: key types ────────────────────────────────

pub use ast::{Candidate, Cst, Phase, Statement};
pub use context::ExecutionContext;
pub use diagnostic::Source;
pub use error::{ContextError, LexError, ParseError, PluginError, RegistryError, VisitError};
pub use lexer::{Token, TokenLine};
pub use plugin::{Executor, OpenConnect, Plugin, PluginKey, PluginResult, Registry};

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use lexer::tokenize;
pub use matcher::match_line;
pub use visitor::visit;
