//! Runs a contract's custom statements around the interpreter.
//!
//! One [`Orchestrator::execute`] call:
//! 1. asks the interpreter which lines it ignores (a diagnostic run),
//! 2. tokenizes, matches and visits each ignored line,
//! 3. runs the `Given` statements in source order against `data`,
//! 4. runs the interpreter for real with the updated scope,
//! 5. runs the `Then` statements in source order against its result.
//!
//! Statements never run concurrently: each may read what an earlier one
//! wrote. The first failure aborts the whole call.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use stanza_core::diagnostic::{self, Source};
use stanza_core::{match_line, tokenize, visit, ExecutionContext, Phase, Registry, Statement};

use crate::config::ExecConfig;
use crate::error::ExecError;
use crate::ignored::{IgnoredLine, IgnoredStatements, MarkerScraper};
use crate::interpreter::Interpreter;
use crate::scope::ParamScope;

/// Result of a full contract execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecOutput {
    /// The data scope after the `Then` statements ran.
    pub result: Map<String, Value>,
    /// The interpreter's log of the real run.
    pub logs: String,
}

/// A parsed custom statement and where it came from.
#[derive(Debug, Clone)]
struct Located {
    line: usize,
    statement: Statement,
}

pub struct Orchestrator {
    registry: Registry,
    interpreter: Box<dyn Interpreter>,
    /// Explicit scraper; without one a [`MarkerScraper`] for the configured
    /// marker is used.
    scraper: Option<Box<dyn IgnoredStatements>>,
    config: ExecConfig,
}

impl Orchestrator {
    /// Orchestrator with the default configuration.
    pub fn new(registry: Registry, interpreter: impl Interpreter + 'static) -> Self {
        Orchestrator {
            registry,
            interpreter: Box::new(interpreter),
            scraper: None,
            config: ExecConfig::default(),
        }
    }

    /// Replace the configuration. A scraper set with
    /// [`with_scraper`](Self::with_scraper) is kept.
    pub fn with_config(mut self, config: ExecConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `scraper` instead of a [`MarkerScraper`] for the configured marker.
    pub fn with_scraper(mut self, scraper: impl IgnoredStatements + 'static) -> Self {
        self.scraper = Some(Box::new(scraper));
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// Execute `contract` with `scope`.
    pub async fn execute(&self, contract: &str, scope: ParamScope) -> Result<ExecOutput, ExecError> {
        let source = Source::new(contract);

        let logs = self.interpreter.diagnose(contract, &scope).await;
        let ignored = match &self.scraper {
            Some(scraper) => scraper.extract(&logs),
            None => MarkerScraper::new(self.config.ignored_marker.as_str()).extract(&logs),
        };

        let mut given = Vec::new();
        let mut then = Vec::new();
        for ignored_line in ignored {
            let (phase, located) = self.parse_line(&source, ignored_line)?;
            match phase {
                Phase::Given => given.push(located),
                Phase::Then => then.push(located),
            }
        }
        info!(
            given = given.len(),
            then = then.len(),
            "custom statements collected"
        );

        let mut scope = scope;
        self.run_phase(&source, given, &mut scope.data).await?;

        info!("running interpreter");
        let output = self
            .interpreter
            .execute(contract, &scope)
            .await
            .map_err(|error| ExecError::Interpreter {
                report: diagnostic::interpreter_report(&source, &error.logs),
                error,
            })?;

        let mut scope = ParamScope::new(output.result).with_keys(scope.keys);
        self.run_phase(&source, then, &mut scope.data).await?;

        Ok(ExecOutput {
            result: scope.data,
            logs: output.logs,
        })
    }

    /// Tokenize, match and visit one ignored line.
    ///
    /// The contract's own line is preferred over the scraped text so that
    /// token offsets line up with the source shown in reports. A line number
    /// outside the contract is rejected.
    fn parse_line(
        &self,
        source: &Source<'_>,
        ignored: IgnoredLine,
    ) -> Result<(Phase, Located), ExecError> {
        let context = self.config.context_lines;
        let line = ignored.line;
        let Some(own) = source.line(line) else {
            return Err(ExecError::UnknownLine {
                line,
                lines: source.len(),
                text: ignored.text,
            });
        };
        let text = if own.contains(ignored.text.trim()) {
            own
        } else {
            ignored.text.as_str()
        };

        let tokens = tokenize(text, line).map_err(|error| ExecError::Lex {
            line,
            report: diagnostic::lex_report(source, &error, context),
            error,
        })?;

        let cst = match_line(&self.registry, &tokens);
        let candidates = cst.candidates.len();
        let winner = if cst.is_match() {
            cst.phase.zip(cst.candidates.first().cloned())
        } else {
            None
        };
        let Some((phase, candidate)) = winner else {
            return Err(ExecError::Parse {
                line,
                report: diagnostic::parse_report(source, &cst, context),
                errors: cst.errors().cloned().collect(),
            });
        };

        if candidates > 1 {
            warn!(
                line,
                chosen = %candidate.key,
                alternatives = candidates - 1,
                "ambiguous statement, using the first registered match"
            );
        }

        let statement = visit(candidate).map_err(|error| ExecError::Visit {
            line,
            report: diagnostic::execution_report(source, line, &error.to_string(), None, context),
            error,
        })?;
        debug!(line, phrase = %statement.phrase, ?phase, candidates, "statement parsed");

        Ok((phase, Located { line, statement }))
    }

    /// Run statements in order; each output is written into `data` before
    /// the next statement starts.
    async fn run_phase(
        &self,
        source: &Source<'_>,
        statements: Vec<Located>,
        data: &mut Map<String, Value>,
    ) -> Result<(), ExecError> {
        let context = self.config.context_lines;
        for Located { line, statement } in statements {
            let key = statement.key();
            let Some(executor) = self.registry.lookup(&key) else {
                let message = format!("statement resolves to unregistered shape: {}", key);
                return Err(ExecError::Unregistered {
                    line,
                    report: diagnostic::execution_report(source, line, &message, None, context),
                    key,
                });
            };

            debug!(line, phrase = %statement.phrase, "executing statement");
            let output = statement.output.clone();
            let ctx = ExecutionContext::new(statement, data.clone());
            match executor.execute(ctx).await {
                Ok(value) => {
                    if let Some(name) = output {
                        data.insert(name, value);
                    }
                }
                Err(error) => {
                    let heap = self.config.dump_heap.then_some(&*data);
                    return Err(ExecError::Plugin {
                        line,
                        report: diagnostic::execution_report(
                            source,
                            line,
                            &error.to_string(),
                            heap,
                            context,
                        ),
                        error,
                    });
                }
            }
        }
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
