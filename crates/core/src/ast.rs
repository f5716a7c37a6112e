//! Matcher output (CST) and the canonical statement (AST) handed to handlers.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ParseError;
use crate::lexer::Token;
use crate::plugin::{OpenConnect, PluginKey};

/// Whether a statement runs before (`Given`) or after (`Then`) the
/// interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Given,
    Then,
}

/// One registry entry tried against a token line.
///
/// Captured tokens keep their quotes; the visitor strips them.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub key: PluginKey,
    /// Parameter name and value token, in the order they appeared.
    pub bindings: Vec<(String, Token)>,
    pub open_connect: Option<Token>,
    pub output: Option<Token>,
    pub errors: Vec<ParseError>,
}

/// The surviving candidates for one line, plus line-level errors.
#[derive(Debug, Clone, PartialEq)]
pub struct Cst {
    pub line: usize,
    pub phase: Option<Phase>,
    /// Missing or wrong `Given`/`Then` and `I`.
    pub structural: Vec<ParseError>,
    /// Candidates tying for the lowest error count, in registration order.
    pub candidates: Vec<Candidate>,
}

impl Cst {
    /// True when the line parsed: no structural errors and a winning
    /// candidate without errors.
    pub fn is_match(&self) -> bool {
        self.phase.is_some()
            && self.structural.is_empty()
            && self.candidates.iter().any(|c| c.errors.is_empty())
    }

    /// All errors of the line: structural first, then per candidate.
    pub fn errors(&self) -> impl Iterator<Item = &ParseError> {
        self.structural
            .iter()
            .chain(self.candidates.iter().flat_map(|c| c.errors.iter()))
    }
}

/// Canonical, fully resolved custom statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub mode: OpenConnect,
    /// The open/connect target, quotes stripped.
    pub open_connect: Option<String>,
    /// Parameter name to the data key it was sent.
    pub bindings: BTreeMap<String, String>,
    pub phrase: String,
    pub output: Option<String>,
}

impl Statement {
    /// The registry key this statement was matched against.
    pub fn key(&self) -> PluginKey {
        PluginKey {
            open_connect: self.mode,
            params: self.bindings.keys().cloned().collect::<BTreeSet<_>>(),
            phrase: self.phrase.split(' ').map(str::to_string).collect(),
        }
    }
}
