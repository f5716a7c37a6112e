//! Human-readable reports with source context.
//!
//! Every report starts with a one-line headline, followed by the failing
//! line and its neighbours, each prefixed with its line number, and a caret
//! line underlining the offending spans:
//!
//! ```text
//! ParseError at line 2: invalid statement
//! 1 | rule input_secret ...
//! 2 | Then I Like Asche
//!   |        ^^^^
//! 3 | Then print the data
//! wrong: 'Like' may be 'love'
//! ```

use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde_json::{Map, Value};

use crate::ast::Cst;
use crate::error::{LexError, ParseError};

/// Line-addressable view of a contract.
#[derive(Debug, Clone)]
pub struct Source<'a> {
    lines: Vec<&'a str>,
}

impl<'a> Source<'a> {
    pub fn new(text: &'a str) -> Self {
        Source {
            lines: text.lines().collect(),
        }
    }

    /// The 1-based line `line`, if present.
    pub fn line(&self, line: usize) -> Option<&'a str> {
        line.checked_sub(1).and_then(|i| self.lines.get(i).copied())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// `context` lines either side of `line`, with `spans` (character
    /// offsets, half-open) underlined beneath it.
    pub fn excerpt(&self, line: usize, spans: &[(usize, usize)], context: usize) -> String {
        let first = line.saturating_sub(context).max(1);
        let last = line.saturating_add(context).min(self.lines.len().max(line));
        let width = last.to_string().len();

        let mut out = String::new();
        for n in first..=last {
            let text = self.line(n).unwrap_or("");
            let _ = writeln!(out, "{:>width$} | {}", n, text, width = width);
            if n == line && !spans.is_empty() {
                let _ = writeln!(out, "{:>width$} | {}", "", underline(spans), width = width);
            }
        }
        out
    }

    /// Every line of the contract, numbered.
    pub fn listing(&self) -> String {
        let width = self.lines.len().to_string().len();
        let mut out = String::new();
        for (i, text) in self.lines.iter().enumerate() {
            let _ = writeln!(out, "{:>width$} | {}", i + 1, text, width = width);
        }
        out
    }
}

fn underline(spans: &[(usize, usize)]) -> String {
    let end = spans.iter().map(|&(_, e)| e).max().unwrap_or(0);
    let mut marks = vec![' '; end];
    for &(start, stop) in spans {
        for mark in marks.iter_mut().take(stop).skip(start) {
            *mark = '^';
        }
    }
    marks.into_iter().collect::<String>().trim_end().to_string()
}

// ──────────────────────────────────────────────
// Reports
// ──────────────────────────────────────────────

/// Report for a line the tokenizer rejected.
pub fn lex_report(source: &Source<'_>, error: &LexError, context: usize) -> String {
    let token = error.token();
    let mut out = format!("LexError at line {}: unclosed quote\n", token.line);
    out.push_str(&source.excerpt(token.line, &[(token.start, token.end)], context));
    let _ = writeln!(out, "unclosed: {}", token.raw);
    out
}

/// Aggregated report for a line that matched no statement cleanly.
///
/// Errors of the structural checks and of every tied candidate are merged;
/// each distinct wrong token, missing word and extra token is listed once.
pub fn parse_report(source: &Source<'_>, cst: &Cst, context: usize) -> String {
    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut wrong: Vec<(String, BTreeSet<String>)> = Vec::new();
    let mut missing: BTreeSet<String> = BTreeSet::new();
    let mut extra: Vec<String> = Vec::new();

    for error in cst.errors() {
        let span = error.span();
        if !spans.contains(&span) {
            spans.push(span);
        }
        match error {
            ParseError::Wrong { token, expected } => {
                match wrong.iter_mut().find(|(raw, _)| *raw == token.raw) {
                    Some((_, alternatives)) => alternatives.extend(expected.iter().cloned()),
                    None => wrong.push((token.raw.clone(), expected.iter().cloned().collect())),
                }
            }
            ParseError::Missing { expected, .. } => missing.extend(expected.iter().cloned()),
            ParseError::Extra { token } => {
                if !extra.contains(&token.raw) {
                    extra.push(token.raw.clone());
                }
            }
        }
    }
    spans.sort_unstable();

    let mut out = format!("ParseError at line {}: invalid statement\n", cst.line);
    out.push_str(&source.excerpt(cst.line, &spans, context));
    if cst.candidates.is_empty() && cst.structural.is_empty() {
        out.push_str("no statement is registered\n");
    }
    for (raw, alternatives) in &wrong {
        let _ = writeln!(out, "wrong: '{}' may be {}", raw, quoted(alternatives.iter()));
    }
    if !missing.is_empty() {
        let _ = writeln!(out, "missing: {}", quoted(missing.iter()));
    }
    if !extra.is_empty() {
        let _ = writeln!(out, "extra: {}", quoted(extra.iter()));
    }
    out
}

/// Report for a statement whose handler failed, optionally with the data
/// scope ("heap") at the time of failure.
pub fn execution_report(
    source: &Source<'_>,
    line: usize,
    message: &str,
    heap: Option<&Map<String, Value>>,
    context: usize,
) -> String {
    let mut out = format!("Error at line {}: {}\n", line, message);
    let width = source.line(line).map(|l| l.chars().count()).unwrap_or(0);
    let leading = source
        .line(line)
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .unwrap_or(0);
    let spans = if width > leading {
        vec![(leading, width)]
    } else {
        Vec::new()
    };
    out.push_str(&source.excerpt(line, &spans, context));
    if let Some(heap) = heap {
        let dump = serde_json::to_string_pretty(heap)
            .unwrap_or_else(|e| format!("<heap not serializable: {}>", e));
        let _ = writeln!(out, "heap:\n{}", dump);
    }
    out
}

/// Report for a failed interpreter run: the whole contract, then its log.
pub fn interpreter_report(source: &Source<'_>, logs: &str) -> String {
    let mut out = String::from("Interpreter error\n");
    out.push_str(&source.listing());
    let _ = writeln!(out, "logs:\n{}", logs.trim_end());
    out
}

fn quoted<'a>(words: impl Iterator<Item = &'a String>) -> String {
    words
        .map(|w| format!("'{}'", w))
        .collect::<Vec<_>>()
        .join(", ")
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
