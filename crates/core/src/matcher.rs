//! Best-effort matching of a token line against every registered shape.
//!
//! Each registry key is walked positionally over the tokens after
//! `Given I`/`Then I`. Mismatches do not stop the walk: they are recorded as
//! [`ParseError`]s and the walk carries on, so every candidate ends up with a
//! score (its error count). Only the candidates tying for the lowest score
//! across the whole registry survive.
//!
//! A candidate is abandoned as soon as its error count exceeds the best score
//! seen so far; it can no longer win and its remaining errors would only add
//! noise to the report.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use tracing::trace;

use crate::ast::{Candidate, Cst, Phase};
use crate::error::ParseError;
use crate::lexer::{Token, TokenLine};
use crate::plugin::{OpenConnect, PluginKey, Registry};

/// Alternative reported where a quoted identifier was expected.
pub const IDENTIFIER: &str = "<identifier>";

const OUTPUT_CLAUSE: [&str; 3] = ["and", "output", "into"];

/// Match one token line against the registry.
pub fn match_line(registry: &Registry, line: &TokenLine) -> Cst {
    let mut structural = Vec::new();
    let phase = check_phase(line, &mut structural);
    check_subject(line, &mut structural);

    let mut best = usize::MAX;
    let mut candidates: Vec<Candidate> = Vec::new();

    for key in registry.keys() {
        let candidate = match Walker::new(line, best).walk(key) {
            Ok(candidate) => candidate,
            Err(Pruned) => {
                trace!(line = line.line, key = %key, "candidate pruned");
                continue;
            }
        };

        let score = candidate.errors.len();
        match score.cmp(&best) {
            Ordering::Less => {
                best = score;
                candidates.clear();
                candidates.push(candidate);
            }
            Ordering::Equal => candidates.push(candidate),
            Ordering::Greater => {}
        }
    }

    Cst {
        line: line.line,
        phase,
        structural,
        candidates,
    }
}

fn check_phase(line: &TokenLine, errors: &mut Vec<ParseError>) -> Option<Phase> {
    let expected = || vec!["given".to_string(), "then".to_string()];
    match line.get(0) {
        Some(t) if t.is_word("given") => Some(Phase::Given),
        Some(t) if t.is_word("then") => Some(Phase::Then),
        Some(t) => {
            errors.push(ParseError::Wrong {
                token: t.clone(),
                expected: expected(),
            });
            None
        }
        None => {
            errors.push(ParseError::Missing {
                expected: expected(),
                line: line.line,
                column: 0,
            });
            None
        }
    }
}

fn check_subject(line: &TokenLine, errors: &mut Vec<ParseError>) {
    match line.get(1) {
        Some(t) if t.raw == "I" => {}
        Some(t) => errors.push(ParseError::Wrong {
            token: t.clone(),
            expected: vec!["I".to_string()],
        }),
        None => errors.push(ParseError::Missing {
            expected: vec!["I".to_string()],
            line: line.line,
            column: end_column(line),
        }),
    }
}

/// Column where a missing word would go: one space past the last token.
fn end_column(line: &TokenLine) -> usize {
    line.tokens.last().map(|t| t.end + 1).unwrap_or(0)
}

// ──────────────────────────────────────────────
// Walker
// ──────────────────────────────────────────────

/// The candidate's error count exceeded the best score so far.
#[derive(Debug)]
struct Pruned;

struct Walker<'a> {
    line: &'a TokenLine,
    pos: usize,
    bound: usize,
    errors: Vec<ParseError>,
}

impl<'a> Walker<'a> {
    fn new(line: &'a TokenLine, bound: usize) -> Self {
        Walker {
            line,
            pos: 2.min(line.len()),
            bound,
            errors: Vec::new(),
        }
    }

    fn walk(mut self, key: &PluginKey) -> Result<Candidate, Pruned> {
        let open_connect = match key.open_connect {
            OpenConnect::None => None,
            OpenConnect::Open => {
                self.expect_word("open")?;
                let target = self.expect_ident()?;
                self.expect_word("and")?;
                target
            }
            OpenConnect::Connect => {
                self.expect_word("connect")?;
                self.expect_word("to")?;
                let target = self.expect_ident()?;
                self.expect_word("and")?;
                target
            }
        };

        let mut bindings = Vec::new();
        let mut remaining = key.params.clone();
        for _ in 0..key.params.len() {
            self.expect_word("send")?;
            let name = self.expect_param(&mut remaining)?;
            let value = self.expect_ident()?;
            self.expect_word("and")?;
            if let (Some(name), Some(value)) = (name, value) {
                bindings.push((name, value));
            }
        }

        for word in &key.phrase {
            self.expect_word(word)?;
        }

        let output = self.trailing()?;

        Ok(Candidate {
            key: key.clone(),
            bindings,
            open_connect,
            output,
            errors: self.errors,
        })
    }

    fn record(&mut self, error: ParseError) -> Result<(), Pruned> {
        self.errors.push(error);
        if self.errors.len() > self.bound {
            Err(Pruned)
        } else {
            Ok(())
        }
    }

    fn missing(&self, expected: Vec<String>) -> ParseError {
        ParseError::Missing {
            expected,
            line: self.line.line,
            column: end_column(self.line),
        }
    }

    fn next(&mut self) -> Option<&'a Token> {
        let line: &'a TokenLine = self.line;
        let token = line.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn expect_word(&mut self, word: &str) -> Result<(), Pruned> {
        match self.next() {
            Some(t) if t.is_word(word) => Ok(()),
            Some(t) => self.record(ParseError::Wrong {
                token: t.clone(),
                expected: vec![word.to_string()],
            }),
            None => {
                let err = self.missing(vec![word.to_string()]);
                self.record(err)
            }
        }
    }

    fn expect_ident(&mut self) -> Result<Option<Token>, Pruned> {
        match self.next() {
            Some(t) if t.is_ident() => Ok(Some(t.clone())),
            Some(t) => {
                self.record(ParseError::Wrong {
                    token: t.clone(),
                    expected: vec![IDENTIFIER.to_string()],
                })?;
                Ok(None)
            }
            None => {
                let err = self.missing(vec![IDENTIFIER.to_string()]);
                self.record(err)?;
                Ok(None)
            }
        }
    }

    /// Any not yet consumed parameter name is accepted here; a name outside
    /// the remaining set (unknown or already sent) is an error.
    fn expect_param(&mut self, remaining: &mut BTreeSet<String>) -> Result<Option<String>, Pruned> {
        match self.next() {
            Some(t) if !t.is_ident() && remaining.contains(&t.name) => {
                remaining.remove(&t.name);
                Ok(Some(t.name.clone()))
            }
            Some(t) => {
                let err = ParseError::Wrong {
                    token: t.clone(),
                    expected: remaining.iter().cloned().collect(),
                };
                self.record(err)?;
                Ok(None)
            }
            None => {
                let err = self.missing(remaining.iter().cloned().collect());
                self.record(err)?;
                Ok(None)
            }
        }
    }

    /// Everything after the phrase: an optional `and output into '<ident>'`
    /// clause at the very end, anything else is extra.
    fn trailing(&mut self) -> Result<Option<Token>, Pruned> {
        let line: &'a TokenLine = self.line;
        let rest = &line.tokens[self.pos..];
        self.pos = line.len();

        let clause_len = OUTPUT_CLAUSE.len() + 1;
        let output = match rest.last() {
            Some(last) if rest.len() >= clause_len && last.is_ident() => last,
            _ => {
                for token in rest {
                    self.record(ParseError::Extra {
                        token: token.clone(),
                    })?;
                }
                return Ok(None);
            }
        };

        let clause_start = rest.len() - clause_len;
        for token in &rest[..clause_start] {
            self.record(ParseError::Extra {
                token: token.clone(),
            })?;
        }
        for (token, word) in rest[clause_start..].iter().zip(OUTPUT_CLAUSE) {
            if !token.is_word(word) {
                self.record(ParseError::Wrong {
                    token: token.clone(),
                    expected: vec![word.to_string()],
                })?;
            }
        }
        Ok(Some(output.clone()))
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionContext;
    use crate::lexer::tokenize;
    use crate::plugin::{Plugin, PluginResult};

    async fn noop(ctx: ExecutionContext) -> PluginResult {
        ctx.pass(serde_json::Value::Null)
    }

    fn registry(shapes: &[(OpenConnect, &[&str], &str)]) -> Registry {
        let mut plugin = Plugin::new("test");
        for (mode, params, phrase) in shapes {
            plugin.register(*mode, params, phrase, noop).unwrap();
        }
        Registry::from_plugins([plugin]).unwrap()
    }

    fn cst(registry: &Registry, src: &str) -> Cst {
        match_line(registry, &tokenize(src, 1).unwrap())
    }

    fn love_asche() -> Registry {
        registry(&[(OpenConnect::None, &[], "love asche")])
    }

    #[test]
    fn exact_match_has_no_errors() {
        let cst = cst(&love_asche(), "Given I love Asche");
        assert!(cst.is_match());
        assert_eq!(cst.phase, Some(Phase::Given));
        assert_eq!(cst.candidates.len(), 1);
        assert!(cst.candidates[0].errors.is_empty());
        assert_eq!(cst.candidates[0].key.phrase(), "love asche");
    }

    #[test]
    fn wrong_word_suggests_phrase_word() {
        let cst = cst(&love_asche(), "Then I Like Asche");
        assert_eq!(cst.phase, Some(Phase::Then));
        assert_eq!(cst.candidates.len(), 1);
        match cst.candidates[0].errors.as_slice() {
            [ParseError::Wrong { token, expected }] => {
                assert_eq!(token.raw, "Like");
                assert_eq!(expected, &vec!["love".to_string()]);
            }
            other => panic!("unexpected errors: {:?}", other),
        }
    }

    #[test]
    fn open_clause_captures_target() {
        let reg = registry(&[(OpenConnect::Open, &[], "write file")]);
        let cst = cst(&reg, "Given I open 'xfiles' and write file");
        assert!(cst.is_match());
        let candidate = &cst.candidates[0];
        assert_eq!(candidate.open_connect.as_ref().unwrap().raw, "'xfiles'");
    }

    #[test]
    fn connect_clause_requires_to() {
        let reg = registry(&[(OpenConnect::Connect, &[], "get")]);
        let cst = cst(&reg, "Given I connect 'url' and get");
        assert!(!cst.is_match());
        // 'url' read where `to` was expected, `and` where the identifier was,
        // `get` where `and` was; then the phrase word is missing.
        assert_eq!(cst.candidates[0].errors.len(), 4);
    }

    #[test]
    fn params_are_order_independent() {
        let reg = registry(&[(OpenConnect::None, &["foo", "bar"], "testing params order")]);
        let a = cst(
            &reg,
            "Given I send bar 'b1' and send foo 'f1' and testing params order",
        );
        let b = cst(
            &reg,
            "Given I send foo 'f1' and send bar 'b1' and testing params order",
        );
        assert!(a.is_match() && b.is_match());

        let names = |c: &Cst| {
            let mut v: Vec<(String, String)> = c.candidates[0]
                .bindings
                .iter()
                .map(|(n, t)| (n.clone(), t.raw.clone()))
                .collect();
            v.sort();
            v
        };
        assert_eq!(names(&a), names(&b));
        assert_eq!(
            names(&a),
            vec![
                ("bar".to_string(), "'b1'".to_string()),
                ("foo".to_string(), "'f1'".to_string())
            ]
        );
    }

    #[test]
    fn repeated_param_is_an_error() {
        let reg = registry(&[(OpenConnect::None, &["foo", "bar"], "go")]);
        let cst = cst(&reg, "Given I send foo 'a' and send foo 'b' and go");
        let errors = &cst.candidates[0].errors;
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            ParseError::Wrong { token, expected } => {
                assert_eq!(token.raw, "foo");
                assert_eq!(token.start, 30);
                assert_eq!(expected, &vec!["bar".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(cst.candidates[0].bindings.len(), 1);
    }

    #[test]
    fn undeclared_param_is_an_error() {
        let reg = registry(&[(OpenConnect::None, &["foo"], "go")]);
        let cst = cst(&reg, "Given I send baz 'x' and go");
        assert!(!cst.is_match());
        let errors = &cst.candidates[0].errors;
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            ParseError::Wrong { token, expected } => {
                assert_eq!(token.raw, "baz");
                assert_eq!(token.start, 13);
                assert_eq!(expected, &vec!["foo".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(cst.candidates[0].bindings.is_empty());
    }

    #[test]
    fn ties_keep_every_minimal_candidate() {
        let reg = registry(&[
            (OpenConnect::None, &[], "a b c"),
            (OpenConnect::None, &[], "domates biber patlican"),
        ]);
        let cst = cst(&reg, "then I domates b patates");
        assert_eq!(cst.candidates.len(), 2);
        for candidate in &cst.candidates {
            assert_eq!(candidate.errors.len(), 2);
        }
        assert_eq!(cst.candidates[0].key.phrase(), "a b c");
    }

    #[test]
    fn only_the_global_minimum_survives() {
        let reg = registry(&[
            (OpenConnect::None, &[], "one two three four"),
            (OpenConnect::None, &[], "one two"),
            (OpenConnect::None, &[], "five six seven"),
        ]);
        let cst = cst(&reg, "Given I one two");
        assert_eq!(cst.candidates.len(), 1);
        assert_eq!(cst.candidates[0].key.phrase(), "one two");
        assert!(cst.candidates[0].errors.is_empty());
    }

    #[test]
    fn pruned_candidate_does_not_pile_errors() {
        let reg = registry(&[
            (OpenConnect::None, &[], "x"),
            (OpenConnect::None, &[], "p q r s t"),
        ]);
        let cst = cst(&reg, "Given I x");
        assert_eq!(cst.candidates.len(), 1);
        assert_eq!(cst.candidates[0].key.phrase(), "x");
    }

    #[test]
    fn output_clause_is_captured() {
        let cst = cst(&love_asche(), "Given I love Asche and output into 'foo'");
        assert!(cst.is_match());
        assert_eq!(cst.candidates[0].output.as_ref().unwrap().raw, "'foo'");
    }

    #[test]
    fn misspelt_output_clause_is_wrong() {
        let cst = cst(&love_asche(), "Given I love Asche and outptu into 'foo'");
        match cst.candidates[0].errors.as_slice() {
            [ParseError::Wrong { token, expected }] => {
                assert_eq!(token.raw, "outptu");
                assert_eq!(expected, &vec!["output".to_string()]);
            }
            other => panic!("unexpected errors: {:?}", other),
        }
    }

    #[test]
    fn leftovers_before_output_clause_are_extra() {
        let cst = cst(&love_asche(), "Given I love Asche much and output into 'foo'");
        match cst.candidates[0].errors.as_slice() {
            [ParseError::Extra { token }] => assert_eq!(token.raw, "much"),
            other => panic!("unexpected errors: {:?}", other),
        }
    }

    #[test]
    fn short_tail_is_extra() {
        let cst = cst(&love_asche(), "Given I love Asche 'foo'");
        assert!(matches!(
            cst.candidates[0].errors.as_slice(),
            [ParseError::Extra { .. }]
        ));
    }

    #[test]
    fn missing_words_point_past_the_line() {
        let cst = cst(&love_asche(), "Given I love");
        match cst.candidates[0].errors.as_slice() {
            [ParseError::Missing {
                expected, column, ..
            }] => {
                assert_eq!(expected, &vec!["asche".to_string()]);
                assert_eq!(*column, 13);
            }
            other => panic!("unexpected errors: {:?}", other),
        }
    }

    #[test]
    fn structural_errors_are_independent() {
        let cst = cst(&love_asche(), "When i love asche");
        assert!(!cst.is_match());
        assert_eq!(cst.phase, None);
        assert_eq!(cst.structural.len(), 2);
        assert!(cst.candidates[0].errors.is_empty());
    }

    #[test]
    fn empty_line_misses_everything() {
        let cst = cst(&love_asche(), "");
        assert_eq!(cst.structural.len(), 2);
        assert!(matches!(
            cst.structural[0],
            ParseError::Missing { column: 0, .. }
        ));
    }

    #[test]
    fn empty_registry_has_no_candidates() {
        let cst = cst(&Registry::empty(), "Given I love Asche");
        assert!(cst.candidates.is_empty());
        assert!(!cst.is_match());
    }
}
