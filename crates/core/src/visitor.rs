//! Candidate (CST) to statement (AST).

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::ast::{Candidate, Statement};
use crate::error::VisitError;

/// Turn an error-free candidate into a [`Statement`].
///
/// Captured identifiers are unquoted and their escapes decoded; the phrase is
/// the key's words joined by single spaces.
pub fn visit(candidate: Candidate) -> Result<Statement, VisitError> {
    let Candidate {
        key,
        bindings: captured,
        open_connect,
        output,
        errors,
    } = candidate;

    if !errors.is_empty() {
        return Err(VisitError::Unresolved {
            phrase: key.phrase(),
            errors: errors.len(),
        });
    }

    let mut bindings = BTreeMap::new();
    for (name, token) in captured {
        match bindings.entry(name) {
            Entry::Occupied(e) => return Err(VisitError::KeyExists(e.key().clone())),
            Entry::Vacant(e) => {
                e.insert(unquote(&token.raw));
            }
        }
    }

    Ok(Statement {
        mode: key.open_connect,
        open_connect: open_connect.map(|t| unquote(&t.raw)),
        bindings,
        phrase: key.phrase(),
        output: output.map(|t| unquote(&t.raw)),
    })
}

/// Strip the surrounding single quotes and decode escapes. Unknown escapes
/// and malformed `\u` sequences are kept verbatim.
pub fn unquote(raw: &str) -> String {
    let inner = raw
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(raw);

    let chars: Vec<char> = inner.chars().collect();
    let mut out = String::with_capacity(inner.len());
    let mut pos = 0usize;
    while pos < chars.len() {
        let c = chars[pos];
        if c != '\\' || pos + 1 >= chars.len() {
            out.push(c);
            pos += 1;
            continue;
        }
        let escaped = chars[pos + 1];
        pos += 2;
        match escaped {
            '\'' => out.push('\''),
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            '/' => out.push('/'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{0008}'),
            'f' => out.push('\u{000C}'),
            'u' => {
                let hex: String = chars[pos..chars.len().min(pos + 4)].iter().collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => {
                        out.push(decoded);
                        pos += 4;
                    }
                    _ => out.push_str("\\u"),
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
