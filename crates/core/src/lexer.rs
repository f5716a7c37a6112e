use crate::error::LexError;

/// A single whitespace-delimited word or quoted identifier of a statement line.
///
/// `start` and `end` are half-open character offsets within the source line.
/// Quoted identifiers keep their surrounding quotes in `raw`; the visitor
/// strips them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lower-cased form of `raw`, used for case-insensitive comparisons.
    pub name: String,
    pub raw: String,
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(raw: impl Into<String>, line: usize, start: usize, end: usize) -> Self {
        let raw = raw.into();
        Token {
            name: raw.to_lowercase(),
            raw,
            line,
            start,
            end,
        }
    }

    /// Quoted identifiers are the only tokens starting with a single quote.
    pub fn is_ident(&self) -> bool {
        self.raw.starts_with('\'')
    }

    /// Case-insensitive comparison against a lower-case keyword.
    pub fn is_word(&self, word: &str) -> bool {
        !self.is_ident() && self.name == word
    }
}

/// The tokens of one line together with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenLine {
    pub tokens: Vec<Token>,
    pub line: usize,
}

impl TokenLine {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }
}

/// Split one statement line into tokens.
///
/// Whitespace separates tokens except inside single-quoted spans. Inside a
/// quote a backslash always consumes the following character, so `\'` never
/// closes the span. An unclosed quote fails with a [`LexError`] spanning from
/// the opening quote to the end of the line.
pub fn tokenize(src: &str, line: usize) -> Result<TokenLine, LexError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0usize;

    while pos < chars.len() {
        let c = chars[pos];

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;

        // Quoted identifier
        if c == '\'' {
            pos += 1;
            let mut closed = false;
            while pos < chars.len() {
                match chars[pos] {
                    '\\' => pos += 2,
                    '\'' => {
                        pos += 1;
                        closed = true;
                        break;
                    }
                    _ => pos += 1,
                }
            }
            let end = pos.min(chars.len());
            let raw: String = chars[start..end].iter().collect();
            if !closed {
                return Err(LexError::UnclosedQuote {
                    token: Token::new(raw, line, start, end),
                });
            }
            tokens.push(Token::new(raw, line, start, end));
            continue;
        }

        // Plain word
        while pos < chars.len() && !chars[pos].is_whitespace() {
            pos += 1;
        }
        let raw: String = chars[start..pos].iter().collect();
        tokens.push(Token::new(raw, line, start, pos));
    }

    Ok(TokenLine { tokens, line })
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
