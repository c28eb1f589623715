//! Inline emphasis parsing.
//!
//! Recognises `**bold**`, `_italic_` and `*italic*`. Bold and italic are
//! tracked as independent flags, so they nest in either order. Markers that
//! cannot be paired are kept as literal text: the parser never fails, it only
//! ever produces less formatting than intended.

use crate::model::InlineRun;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Bold,
    ItalicStar,
    ItalicUnderscore,
}

impl Marker {
    fn literal(self) -> &'static str {
        match self {
            Marker::Bold => "**",
            Marker::ItalicStar => "*",
            Marker::ItalicUnderscore => "_",
        }
    }

    fn is_bold(self) -> bool {
        matches!(self, Marker::Bold)
    }
}

#[derive(Debug)]
enum Token {
    Text(String),
    Delim {
        marker: Marker,
        can_open: bool,
        can_close: bool,
    },
}

/// Resolved role of each token after pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Literal,
    Open,
    Close,
}

/// Parse a line's text into emphasis runs.
///
/// The concatenated run texts equal the input with the paired markers
/// removed. Adjacent runs with identical emphasis are merged.
pub fn parse_inline(text: &str) -> Vec<InlineRun> {
    let tokens = tokenize(text);
    let roles = pair_delimiters(&tokens);
    build_runs(&tokens, &roles)
}

fn tokenize(text: &str) -> Vec<Token> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut buf = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let prev = if i == 0 { None } else { Some(chars[i - 1]) };
        let stars = chars[i..].iter().take_while(|&&ch| ch == '*').count();
        let (marker, len) = match c {
            // `***` closes as italic then bold so the innermost opener pairs first.
            '*' if stars == 3 && prev.is_some_and(|p| !p.is_whitespace()) => {
                (Marker::ItalicStar, 1)
            }
            '*' if stars >= 2 => (Marker::Bold, 2),
            '*' => (Marker::ItalicStar, 1),
            '_' => (Marker::ItalicUnderscore, 1),
            _ => {
                buf.push(c);
                i += 1;
                continue;
            }
        };

        let next = chars.get(i + len).copied();

        let mut can_open = next.is_some_and(|n| !n.is_whitespace());
        let mut can_close = prev.is_some_and(|p| !p.is_whitespace());

        // Underscores inside words (snake_case) are never emphasis.
        if marker == Marker::ItalicUnderscore {
            can_open &= !prev.is_some_and(char::is_alphanumeric);
            can_close &= !next.is_some_and(char::is_alphanumeric);
        }

        if !buf.is_empty() {
            tokens.push(Token::Text(std::mem::take(&mut buf)));
        }
        tokens.push(Token::Delim {
            marker,
            can_open,
            can_close,
        });
        i += len;
    }

    if !buf.is_empty() {
        tokens.push(Token::Text(buf));
    }
    tokens
}

fn pair_delimiters(tokens: &[Token]) -> Vec<Role> {
    let mut roles = vec![Role::Literal; tokens.len()];
    let mut openers: Vec<(usize, Marker)> = Vec::new();

    for (idx, token) in tokens.iter().enumerate() {
        let Token::Delim {
            marker,
            can_open,
            can_close,
        } = *token
        else {
            continue;
        };

        if can_close {
            let found = openers
                .iter()
                .rposition(|&(open_idx, m)| m == marker && idx > open_idx + 1);
            if let Some(pos) = found {
                let (open_idx, _) = openers[pos];
                roles[open_idx] = Role::Open;
                roles[idx] = Role::Close;
                // Openers between the pair can no longer be closed cleanly.
                openers.truncate(pos);
                continue;
            }
        }

        if can_open {
            openers.push((idx, marker));
        }
    }

    roles
}

fn build_runs(tokens: &[Token], roles: &[Role]) -> Vec<InlineRun> {
    let mut runs: Vec<InlineRun> = Vec::new();
    let mut bold_depth = 0usize;
    let mut italic_depth = 0usize;

    for (token, role) in tokens.iter().zip(roles) {
        let piece = match (token, role) {
            (Token::Text(text), _) => text.as_str(),
            (Token::Delim { marker, .. }, Role::Literal) => marker.literal(),
            (Token::Delim { marker, .. }, Role::Open) => {
                if marker.is_bold() {
                    bold_depth += 1;
                } else {
                    italic_depth += 1;
                }
                continue;
            }
            (Token::Delim { marker, .. }, Role::Close) => {
                if marker.is_bold() {
                    bold_depth = bold_depth.saturating_sub(1);
                } else {
                    italic_depth = italic_depth.saturating_sub(1);
                }
                continue;
            }
        };

        let bold = bold_depth > 0;
        let italic = italic_depth > 0;
        match runs.last_mut() {
            Some(last) if last.bold == bold && last.italic == italic => last.text.push_str(piece),
            _ => runs.push(InlineRun::styled(piece, bold, italic)),
        }
    }

    runs
}
