//! Splits a template into literal text and placeholder spans.
//!
//! Anything that does not form a complete placeholder (unterminated openers,
//! braces around text without a known namespace) stays literal. A span that
//! starts with a known namespace and has a closing brace is always a
//! placeholder, even if a quote inside it is left open; the parser then
//! reports the unterminated argument.

use crate::config::Delimiter;
use crate::expression::{is_expression, opens_quote};

const CLOSER: char = '}';
const ESCAPE: char = '\\';

/// One piece of a scanned template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    /// Text copied to the output unchanged.
    Literal(&'a str),
    /// A placeholder; `raw` includes the delimiters, `content` excludes them.
    Placeholder { raw: &'a str, content: &'a str },
}

/// Tokenizes `template` left to right.
pub(crate) fn scan(template: &str, delimiter: Delimiter) -> Vec<Token<'_>> {
    let opener = delimiter.opener();
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut pos = 0;

    while let Some(found) = template[pos..].find(opener) {
        let start = pos + found;
        let content_start = start + opener.len();

        if template[..start].ends_with(ESCAPE) {
            push_literal(&mut tokens, &template[literal_start..start - ESCAPE.len_utf8()]);
            literal_start = start;
            pos = content_start;
            continue;
        }

        let rest = &template[content_start..];
        let close = if is_expression(rest) {
            find_close(rest).or_else(|| rest.find(CLOSER))
        } else {
            None
        };
        match close {
            Some(len) => {
                let end = content_start + len;
                push_literal(&mut tokens, &template[literal_start..start]);
                tokens.push(Token::Placeholder {
                    raw: &template[start..end + CLOSER.len_utf8()],
                    content: &template[content_start..end],
                });
                pos = end + CLOSER.len_utf8();
                literal_start = pos;
            }
            None => pos = content_start,
        }
    }

    push_literal(&mut tokens, &template[literal_start..]);
    tokens
}

fn push_literal<'a>(tokens: &mut Vec<Token<'a>>, text: &'a str) {
    if !text.is_empty() {
        tokens.push(Token::Literal(text));
    }
}

/// Byte offset of the closing brace, skipping quoted text and escapes.
fn find_close(content: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut prev = None;

    for (i, c) in content.char_indices() {
        if escaped {
            escaped = false;
        } else {
            match quote {
                Some(q) if c == q => quote = None,
                _ if c == ESCAPE => escaped = true,
                Some(_) => {}
                None if c == CLOSER => return Some(i),
                None if opens_quote(prev, c) => quote = Some(c),
                None => {}
            }
        }
        prev = Some(c);
    }
    None
}
