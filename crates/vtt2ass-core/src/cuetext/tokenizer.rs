//! Cue Text Tokenizer
//!
//! Splits raw cue text into text runs, start tags, end tags and
//! timestamp tags. Character references are resolved while reading text.

use tracing::warn;

/// A token of cue text
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Text(String),
    StartTag {
        name: String,
        classes: Vec<String>,
        annotation: String,
    },
    EndTag(String),
    /// Raw contents of a `<hh:mm:ss.mmm>` tag
    Timestamp(String),
}

/// Tokenizes a cue payload
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut rest = input;

    while let Some(c) = rest.chars().next() {
        match c {
            '<' => {
                if !text.is_empty() {
                    tokens.push(Token::Text(std::mem::take(&mut text)));
                }
                let body_end = rest.find('>').unwrap_or(rest.len());
                let body = &rest[1..body_end];
                if let Some(token) = read_tag(body) {
                    tokens.push(token);
                }
                rest = rest.get(body_end + 1..).unwrap_or("");
            }
            '&' => {
                let (consumed, resolved) = read_reference(rest);
                text.push_str(&resolved);
                rest = &rest[consumed..];
            }
            _ => {
                text.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }

    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    tokens
}

fn read_tag(body: &str) -> Option<Token> {
    if let Some(end) = body.strip_prefix('/') {
        let name = end
            .split(|c: char| c == '.' || c.is_whitespace())
            .next()
            .unwrap_or("");
        return Some(Token::EndTag(name.to_string()));
    }

    if body.starts_with(|c: char| c.is_ascii_digit()) {
        return Some(Token::Timestamp(body.trim().to_string()));
    }

    let (head, annotation) = match body.find(char::is_whitespace) {
        Some(pos) => (&body[..pos], &body[pos..]),
        None => (body, ""),
    };

    let mut parts = head.split('.');
    let name = parts.next().unwrap_or("");
    if name.is_empty() {
        return None;
    }
    let classes = parts
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();

    Some(Token::StartTag {
        name: name.to_string(),
        classes,
        annotation: annotation.split_whitespace().collect::<Vec<_>>().join(" "),
    })
}

/// Resolves a character reference at the start of `input` (which begins
/// with `&`). Returns the number of bytes consumed and the replacement.
fn read_reference(input: &str) -> (usize, String) {
    let name_len = input[1..]
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(input.len() - 1);
    let name = &input[1..1 + name_len];
    let terminated = input[1 + name_len..].starts_with(';');

    if !terminated || name.is_empty() {
        return (1, "&".to_string());
    }

    let replacement = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "nbsp" => "\u{a0}",
        "quot" => "\"",
        "apos" => "'",
        // Bidi marks carry no glyphs; reordering is not performed
        "lrm" | "rlm" => "",
        _ => {
            warn!("Unknown character reference '&{};', keeping it literally", name);
            return (1, "&".to_string());
        }
    };

    (name_len + 2, replacement.to_string())
}
