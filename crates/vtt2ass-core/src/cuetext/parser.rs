//! Cue Text Tree Builder
//!
//! Turns the token stream into a [`CueText`] arena following the WebVTT
//! cue text parsing rules: unknown tags are dropped (their content stays
//! in the current node), `<rt>` only opens inside `<ruby>`, and `</ruby>`
//! closes an open `<rt>` as well.

use tracing::debug;

use super::node::{CueText, NodeId, NodeKind};
use super::tokenizer::{tokenize, Token};
use crate::captions::parse_timestamp_ms;

/// Parses a cue payload into its rich-text tree
pub fn parse_cue_text(input: &str) -> CueText {
    let mut tree = CueText::new();
    let mut current = tree.root();

    for token in tokenize(input) {
        match token {
            Token::Text(text) => {
                tree.append(current, NodeKind::Text(text), Vec::new());
            }
            Token::StartTag {
                name,
                classes,
                annotation,
            } => {
                let kind = match name.as_str() {
                    "c" => NodeKind::Class,
                    "i" => NodeKind::Italic,
                    "b" => NodeKind::Bold,
                    "u" => NodeKind::Underline,
                    "ruby" => NodeKind::Ruby,
                    "rt" if matches!(tree.kind(current), NodeKind::Ruby) => NodeKind::RubyText,
                    "v" => NodeKind::Voice { name: annotation },
                    other => {
                        debug!("Ignoring unsupported cue text tag <{}>", other);
                        continue;
                    }
                };
                current = tree.append(current, kind, classes);
            }
            Token::EndTag(name) => {
                current = close_tag(&tree, current, &name);
            }
            Token::Timestamp(raw) => match parse_timestamp_ms(&raw) {
                Ok(ms) => {
                    tree.append(current, NodeKind::Timestamp(ms), Vec::new());
                }
                Err(_) => debug!("Ignoring malformed timestamp tag <{}>", raw),
            },
        }
    }

    tree
}

fn close_tag(tree: &CueText, current: NodeId, name: &str) -> NodeId {
    let kind = tree.kind(current);
    if kind.tag_name() == Some(name) {
        return tree.parent(current).unwrap_or(current);
    }

    if name == "ruby" && matches!(kind, NodeKind::RubyText) {
        // </ruby> inside <rt>: close both
        let ruby = tree.parent(current).unwrap_or(current);
        return tree.parent(ruby).unwrap_or(ruby);
    }

    debug!("Ignoring unmatched end tag </{}>", name);
    current
}
