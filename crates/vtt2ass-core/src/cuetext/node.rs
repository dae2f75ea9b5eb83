//! Cue Text Tree
//!
//! The rich-text tree of a cue, stored as an index-addressed arena.
//! Children are ordered index lists and every node keeps the index of its
//! parent, so walking up to an ancestor is O(1) without shared ownership.

use serde::{Deserialize, Serialize};

use crate::TimeMs;

/// Index of a node inside its [`CueText`] arena
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Node variants of the cue text tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum NodeKind {
    Root,
    /// `<c>`
    Class,
    /// `<i>`
    Italic,
    /// `<b>`
    Bold,
    /// `<u>`
    Underline,
    /// `<v name>`
    Voice { name: String },
    /// `<ruby>`
    Ruby,
    /// `<rt>`
    RubyText,
    Text(String),
    /// `<00:00:01.000>`
    Timestamp(TimeMs),
}

impl NodeKind {
    /// Tag name that opens and closes this node in cue text
    pub fn tag_name(&self) -> Option<&'static str> {
        match self {
            Self::Class => Some("c"),
            Self::Italic => Some("i"),
            Self::Bold => Some("b"),
            Self::Underline => Some("u"),
            Self::Voice { .. } => Some("v"),
            Self::Ruby => Some("ruby"),
            Self::RubyText => Some("rt"),
            Self::Root | Self::Text(_) | Self::Timestamp(_) => None,
        }
    }

    /// Leaves carry content; every other node may carry style
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Text(_) | Self::Timestamp(_))
    }
}

/// One node of the arena
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    pub parent: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
}

/// Rich-text tree of one cue; node 0 is always the root
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CueText {
    nodes: Vec<Node>,
}

impl Default for CueText {
    fn default() -> Self {
        Self::new()
    }
}

impl CueText {
    /// Creates a tree holding only the root node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                classes: Vec::new(),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Builds a tree with a single text child
    pub fn from_plain(text: &str) -> Self {
        let mut tree = Self::new();
        if !text.is_empty() {
            tree.append(tree.root(), NodeKind::Text(text.to_string()), Vec::new());
        }
        tree
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Returns the node for an id issued by this arena.
    ///
    /// Panics on an id from a different tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn parent_kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.parent(id).map(|p| self.kind(p))
    }

    /// Iterates from the parent of `id` up to the root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Finds the closest `<rt>` ancestor, if any
    pub fn enclosing_ruby_text(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .find(|&a| matches!(self.kind(a), NodeKind::RubyText))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree has no content below the root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Appends a child to `parent` and returns its id
    pub fn append(&mut self, parent: NodeId, kind: NodeKind, classes: Vec<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            classes,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Base text of the cue with ruby annotations left out
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(self.root(), &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::RubyText | NodeKind::Timestamp(_) => {}
            _ => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Number of display lines (one more than the number of newlines in
    /// base text)
    pub fn line_count(&self) -> usize {
        1 + self.plain_text().matches('\n').count()
    }

    fn fmt_node(&self, id: NodeId, depth: usize, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let node = self.node(id);
        write!(f, "{:indent$}", "", indent = depth * 2)?;
        match &node.kind {
            NodeKind::Text(text) => writeln!(f, "Text {:?}", text)?,
            NodeKind::Timestamp(ms) => writeln!(f, "Timestamp {}ms", ms)?,
            NodeKind::Voice { name } => writeln!(f, "Voice {:?} {:?}", name, node.classes)?,
            other => writeln!(f, "{:?} {:?}", other, node.classes)?,
        }
        for &child in &node.children {
            self.fmt_node(child, depth + 1, f)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for CueText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.fmt_node(self.root(), 0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ruby_tree() -> (CueText, NodeId) {
        let mut tree = CueText::new();
        let root = tree.root();
        tree.append(root, NodeKind::Text("a ".into()), Vec::new());
        let ruby = tree.append(root, NodeKind::Ruby, Vec::new());
        tree.append(ruby, NodeKind::Text("漢".into()), Vec::new());
        let rt = tree.append(ruby, NodeKind::RubyText, Vec::new());
        let kana = tree.append(rt, NodeKind::Text("かん".into()), Vec::new());
        tree.append(root, NodeKind::Text("\nb".into()), Vec::new());
        (tree, kana)
    }

    #[test]
    fn test_parent_links() {
        let (tree, kana) = ruby_tree();
        assert_eq!(tree.parent_kind(kana), Some(&NodeKind::RubyText));
        let chain: Vec<_> = tree.ancestors(kana).collect();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.last(), Some(&tree.root()));
        assert!(tree.enclosing_ruby_text(kana).is_some());
    }

    #[test]
    fn test_plain_text_skips_ruby_text() {
        let (tree, _) = ruby_tree();
        assert_eq!(tree.plain_text(), "a 漢\nb");
        assert_eq!(tree.line_count(), 2);
    }

    #[test]
    fn test_empty_tree() {
        let tree = CueText::new();
        assert!(tree.is_empty());
        assert_eq!(tree.plain_text(), "");
        assert!(CueText::from_plain("").is_empty());
        assert!(!CueText::from_plain("x").is_empty());
    }

    #[test]
    fn test_display_indents_children() {
        let (tree, _) = ruby_tree();
        let dump = tree.to_string();
        assert!(dump.starts_with("Root []\n"));
        assert!(dump.contains("    Text \"かん\""));
    }
}
