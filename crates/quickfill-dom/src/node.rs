use slotmap::new_key_type;
use std::collections::BTreeMap;

new_key_type! {
    /// Identity of one node in a host document.
    ///
    /// Ids are never reused while the node is alive; a node removed from the
    /// document simply stops resolving, which callers treat as "gone".
    pub struct NodeId;
}

/// Screen-space rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Bottom edge, the usual anchor for placing things under a caret.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Payload of one document node.
#[derive(Debug, Clone)]
pub enum NodeData {
    Element {
        /// Lowercase tag name.
        tag: String,
        attributes: BTreeMap<String, String>,
        children: Vec<NodeId>,
    },
    Text(String),
}

impl NodeData {
    pub fn element(tag: &str) -> Self {
        NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn text(content: &str) -> Self {
        NodeData::Text(content.to_string())
    }

    pub fn is_text(&self) -> bool {
        matches!(self, NodeData::Text(_))
    }
}
