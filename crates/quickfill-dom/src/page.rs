use crate::document::{Document, SyntheticEvent};
use crate::error::SelectorError;
use crate::node::{NodeData, NodeId, Rect};
use crate::selector::{AttrOp, Selector, SelectorPart};
use slotmap::{SecondaryMap, SlotMap};

struct NodeEntry {
    data: NodeData,
    parent: Option<NodeId>,
}

/// In-memory [`Document`] implementation.
///
/// Backs every test in the workspace and doubles as a headless host for
/// embedding the engine outside a browser. Geometry is not computed from
/// layout (there is none); tests inject the rects they need.
pub struct MemoryPage {
    nodes: SlotMap<NodeId, NodeEntry>,
    values: SecondaryMap<NodeId, String>,
    rects: SecondaryMap<NodeId, Rect>,
    body: NodeId,
    focused: Option<NodeId>,
    caret: Option<(NodeId, usize)>,
    caret_rect: Option<Rect>,
    events: Vec<(NodeId, SyntheticEvent)>,
}

impl MemoryPage {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let body = nodes.insert(NodeEntry {
            data: NodeData::element("body"),
            parent: None,
        });
        MemoryPage {
            nodes,
            values: SecondaryMap::new(),
            rects: SecondaryMap::new(),
            body,
            focused: None,
            caret: None,
            caret_rect: None,
            events: Vec::new(),
        }
    }

    /// Creates an element with the given attributes and appends it to `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let node = self.create_element(tag);
        for (name, value) in attrs {
            self.set_attribute(node, name, value);
        }
        self.append_child(parent, node);
        node
    }

    /// Appends a text node with the given content to `parent`.
    pub fn append_text(&mut self, parent: NodeId, content: &str) -> NodeId {
        let node = self.create_text(content);
        self.append_child(parent, node);
        node
    }

    pub fn focus(&mut self, node: NodeId) {
        if self.nodes.contains_key(node) {
            self.focused = Some(node);
        }
    }

    pub fn blur(&mut self) {
        self.focused = None;
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        if self.nodes.contains_key(node) {
            self.rects.insert(node, rect);
        }
    }

    pub fn set_caret_rect(&mut self, rect: Option<Rect>) {
        self.caret_rect = rect;
    }

    /// Drains the log of synthesized notifications fired so far.
    pub fn drain_events(&mut self) -> Vec<(NodeId, SyntheticEvent)> {
        std::mem::take(&mut self.events)
    }

    /// Elements in document order (depth-first from body).
    fn descendant_elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.body];
        while let Some(node) = stack.pop() {
            if let Some(entry) = self.nodes.get(node) {
                if let NodeData::Element { children, .. } = &entry.data {
                    out.push(node);
                    for &child in children.iter().rev() {
                        stack.push(child);
                    }
                }
            }
        }
        out
    }

    fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        let entry = match self.nodes.get(node) {
            Some(entry) => entry,
            None => return false,
        };
        let (tag, attributes) = match &entry.data {
            NodeData::Element {
                tag, attributes, ..
            } => (tag, attributes),
            NodeData::Text(_) => return false,
        };

        if let Some(wanted) = &selector.tag {
            if tag != wanted {
                return false;
            }
        }

        selector.parts.iter().all(|part| match part {
            SelectorPart::Class(class) => attributes
                .get("class")
                .map(|value| value.split_whitespace().any(|c| c == class))
                .unwrap_or(false),
            SelectorPart::Id(id) => attributes.get("id").map(|v| v == id).unwrap_or(false),
            SelectorPart::Attr { name, op, value } => match attributes.get(name) {
                Some(actual) => match op {
                    AttrOp::Exists => true,
                    AttrOp::Equals => actual == value,
                    AttrOp::Contains => actual.contains(value.as_str()),
                    AttrOp::StartsWith => actual.starts_with(value.as_str()),
                },
                None => false,
            },
            SelectorPart::Not(inner) => !self.matches(node, inner),
        })
    }

    fn detach(&mut self, node: NodeId) {
        let parent = self.nodes.get(node).and_then(|entry| entry.parent);
        if let Some(parent) = parent {
            if let Some(entry) = self.nodes.get_mut(parent) {
                if let NodeData::Element { children, .. } = &mut entry.data {
                    children.retain(|&c| c != node);
                }
            }
        }
        if let Some(entry) = self.nodes.get_mut(node) {
            entry.parent = None;
        }
    }

    fn drop_subtree(&mut self, node: NodeId) {
        let children = self.children(node);
        for child in children {
            self.drop_subtree(child);
        }
        self.nodes.remove(node);
        self.values.remove(node);
        self.rects.remove(node);
        if self.focused == Some(node) {
            self.focused = None;
        }
        if self.caret.map(|(n, _)| n) == Some(node) {
            self.caret = None;
        }
    }
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for MemoryPage {
    fn body(&self) -> NodeId {
        self.body
    }

    fn contains(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.body {
                return true;
            }
            match self.nodes.get(current).and_then(|entry| entry.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|entry| entry.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        match self.nodes.get(node) {
            Some(NodeEntry {
                data: NodeData::Element { children, .. },
                ..
            }) => children.clone(),
            _ => Vec::new(),
        }
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        match self.nodes.get(node) {
            Some(NodeEntry {
                data: NodeData::Element { tag, .. },
                ..
            }) => Some(tag.clone()),
            _ => None,
        }
    }

    fn is_text(&self, node: NodeId) -> bool {
        self.nodes
            .get(node)
            .map(|entry| entry.data.is_text())
            .unwrap_or(false)
    }

    fn node_text(&self, node: NodeId) -> Option<String> {
        match self.nodes.get(node) {
            Some(NodeEntry {
                data: NodeData::Text(content),
                ..
            }) => Some(content.clone()),
            _ => None,
        }
    }

    fn set_node_text(&mut self, node: NodeId, text: &str) -> bool {
        match self.nodes.get_mut(node) {
            Some(NodeEntry {
                data: NodeData::Text(content),
                ..
            }) => {
                *content = text.to_string();
                true
            }
            _ => false,
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match self.nodes.get(node) {
            Some(NodeEntry {
                data: NodeData::Element { attributes, .. },
                ..
            }) => attributes.get(name).cloned(),
            _ => None,
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> bool {
        match self.nodes.get_mut(node) {
            Some(NodeEntry {
                data: NodeData::Element { attributes, .. },
                ..
            }) => {
                attributes.insert(name.to_string(), value.to_string());
                true
            }
            _ => false,
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> bool {
        match self.nodes.get_mut(node) {
            Some(NodeEntry {
                data: NodeData::Element { attributes, .. },
                ..
            }) => attributes.remove(name).is_some(),
            _ => false,
        }
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.insert(NodeEntry {
            data: NodeData::element(tag),
            parent: None,
        })
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.nodes.insert(NodeEntry {
            data: NodeData::text(text),
            parent: None,
        })
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return false;
        }
        if child == self.body || child == parent {
            return false;
        }
        self.detach(child);
        match self.nodes.get_mut(parent) {
            Some(NodeEntry {
                data: NodeData::Element { children, .. },
                ..
            }) => {
                children.push(child);
            }
            _ => return false,
        }
        if let Some(entry) = self.nodes.get_mut(child) {
            entry.parent = Some(parent);
        }
        true
    }

    fn clear_children(&mut self, node: NodeId) -> bool {
        let children = match self.nodes.get(node) {
            Some(NodeEntry {
                data: NodeData::Element { children, .. },
                ..
            }) => children.clone(),
            _ => return false,
        };
        for child in children {
            self.detach(child);
            self.drop_subtree(child);
        }
        true
    }

    fn remove_node(&mut self, node: NodeId) -> bool {
        if node == self.body || !self.nodes.contains_key(node) {
            return false;
        }
        self.detach(node);
        self.drop_subtree(node);
        true
    }

    fn value(&self, node: NodeId) -> Option<String> {
        if !self.nodes.contains_key(node) {
            return None;
        }
        Some(self.values.get(node).cloned().unwrap_or_default())
    }

    fn set_value(&mut self, node: NodeId, value: &str) -> bool {
        if !self.nodes.contains_key(node) {
            return false;
        }
        self.values.insert(node, value.to_string());
        true
    }

    fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    fn caret(&self) -> Option<(NodeId, usize)> {
        self.caret
    }

    fn set_caret(&mut self, node: NodeId, offset: usize) -> bool {
        if !self.nodes.contains_key(node) {
            return false;
        }
        self.caret = Some((node, offset));
        true
    }

    fn bounding_rect(&self, node: NodeId) -> Option<Rect> {
        self.rects.get(node).copied()
    }

    fn caret_rect(&self) -> Option<Rect> {
        self.caret_rect
    }

    fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let parsed = Selector::parse(selector)?;
        Ok(self
            .descendant_elements()
            .into_iter()
            .filter(|&node| self.matches(node, &parsed))
            .collect())
    }

    fn dispatch(&mut self, node: NodeId, event: SyntheticEvent) {
        self.events.push((node, event));
    }
}
