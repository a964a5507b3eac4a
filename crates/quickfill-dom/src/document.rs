use crate::error::SelectorError;
use crate::node::{NodeId, Rect};

/// Notification synthesized on a surface after a programmatic edit.
///
/// Host pages that keep their own model of the field (React controlled
/// inputs, Draft/Lexical style editors) only pick up a mutation if these
/// fire; without them the edit is silently reverted on the next render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticEvent {
    Input,
    Change,
}

/// The protocol surface between the expansion engine and a host page.
///
/// Everything the engine does to a page goes through this trait: structural
/// reads, attribute and value mutation, caret movement, geometry queries and
/// synthesized input notifications. A browser binding implements it against
/// the live DOM; [`crate::MemoryPage`] implements it in memory so the engine
/// is fully exercisable without a document.
///
/// Caret offsets are byte offsets into the logical text of the node they
/// refer to.
pub trait Document {
    /// Root under which all content (and overlays) live.
    fn body(&self) -> NodeId;

    /// Whether the node is still part of the document.
    fn contains(&self, node: NodeId) -> bool;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Lowercase tag name; `None` for text nodes and dead ids.
    fn tag_name(&self, node: NodeId) -> Option<String>;

    fn is_text(&self, node: NodeId) -> bool;

    /// Character data of a text node.
    fn node_text(&self, node: NodeId) -> Option<String>;

    fn set_node_text(&mut self, node: NodeId, text: &str) -> bool;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> bool;

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> bool;

    fn create_element(&mut self, tag: &str) -> NodeId;

    fn create_text(&mut self, text: &str) -> NodeId;

    /// Appends `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool;

    /// Removes every child of `node`, dropping the subtrees.
    fn clear_children(&mut self, node: NodeId) -> bool;

    /// Detaches `node` from the document and drops its subtree.
    fn remove_node(&mut self, node: NodeId) -> bool;

    /// Live value of a form control, distinct from its `value` attribute.
    fn value(&self, node: NodeId) -> Option<String>;

    fn set_value(&mut self, node: NodeId, value: &str) -> bool;

    fn focused(&self) -> Option<NodeId>;

    /// Current caret as (node, byte offset), if a caret exists.
    fn caret(&self) -> Option<(NodeId, usize)>;

    fn set_caret(&mut self, node: NodeId, offset: usize) -> bool;

    fn bounding_rect(&self, node: NodeId) -> Option<Rect>;

    /// Rectangle of the collapsed caret, when the host can produce one.
    fn caret_rect(&self) -> Option<Rect>;

    /// Evaluates a selector against the whole document, returning matching
    /// elements in document order. Unsupported syntax is an error, not a
    /// panic; callers decide whether to isolate it.
    fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError>;

    /// Fires a synthesized notification on `node` so the host page's own
    /// reactive layer observes the mutation the engine just made.
    fn dispatch(&mut self, node: NodeId, event: SyntheticEvent);
}
