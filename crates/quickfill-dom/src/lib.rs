pub mod document;
pub mod error;
pub mod node;
pub mod page;
pub mod selector;

// Re-export common items for convenience
pub use document::{Document, SyntheticEvent};
pub use error::SelectorError;
pub use node::{NodeData, NodeId, Rect};
pub use page::MemoryPage;
pub use selector::Selector;
