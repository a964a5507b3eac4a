pub mod adapter;
pub mod attach;
pub mod config;
pub mod detector;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod expand;
pub mod overlay;
pub mod surface;

// Re-export common items for convenience
pub use adapter::{adapter_for, SurfaceAdapter};
pub use config::{DetectionMode, EngineConfig};
pub use discovery::{discover, discover_under};
pub use engine::{Engine, KeyAction};
pub use error::{QuickfillError, Result};
pub use surface::{Surface, SurfaceKind};
