//! Resource models and request bodies.
//!
//! Every field is optional on the wire: the API omits what it does not
//! know, and partial updates must only carry the fields the caller set.

pub mod environment;
pub mod interface;
pub mod label_category;
pub mod network;
pub mod project;
pub mod service;
pub mod vm;

// Re-export commonly used types
pub use environment::*;
pub use interface::*;
pub use label_category::*;
pub use network::*;
pub use project::*;
pub use service::*;
pub use vm::*;
