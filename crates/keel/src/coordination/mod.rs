//! Coordination service access: client contract, backends and the shared session.

pub mod connector;
pub mod memory;
pub mod path;
pub mod session;
pub mod r#trait;

// Re-exports for ergonomics
pub use connector::{Connector, MemoryConnector};
pub use memory::{InMemoryCoordination, TreeSnapshot};
pub use session::CoordinationSession;
pub use r#trait::{Coordination, NodeReply, Status};
