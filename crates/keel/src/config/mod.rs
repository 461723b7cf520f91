//! Cluster configuration definitions and loading.

pub mod loader;
pub mod types;

// Re-exports for ergonomics
pub use loader::ConfigLoader;
pub use types::{ClusterConfig, TopicPreload};
