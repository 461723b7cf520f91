//! Cluster domain objects built from node data.

pub mod broker;
pub mod consumergroup;
pub mod partition;
pub mod topic;

pub use broker::Broker;
pub use consumergroup::Consumergroup;
pub use partition::Partition;
pub use topic::Topic;
