//! Per-cluster agent for kubegate
//!
//! Responsibilities:
//! - List namespaces and deployments of the cluster it runs in
//! - Restart deployments by bumping their pod template annotation
//! - Expose those operations over HTTP (:8000) to the aggregator

pub mod error;
pub mod server;
pub mod workloads;

pub use error::AgentError;
pub use workloads::{KubeWorkloads, Workloads};
