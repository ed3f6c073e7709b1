//! Contract Pilot library surface.
//!
//! The deployment pipeline is the primary workflow: a shared workflow store gated by the
//! severity policy, an ordered-failover JSON-RPC proxy, and the deployment orchestrator.
//! External collaborators (language model, compiler, static analyzer) live under `tools`.

pub mod deploy;
pub mod error;
pub mod pipeline;
pub mod rpc;
pub mod runtime;
pub mod tools;
pub mod utils;
pub mod workflow;

pub mod config {
    pub mod networks;
}
