//! Multi-endpoint JSON-RPC access with ordered failover.

pub mod proxy;
pub mod transport;
pub mod types;

pub use proxy::{EndpointHandle, EndpointHealth, FailoverProxy};
pub use transport::{decode_response, endpoint_label, HttpTransport, RpcTransport};
pub use types::{JsonRpcErrorObject, JsonRpcRequest, JsonRpcResponse};
