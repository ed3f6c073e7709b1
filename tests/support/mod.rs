#![allow(dead_code)]

use async_trait::async_trait;
use contract_pilot::config::networks::{EndpointRegistry, NetworkConfig};
use contract_pilot::error::RpcError;
use contract_pilot::rpc::{FailoverProxy, JsonRpcRequest, RpcTransport};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const E1: &str = "https://e1.example";
pub const E2: &str = "https://e2.example";
pub const E3: &str = "https://e3.example";

/// Anvil's first dev account; address 0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266.
pub const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

#[derive(Clone)]
pub enum Scripted {
    Ok(Value),
    Fail(RpcError),
    Hang,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub url: String,
    pub method: String,
    pub params: Value,
}

/// Replies keyed by `(url, method)`. Queued replies are consumed in order; the last one repeats.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<(String, String), VecDeque<Scripted>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, url: &str, method: &str, reply: Scripted) -> &Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies
                .entry((url.to_string(), method.to_string()))
                .or_default()
                .push_back(reply);
        }
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.method).collect()
    }

    pub fn urls_for(&self, method: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .map(|c| c.url)
            .collect()
    }

    fn next_reply(&self, url: &str, method: &str) -> Option<Scripted> {
        let mut replies = self.replies.lock().ok()?;
        let queue = replies.get_mut(&(url.to_string(), method.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl RpcTransport for ScriptedTransport {
    async fn send(&self, url: &str, request: &JsonRpcRequest) -> Result<Value, RpcError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(Call {
                url: url.to_string(),
                method: request.method.clone(),
                params: request.params.clone(),
            });
        }
        match self.next_reply(url, &request.method) {
            Some(Scripted::Ok(value)) => Ok(value),
            Some(Scripted::Fail(err)) => Err(err),
            Some(Scripted::Hang) => std::future::pending().await,
            None => Err(RpcError::Transport("connection refused".into())),
        }
    }
}

pub fn sepolia_registry(endpoints: &[&str]) -> EndpointRegistry {
    let mut sepolia = NetworkConfig::sepolia();
    sepolia.endpoints = endpoints.iter().map(|url| (*url).to_string()).collect();
    EndpointRegistry::new(vec![sepolia]).expect("registry")
}

pub fn proxy(transport: Arc<ScriptedTransport>, endpoints: &[&str]) -> FailoverProxy {
    FailoverProxy::new(
        sepolia_registry(endpoints),
        transport,
        Duration::from_millis(1_000),
    )
}
