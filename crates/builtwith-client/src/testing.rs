//! Scripted transport for exercising the client without a network.

use crate::transport::{HttpRequest, HttpResponse, Transport};
use async_trait::async_trait;
use builtwith_core::{BuiltWithError, Result};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// [`Transport`] that replays queued outcomes and records every request.
///
/// Outcomes are consumed in order. Once the queue is empty every call fails
/// with a transport error.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<Result<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    /// Create a transport with nothing queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a completed exchange.
    pub fn push_response(&self, status: u16, body: impl Into<String>) {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Ok(HttpResponse::new(status, body)));
    }

    /// Queue an exchange that never completes.
    pub fn push_transport_error(&self, message: impl Into<String>) {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Err(BuiltWithError::Transport {
                message: message.into(),
            }));
    }

    /// Number of requests sent so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Every request sent so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| {
                Err(BuiltWithError::Transport {
                    message: "no scripted response left".to_string(),
                })
            })
    }
}
