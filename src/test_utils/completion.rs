use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::completion::{
    CompletionClient, CompletionError, CompletionRequest,
};

/// Scripted completion backend. Replies are served in order; an empty queue
/// behaves like an unreachable API.
#[derive(Default)]
pub struct StubCompletionClient {
    replies: Mutex<VecDeque<Result<Option<String>, CompletionError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl StubCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues successful text replies.
    pub fn replying<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stub = Self::new();
        for reply in replies {
            stub.push_reply(Ok(Some(reply.into())));
        }
        stub
    }

    pub fn push_reply(&self, reply: Result<Option<String>, CompletionError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for StubCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Option<String>, CompletionError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CompletionError::Transport("no scripted reply".into())))
    }
}
