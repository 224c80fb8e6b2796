//! FIFO queue of scripted handler failures.
//!
//! Tests enqueue errors against a handler name; the dispatch engine consults
//! the queue before invoking the resolved handler. Only the head of the queue
//! can intercept a call, so scripted errors fire in the exact order enqueued.

use std::collections::VecDeque;

use crate::error::ApiError;

#[derive(Debug)]
struct QueuedError {
    handler_name: String,
    error: ApiError,
}

/// FIFO of `(handler name, error)` entries, consumed at most once each.
#[derive(Debug, Default)]
pub struct ErrorQueue {
    entries: VecDeque<QueuedError>,
}

impl ErrorQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error scripted for the named handler.
    pub fn enqueue(&mut self, handler_name: impl Into<String>, error: ApiError) {
        self.entries.push_back(QueuedError {
            handler_name: handler_name.into(),
            error,
        });
    }

    /// Non-destructive peek matching the given handler name against the
    /// current head only. A non-matching head means no error fires for this
    /// call, even if a later entry would match.
    pub fn error_for_handler(&self, handler_name: &str) -> Option<&ApiError> {
        self.entries
            .front()
            .filter(|entry| entry.handler_name == handler_name)
            .map(|entry| &entry.error)
    }

    /// Remove and return the queue head.
    pub fn dequeue(&mut self) -> Option<ApiError> {
        self.entries.pop_front().map(|entry| entry.error)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
