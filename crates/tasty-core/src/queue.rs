use std::collections::VecDeque;

use tokio::sync::Mutex;

use crate::{domain::QueuedMessage, errors::Error, Result};

/// FIFO buffer of incoming text messages, drained by the flusher.
#[derive(Debug)]
pub struct MessageQueue {
    capacity: usize,
    inner: Mutex<VecDeque<QueuedMessage>>,
}

impl MessageQueue {
    /// `capacity == 0` means unbounded.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(VecDeque::new()),
        }
    }

    pub async fn push(&self, msg: QueuedMessage) -> Result<usize> {
        let mut q = self.inner.lock().await;
        if self.capacity > 0 && q.len() >= self.capacity {
            return Err(Error::QueueFull {
                capacity: self.capacity,
            });
        }
        q.push_back(msg);
        Ok(q.len())
    }

    /// Take everything queued so far, oldest first.
    pub async fn drain(&self) -> Vec<QueuedMessage> {
        let mut q = self.inner.lock().await;
        q.drain(..).collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}
