//! Admission gate bounding the number of simultaneous Pilosa requests.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{MindyError, Result};

pub const DEFAULT_CONCURRENCY: usize = 2;

/// A counting gate with a fixed number of slots. Clones share the slots.
#[derive(Debug, Clone)]
pub struct Limiter {
    slots: Arc<Semaphore>,
    capacity: usize,
}

/// An occupied slot. Dropping it hands the slot back.
#[derive(Debug)]
pub struct Slot {
    _permit: OwnedSemaphorePermit,
}

impl Limiter {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(MindyError::Config("concurrency must be at least 1".into()));
        }
        Ok(Self { slots: Arc::new(Semaphore::new(capacity)), capacity })
    }
    /// Waits until a slot is free and takes it.
    pub async fn acquire(&self) -> Result<Slot> {
        Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map(|permit| Slot { _permit: permit })
            .map_err(|e| MindyError::Internal(format!("limiter closed: {e}")))
    }
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }
}
