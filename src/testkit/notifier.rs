//! Notifier fakes.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::NotifyError;
use crate::port::{AuditEvent, Delivery, Notifier};

/// Thread-safe event collector for notification assertions.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Snapshot of the events published so far.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, event: &AuditEvent) -> Result<Delivery, NotifyError> {
        self.events.lock().push(event.clone());
        Ok(Delivery::Sent)
    }
}

/// Always fails with [`NotifyError::Unavailable`].
#[derive(Clone, Copy, Default)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn publish(&self, _event: &AuditEvent) -> Result<Delivery, NotifyError> {
        Err(NotifyError::Unavailable("audit channel offline".to_string()))
    }
}
