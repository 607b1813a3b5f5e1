//! OutboxProcessor - drains the durable event table.
//!
//! A periodic tick claims up to a batch of pending events and dispatches
//! each to its registered handler. The per-instance atomic flag guarantees
//! ticks never overlap within one processor, while horizontally scaled
//! instances stay independent because the flag is owned by the instance,
//! not shared module state.
//!
//! Event lifecycle per tick: `Pending -> Processing -> Completed`, or back
//! to `Pending` with the retry count incremented and the error recorded.
//! An event that keeps failing is parked as `Failed` once the retry budget
//! is spent - visible to operators, never silently dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time;

use crate::config::OutboxConfig;
use crate::domain::foundation::DomainError;
use crate::ports::{OutboxEvent, OutboxStore};

/// Handler for one outbox event type.
#[async_trait]
pub trait OutboxEventHandler: Send + Sync {
    /// The event type this handler processes.
    fn event_type(&self) -> &'static str;

    /// Process the event. An error sends the event back to pending (or
    /// parks it once retries are exhausted).
    async fn handle(&self, event: &OutboxEvent) -> Result<(), DomainError>;
}

/// Routes events to handlers by event type.
#[derive(Default)]
pub struct OutboxDispatcher {
    handlers: HashMap<&'static str, Arc<dyn OutboxEventHandler>>,
}

impl OutboxDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its declared event type.
    pub fn register(mut self, handler: Arc<dyn OutboxEventHandler>) -> Self {
        self.handlers.insert(handler.event_type(), handler);
        self
    }

    fn get(&self, event_type: &str) -> Option<&Arc<dyn OutboxEventHandler>> {
        self.handlers.get(event_type)
    }
}

/// Background service draining the outbox.
pub struct OutboxProcessor {
    outbox: Arc<dyn OutboxStore>,
    dispatcher: OutboxDispatcher,
    config: OutboxConfig,
    /// Single-flight guard owned by this instance.
    in_flight: AtomicBool,
}

impl OutboxProcessor {
    pub fn new(outbox: Arc<dyn OutboxStore>, dispatcher: OutboxDispatcher, config: OutboxConfig) -> Self {
        Self {
            outbox,
            dispatcher,
            config,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run the processor loop until the shutdown signal flips.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.tick_interval());

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        // Drain one final batch before stopping.
                        if let Err(error) = self.tick().await {
                            tracing::error!(error = %error, "Final outbox tick failed during shutdown");
                        }
                        return;
                    }
                }

                _ = interval.tick() => {
                    if let Err(error) = self.tick().await {
                        tracing::error!(error = %error, "Outbox tick failed");
                    }
                }
            }
        }
    }

    /// Run one tick. Returns the number of events completed.
    ///
    /// Overlapping calls are skipped, not queued: the interval fires again
    /// soon enough and pending events keep their order.
    pub async fn tick(&self) -> Result<usize, DomainError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Previous outbox tick still running; skipping");
            return Ok(0);
        }

        let result = self.process_batch().await;
        self.in_flight.store(false, Ordering::Release);
        result
    }

    async fn process_batch(&self) -> Result<usize, DomainError> {
        let events = self.outbox.fetch_pending(self.config.batch_size).await?;
        let mut completed = 0;

        for event in events {
            if self.process_event(&event).await? {
                completed += 1;
            }
        }

        Ok(completed)
    }

    /// Claim and dispatch one event. Returns true when it completed.
    async fn process_event(&self, event: &OutboxEvent) -> Result<bool, DomainError> {
        tracing::debug!(event_id = %event.id, event_type = %event.event_type, "Processing outbox event");
        self.outbox.mark_processing(event.id).await?;

        let Some(handler) = self.dispatcher.get(&event.event_type) else {
            // Unroutable events cannot make progress; park them where an
            // operator will see them instead of retrying forever.
            tracing::error!(event_id = %event.id, event_type = %event.event_type, "No handler for outbox event type");
            self.outbox
                .record_failure(event.id, "no handler registered for event type", false)
                .await?;
            return Ok(false);
        };

        match handler.handle(event).await {
            Ok(()) => {
                self.outbox.mark_completed(event.id).await?;
                tracing::debug!(event_id = %event.id, "Outbox event completed");
                Ok(true)
            }
            Err(error) => {
                let requeue = event.retry_count + 1 < self.config.max_retries;
                tracing::warn!(
                    event_id = %event.id,
                    retry_count = event.retry_count + 1,
                    requeue,
                    error = %error,
                    "Outbox event dispatch failed"
                );
                self.outbox
                    .record_failure(event.id, &error.to_string(), requeue)
                    .await?;
                Ok(false)
            }
        }
    }
}
