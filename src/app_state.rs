//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::StoreBackend;
use crate::domain::{EventBus, IdentifierGenerator};
use crate::export::TicketExporter;
use crate::persistence::SchemaVersion;
use crate::service::{IssuanceService, LifecycleService, ServiceContext, VerificationService};

/// Which store the process runs against, reported by `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageInfo {
    /// Configured backend.
    pub backend: StoreBackend,
    /// Schema detected at startup; `None` for the in-memory store.
    pub schema: Option<SchemaVersion>,
}

impl StorageInfo {
    /// The in-memory store.
    #[must_use]
    pub const fn memory() -> Self {
        Self {
            backend: StoreBackend::Memory,
            schema: None,
        }
    }

    /// Whether ticket writes are accepted.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        match self.schema {
            Some(schema) => schema.is_writable(),
            None => true,
        }
    }
}

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Ticket issuance.
    pub issuance: Arc<IssuanceService>,
    /// Reads, cancellation, payment signals and cleanup.
    pub lifecycle: Arc<LifecycleService>,
    /// Gate verification and check-in.
    pub verification: Arc<VerificationService>,
    /// Renders ticket downloads.
    pub exporter: Arc<dyn TicketExporter>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Backend and schema in use.
    pub storage: StorageInfo,
}

impl AppState {
    /// Wires every service over one shared [`ServiceContext`].
    #[must_use]
    pub fn new(
        ctx: ServiceContext,
        identifiers: Arc<dyn IdentifierGenerator>,
        exporter: Arc<dyn TicketExporter>,
    ) -> Self {
        let event_bus = ctx.event_bus.clone();
        Self {
            issuance: Arc::new(IssuanceService::new(ctx.clone(), identifiers)),
            lifecycle: Arc::new(LifecycleService::new(ctx.clone())),
            verification: Arc::new(VerificationService::new(ctx)),
            exporter,
            event_bus,
            storage: StorageInfo::memory(),
        }
    }

    /// Records the backend the services were wired over.
    #[must_use]
    pub fn with_storage(mut self, storage: StorageInfo) -> Self {
        self.storage = storage;
        self
    }
}
