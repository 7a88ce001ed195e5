//! # Sale Engine
//!
//! The facade every caller goes through. It owns the shared handles and
//! wraps each operation in admission control and a deadline.
//!
//! ## Operation Envelope
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  call ──► gate.try_acquire() ── full ──► ResourceExhausted (no waiting) │
//! │              │                                                          │
//! │              ▼                                                          │
//! │        timeout(deadline, operation) ── elapsed ──► Timeout              │
//! │              │                         (future dropped → tx rollback)   │
//! │              ▼  committed                                               │
//! │        timeout(deadline, remove stale objects) ── elapsed ──► leak      │
//! │              │                                                          │
//! │              ▼                                                          │
//! │           result                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The gate holds `max_connections + max_pending_operations` permits. An
//! admitted operation may still wait for a pooled connection, up to the
//! pool's acquire timeout.
//!
//! A `Timeout` always means nothing was committed. Cleanup of objects a
//! committed operation made stale runs after that deadline and cannot turn
//! the outcome into a failure.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use mercado_core::{
    CreateSaleRequest, Principal, Role, SaleCreated, SaleDetailView, SaleView, UpdateSaleRequest,
    VoucherAttached, VoucherFile,
};
use mercado_db::Database;

use crate::config::{DeletionPolicy, SalesConfig};
use crate::error::{SaleError, SaleResult};
use crate::storage::{self, Committed, LocalDirStore, VoucherStore};
use crate::{ledger, projection, state_machine};

/// Tuning knobs of a [`SaleEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Operations admitted at once; the rest are refused.
    pub admission_limit: usize,
    pub deadline: Duration,
    pub deletion_policy: DeletionPolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions::from(&SalesConfig::default())
    }
}

impl From<&SalesConfig> for EngineOptions {
    fn from(config: &SalesConfig) -> Self {
        EngineOptions {
            admission_limit: config.admission_limit(),
            deadline: config.operation_deadline,
            deletion_policy: config.deletion_policy,
        }
    }
}

/// Builds a principal from the role string issued by the authentication layer.
///
/// Roles other than `CUSTOMER` and `PRODUCER` fail with `Unauthorized`.
pub fn principal_from_claims(user_id: i64, role: &str) -> SaleResult<Principal> {
    let role: Role = role.parse()?;
    Ok(Principal { user_id, role })
}

/// Entry point of the sale ledger.
///
/// Cheap to clone; clones share the pool, the store and the admission gate.
#[derive(Clone)]
pub struct SaleEngine {
    db: Database,
    store: Arc<dyn VoucherStore>,
    gate: Arc<Semaphore>,
    options: EngineOptions,
}

impl std::fmt::Debug for SaleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaleEngine")
            .field("options", &self.options)
            .field("available_permits", &self.gate.available_permits())
            .finish()
    }
}

impl SaleEngine {
    pub fn new(db: Database, store: Arc<dyn VoucherStore>, options: EngineOptions) -> Self {
        SaleEngine {
            db,
            store,
            gate: Arc::new(Semaphore::new(options.admission_limit.max(1))),
            options,
        }
    }

    /// Opens the database and a local directory store from configuration.
    pub async fn from_config(config: &SalesConfig) -> SaleResult<Self> {
        let db = Database::new(config.db_config()).await?;
        let store = Arc::new(LocalDirStore::new(&config.storage_root));

        info!(
            database = %config.database_path.display(),
            storage = %config.storage_root.display(),
            deletion_policy = %config.deletion_policy,
            "Sale engine ready"
        );

        Ok(SaleEngine::new(db, store, EngineOptions::from(config)))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    // =========================================================================
    // Ledger
    // =========================================================================

    /// Records a sale for the calling customer. Stock is untouched.
    ///
    /// ## Errors
    /// * `Validation` - Missing or malformed fields, unknown unit
    /// * `Unauthorized` - Caller is not a customer
    /// * `NotFound` - No linked customer, or no such product
    /// * `UnsupportedUnitConversion` - Unit cannot be converted to the product's unit
    pub async fn create_sale(
        &self,
        principal: Principal,
        request: &CreateSaleRequest,
    ) -> SaleResult<SaleCreated> {
        self.run("create_sale", ledger::create_sale(&self.db, principal, request))
            .await
    }

    /// Deletes a sale of the calling producer, subject to the deletion policy.
    pub async fn delete_sale(&self, principal: Principal, sale_id: i64) -> SaleResult<()> {
        self.run_committed(
            "delete_sale",
            ledger::delete_sale(&self.db, self.options.deletion_policy, principal, sale_id),
        )
        .await
    }

    // =========================================================================
    // State machine
    // =========================================================================

    /// Changes a sale's status and/or replaces its receipt.
    ///
    /// Entering `approved` takes the ordered quantity out of stock in the
    /// same transaction.
    ///
    /// ## Errors
    /// * `InvalidTransition` - Status change not in the graph
    /// * `InsufficientStock` - Approval needs more than is on hand
    /// * `StorageFailure` - Receipt upload failed; nothing was changed
    pub async fn update_sale(
        &self,
        principal: Principal,
        sale_id: i64,
        request: &UpdateSaleRequest,
    ) -> SaleResult<SaleDetailView> {
        self.run_committed(
            "update_sale",
            state_machine::update_sale(&self.db, self.store.as_ref(), principal, sale_id, request),
        )
        .await
    }

    /// Appends a payment proof to one of the calling customer's sales.
    pub async fn add_payment_proof(
        &self,
        principal: Principal,
        sale_id: i64,
        file: &VoucherFile,
    ) -> SaleResult<VoucherAttached> {
        self.run_committed(
            "add_payment_proof",
            state_machine::add_payment_proof(&self.db, self.store.as_ref(), principal, sale_id, file),
        )
        .await
    }

    // =========================================================================
    // Projection
    // =========================================================================

    /// Sales visible to the principal, newest first.
    pub async fn list_sales(&self, principal: Principal) -> SaleResult<Vec<SaleView>> {
        self.run("list_sales", projection::list_sales(&self.db, principal))
            .await
    }

    /// One sale, when it exists and is visible to the principal.
    pub async fn get_sale(&self, principal: Principal, sale_id: i64) -> SaleResult<SaleView> {
        self.run("get_sale", projection::get_sale(&self.db, principal, sale_id))
            .await
    }

    /// Admission, deadline and outcome logging around one operation.
    async fn run<T, F>(&self, operation: &'static str, fut: F) -> SaleResult<T>
    where
        F: Future<Output = SaleResult<T>>,
    {
        let _permit = self.gate.try_acquire().map_err(|_| {
            warn!(operation, "Admission limit reached, rejecting operation");
            SaleError::ResourceExhausted("too many pending sale operations".to_string())
        })?;

        let result = match tokio::time::timeout(self.options.deadline, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    operation,
                    deadline_ms = self.options.deadline.as_millis() as u64,
                    "Operation exceeded its deadline, rolled back"
                );
                Err(SaleError::Timeout(self.options.deadline))
            }
        };

        if let Err(e) = &result {
            debug!(operation, kind = e.kind(), error = %e, "Operation failed");
        }

        result
    }

    /// Like [`run`](Self::run), then removes the objects the committed
    /// operation made stale under a deadline of their own.
    async fn run_committed<T, F>(&self, operation: &'static str, fut: F) -> SaleResult<T>
    where
        F: Future<Output = SaleResult<Committed<T>>>,
    {
        let Committed {
            value,
            sale_id,
            stale,
        } = self.run(operation, fut).await?;

        if !stale.is_empty() {
            let cleanup = storage::remove_stale(self.store.as_ref(), sale_id, &stale);
            if tokio::time::timeout(self.options.deadline, cleanup).await.is_err() {
                warn!(
                    operation,
                    sale_id,
                    objects = stale.len(),
                    "Stale voucher cleanup exceeded its deadline, leaking objects"
                );
            }
        }

        Ok(value)
    }
}
