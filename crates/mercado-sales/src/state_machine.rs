//! # Sale State Machine
//!
//! Producer-driven status transitions with receipt upload, and
//! customer-driven payment-proof upload.
//!
//! ## Update Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    claim_detail()          write lock; later reads are stable           │
//! │    ownership check         other producer's sale → NotFound             │
//! │    transition check        requested → active → approved → completed    │
//! │    receipt row             update in place or insert + link             │
//! │    status write                                                         │
//! │    entering approved?      convert recorded qty → decrement stock       │
//! │    store.put()             failure → rollback                           │
//! │  COMMIT                    failure → delete the object just written     │
//! │  old receipt object        handed back as stale, deleted by the engine  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock moves exactly once per sale: on the transition into `approved`.
//! A sale already at or past approval never touches stock again.

use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use mercado_core::validation::voucher_extension;
use mercado_core::{
    convert, Principal, Role, SaleDetailView, SaleStatus, UpdateSaleRequest, VoucherAttached,
    VoucherFile, VoucherType,
};
use mercado_db::{Database, PartyRepository, ProductRepository, SaleRepository, VoucherRepository};

use crate::error::{SaleError, SaleResult};
use crate::storage::{voucher_file_name, voucher_remote_path, Committed, VoucherStore};

/// A voucher object the transaction is about to reference.
struct PendingUpload<'a> {
    file: &'a VoucherFile,
    path: String,
    /// Path the row pointed at before this update, if any.
    replaced: Option<String>,
}

/// Applies a status change and/or a receipt upload to a producer's sale.
pub(crate) async fn update_sale(
    db: &Database,
    store: &dyn VoucherStore,
    principal: Principal,
    sale_id: i64,
    request: &UpdateSaleRequest,
) -> SaleResult<Committed<SaleDetailView>> {
    match principal.role {
        Role::Producer => {}
        Role::Customer => return Err(SaleError::unauthorized("only producers can update sales")),
    }

    let extension = request.voucher_file.as_ref().map(voucher_extension).transpose()?;

    if request.status.is_none() && request.voucher_file.is_none() {
        return Err(SaleError::Validation("status or voucherFile is required".to_string()));
    }

    let mut tx = db.begin().await?;

    let detail = SaleRepository::claim_detail(&mut tx, sale_id).await?;

    let producer_id = PartyRepository::producer_id_for_user(&mut tx, principal.user_id)
        .await?
        .ok_or_else(|| SaleError::not_found("Producer"))?;

    if !SaleRepository::is_owned_by_producer(&mut tx, sale_id, producer_id).await? {
        return Err(SaleError::not_found("Sale"));
    }

    let current = detail.status;
    let next = match request.status {
        Some(next) => current.transition_to(next)?,
        None => current,
    };

    let upload = match (&request.voucher_file, extension) {
        (Some(file), Some(extension)) => {
            Some(upsert_receipt(&mut tx, sale_id, detail.voucher_id, file, &extension).await?)
        }
        _ => None,
    };

    if next != current {
        SaleRepository::set_status(&mut tx, sale_id, next).await?;

        if next == SaleStatus::Approved && !current.is_approved_or_later() {
            commit_stock(&mut tx, sale_id, detail.product_id, detail.unit_id).await?;
        }
    }

    let refreshed = SaleRepository::detail(&mut tx, sale_id)
        .await?
        .ok_or_else(|| SaleError::not_found("Sale"))?;
    let receipt = match refreshed.voucher_id {
        Some(id) => VoucherRepository::find(&mut tx, id).await?,
        None => None,
    };

    if let Some(upload) = &upload {
        store.put(&upload.file.bytes, &upload.path).await?;
    }

    if let Err(e) = tx.commit().await {
        if let Some(upload) = &upload {
            if upload.replaced.as_deref() != Some(upload.path.as_str()) {
                compensate(store, sale_id, &upload.path).await;
            }
        }
        return Err(e.into());
    }

    info!(sale_id, from = %current, to = %next, receipt = upload.is_some(), "Sale updated");

    let stale = upload.and_then(|upload| upload.replaced.filter(|old| *old != upload.path));

    Ok(Committed::new(SaleDetailView::new(refreshed, receipt), sale_id).with_stale(stale))
}

/// Appends a payment proof to one of the calling customer's sales.
pub(crate) async fn add_payment_proof(
    db: &Database,
    store: &dyn VoucherStore,
    principal: Principal,
    sale_id: i64,
    file: &VoucherFile,
) -> SaleResult<Committed<VoucherAttached>> {
    match principal.role {
        Role::Customer => {}
        Role::Producer => {
            return Err(SaleError::unauthorized("only customers can upload payment proofs"))
        }
    }

    let extension = voucher_extension(file)?;

    let mut tx = db.begin().await?;

    let customer_id = PartyRepository::customer_id_for_user(&mut tx, principal.user_id)
        .await?
        .ok_or_else(|| SaleError::not_found("Customer"))?;

    if !SaleRepository::is_owned_by_customer(&mut tx, sale_id, customer_id).await? {
        return Err(SaleError::not_found("Sale"));
    }

    // The file name embeds the voucher id, so insert first and name second
    let voucher = VoucherRepository::insert(&mut tx, sale_id, VoucherType::PaymentProof, "").await?;
    let path = voucher_remote_path(sale_id, &voucher_file_name(sale_id, voucher.id, &extension));
    VoucherRepository::update_path(&mut tx, voucher.id, &path).await?;

    store.put(&file.bytes, &path).await?;

    if let Err(e) = tx.commit().await {
        compensate(store, sale_id, &path).await;
        return Err(e.into());
    }

    info!(sale_id, customer_id, voucher_id = voucher.id, path = %path, "Payment proof attached");

    Ok(Committed::new(
        VoucherAttached {
            sale_id,
            voucher_id: voucher.id,
            path,
        },
        sale_id,
    ))
}

/// Points the sale at a receipt stored under its canonical name.
///
/// The first receipt of a sale is named with voucher id `0`, later
/// replacements with the id of the existing row, which keeps its identity.
async fn upsert_receipt<'a>(
    conn: &mut SqliteConnection,
    sale_id: i64,
    existing: Option<i64>,
    file: &'a VoucherFile,
    extension: &str,
) -> SaleResult<PendingUpload<'a>> {
    let path = voucher_remote_path(
        sale_id,
        &voucher_file_name(sale_id, existing.unwrap_or(0), extension),
    );

    let replaced = match existing {
        Some(voucher_id) => {
            let old = VoucherRepository::find(&mut *conn, voucher_id).await?;
            VoucherRepository::update_path(&mut *conn, voucher_id, &path).await?;
            old.map(|voucher| voucher.path)
        }
        None => {
            let voucher = VoucherRepository::insert(&mut *conn, sale_id, VoucherType::Receipt, &path).await?;
            SaleRepository::link_voucher(&mut *conn, sale_id, voucher.id).await?;
            None
        }
    };

    debug!(sale_id, path = %path, replaced = ?replaced, "Receipt row written");

    Ok(PendingUpload {
        file,
        path,
        replaced,
    })
}

/// Takes the sale's quantity out of its product's stock.
///
/// The quantity is re-derived from what the sale recorded: its quantity in
/// the ordered unit, converted to the product's unit.
async fn commit_stock(
    conn: &mut SqliteConnection,
    sale_id: i64,
    product_id: i64,
    ordered_unit_id: i64,
) -> SaleResult<()> {
    let sale = SaleRepository::sale(&mut *conn, sale_id)
        .await?
        .ok_or_else(|| SaleError::not_found("Sale"))?;
    let ordered_unit = ProductRepository::unit(&mut *conn, ordered_unit_id).await?;
    let product = ProductRepository::priced(&mut *conn, product_id)
        .await?
        .ok_or_else(|| SaleError::not_found("Product"))?;

    let requested = convert(&ordered_unit.name, &product.unit, sale.quantity)?;

    if !ProductRepository::decrement_stock(&mut *conn, product_id, requested).await? {
        let available = ProductRepository::stock(&mut *conn, product_id).await?.unwrap_or(0);
        return Err(SaleError::InsufficientStock {
            product_id,
            available,
            requested,
        });
    }

    info!(sale_id, product_id, quantity = requested, unit = %product.unit, "Stock committed");
    Ok(())
}

/// Removes an object whose transaction failed to commit.
async fn compensate(store: &dyn VoucherStore, sale_id: i64, path: &str) {
    match store.delete(path).await {
        Ok(()) => warn!(sale_id, path, "Commit failed, removed stored voucher"),
        Err(e) => warn!(
            sale_id,
            path,
            error = %e,
            "Commit failed and the stored voucher could not be removed, leaking it"
        ),
    }
}
