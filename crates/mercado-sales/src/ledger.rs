//! # Sale Ledger
//!
//! Creates sales (customer side) and deletes them (producer side).
//!
//! ## Creation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate request ──► role == CUSTOMER ──► BEGIN                        │
//! │                                              │                          │
//! │      customer for principal ◄────────────────┤ NotFound("Customer")     │
//! │      product (price, bulk tier, unit) ◄──────┤ NotFound("Product")      │
//! │      requested unit entity ◄─────────────────┤ Validation               │
//! │      quote(): convert ► price ► IGV          │                          │
//! │      INSERT sale, INSERT detail (requested)  │                          │
//! │                                              ▼                          │
//! │                                           COMMIT ──► SaleCreated        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Creation never touches stock. Inventory is committed at approval.

use tracing::info;

use mercado_core::validation::validate_create_request;
use mercado_core::{pricing, CreateSaleRequest, Principal, Role, SaleCreated};
use mercado_db::{
    Database, NewSaleDetail, PartyRepository, ProductRepository, SaleRepository, VoucherRepository,
};

use crate::config::DeletionPolicy;
use crate::error::{SaleError, SaleResult};
use crate::storage::Committed;

/// Records a new sale for the calling customer.
pub(crate) async fn create_sale(
    db: &Database,
    principal: Principal,
    request: &CreateSaleRequest,
) -> SaleResult<SaleCreated> {
    let request = validate_create_request(request)?;

    match principal.role {
        Role::Customer => {}
        Role::Producer => return Err(SaleError::unauthorized("only customers can create sales")),
    }

    let mut tx = db.begin().await?;

    let customer_id = PartyRepository::customer_id_for_user(&mut tx, principal.user_id)
        .await?
        .ok_or_else(|| SaleError::not_found("Customer"))?;

    let product = ProductRepository::priced(&mut tx, request.product_id)
        .await?
        .ok_or_else(|| SaleError::not_found("Product"))?;

    let unit = ProductRepository::find_unit(&mut tx, &request.unit)
        .await?
        .ok_or_else(|| SaleError::Validation("unit of measure is not valid".to_string()))?;

    let quote = pricing::quote(&product, &unit.name, request.quantity)?;

    let sale = SaleRepository::insert_sale(&mut tx, customer_id, request.quantity, quote.total).await?;
    SaleRepository::insert_detail(
        &mut tx,
        &NewSaleDetail {
            sale_id: sale.id,
            product_id: product.id,
            unit_price: quote.unit_price,
            tax: quote.tax,
            unit_id: unit.id,
            subtotal: quote.subtotal,
        },
    )
    .await?;

    tx.commit().await?;

    info!(
        sale_id = sale.id,
        customer_id,
        product_id = product.id,
        quantity = request.quantity,
        unit = %unit.name,
        total = %quote.total,
        "Sale created"
    );

    Ok(SaleCreated { sale_id: sale.id })
}

/// Removes a sale of one of the calling producer's products.
///
/// Rows go in one transaction. The sale's voucher objects come back as
/// stale and are removed after commit.
pub(crate) async fn delete_sale(
    db: &Database,
    policy: DeletionPolicy,
    principal: Principal,
    sale_id: i64,
) -> SaleResult<Committed<()>> {
    match principal.role {
        Role::Producer => {}
        Role::Customer => return Err(SaleError::unauthorized("only producers can delete sales")),
    }

    let mut tx = db.begin().await?;

    // Write lock first so a concurrent approval cannot slip in between
    let detail = SaleRepository::claim_detail(&mut tx, sale_id).await?;

    let producer_id = PartyRepository::producer_id_for_user(&mut tx, principal.user_id)
        .await?
        .ok_or_else(|| SaleError::not_found("Producer"))?;

    if !SaleRepository::is_owned_by_producer(&mut tx, sale_id, producer_id).await? {
        return Err(SaleError::not_found("Sale"));
    }

    if policy == DeletionPolicy::BeforeApproval && detail.status.is_approved_or_later() {
        return Err(SaleError::InvalidTransition(format!(
            "Cannot delete a sale in status '{}'",
            detail.status
        )));
    }

    let paths: Vec<String> = VoucherRepository::for_sale(&mut tx, sale_id)
        .await?
        .into_iter()
        .map(|voucher| voucher.path)
        .filter(|path| !path.is_empty())
        .collect();

    if !SaleRepository::delete(&mut tx, sale_id).await? {
        return Err(SaleError::not_found("Sale"));
    }

    tx.commit().await?;

    info!(sale_id, producer_id, status = %detail.status, vouchers = paths.len(), "Sale deleted");

    Ok(Committed::new((), sale_id).with_stale(paths))
}
