//! Sale Projection: role-scoped reads of the denormalized sale tree.

use mercado_core::{Principal, Role, SaleView};
use mercado_db::{Database, SaleScope};
use tracing::debug;

use crate::error::{SaleError, SaleResult};

/// The scope a principal reads in, or `None` when it has no linked record.
async fn scope_for(db: &Database, principal: Principal) -> SaleResult<Option<SaleScope>> {
    let parties = db.parties();
    let scope = match principal.role {
        Role::Customer => parties
            .find_customer_id(principal.user_id)
            .await?
            .map(SaleScope::Customer),
        Role::Producer => parties
            .find_producer_id(principal.user_id)
            .await?
            .map(SaleScope::Producer),
    };

    if scope.is_none() {
        debug!(user_id = principal.user_id, role = %principal.role, "Principal has no linked party");
    }

    Ok(scope)
}

pub(crate) async fn list_sales(db: &Database, principal: Principal) -> SaleResult<Vec<SaleView>> {
    match scope_for(db, principal).await? {
        Some(scope) => Ok(db.projection().list(scope).await?),
        None => Ok(Vec::new()),
    }
}

pub(crate) async fn get_sale(db: &Database, principal: Principal, sale_id: i64) -> SaleResult<SaleView> {
    let scope = scope_for(db, principal)
        .await?
        .ok_or_else(|| SaleError::not_found("Sale"))?;

    db.projection()
        .get(scope, sale_id)
        .await?
        .ok_or_else(|| SaleError::not_found("Sale"))
}
