//! Sale creation and deletion scenarios.

mod common;

use common::{Harness, CUSTOMER, OTHER_PRODUCER, PRODUCER};
use mercado_core::{CreateSaleRequest, Principal, SaleStatus, UpdateSaleRequest, VoucherFile};
use mercado_sales::{DeletionPolicy, EngineOptions, SaleError};

#[tokio::test]
async fn regular_price_below_bulk_threshold() {
    let h = Harness::new().await;

    let sale_id = h.order(h.ids.potatoes_kg, 50, "kg").await;

    let detail = h.detail(sale_id).await;
    assert_eq!(detail.unit_price_cents, 1000);
    assert_eq!(detail.subtotal_cents, 50_000);
    assert_eq!(detail.tax_cents, 9_000);
    assert_eq!(detail.status, SaleStatus::Requested);
    assert_eq!(detail.unit_id, h.ids.kg);

    let sale = h.db().sales().get_sale(sale_id).await.unwrap().unwrap();
    assert_eq!(sale.quantity, 50);
    assert_eq!(sale.total_price_cents, 59_000);
}

#[tokio::test]
async fn bulk_price_at_threshold_and_above() {
    let h = Harness::new().await;

    let sale_id = h.order(h.ids.potatoes_kg, 150, "kg").await;
    let detail = h.detail(sale_id).await;
    assert_eq!(detail.unit_price_cents, 800);
    assert_eq!(detail.subtotal_cents, 120_000);
    assert_eq!(detail.tax_cents, 21_600);

    let sale = h.db().sales().get_sale(sale_id).await.unwrap().unwrap();
    assert_eq!(sale.total_price_cents, 141_600);

    let edge = h.order(h.ids.potatoes_kg, 100, "kg").await;
    assert_eq!(h.detail(edge).await.unit_price_cents, 800);
}

#[tokio::test]
async fn tonnes_ordered_against_kilogram_product() {
    let h = Harness::new().await;

    let sale_id = h.order(h.ids.potatoes_kg, 2, "tn").await;

    let detail = h.detail(sale_id).await;
    // Tier follows the 2 tn requested, billing follows the 2000 kg
    assert_eq!(detail.unit_price_cents, 1000);
    assert_eq!(detail.subtotal_cents, 2_000_000);
    assert_eq!(detail.tax_cents, 360_000);
    assert_eq!(detail.unit_id, h.ids.tn);

    let sale = h.db().sales().get_sale(sale_id).await.unwrap().unwrap();
    assert_eq!(sale.quantity, 2, "quantity stays in the ordered unit");
    assert_eq!(sale.total_price_cents, 2_360_000);
}

#[tokio::test]
async fn single_tonne_does_not_reach_kilogram_bulk_tier() {
    let h = Harness::new().await;

    let sale_id = h.order(h.ids.potatoes_kg, 1, "tn").await;

    let detail = h.detail(sale_id).await;
    assert_eq!(detail.unit_price_cents, 1000);
    assert_eq!(detail.subtotal_cents, 1_000_000);
}

#[tokio::test]
async fn total_overflow_is_rejected_without_a_sale() {
    let h = Harness::new().await;

    let err = h
        .engine
        .create_sale(
            CUSTOMER,
            &CreateSaleRequest::new(h.ids.beans_kg, 14_000_000_000_000_000, "kg"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SaleError::Validation(_)), "{err:?}");
    assert_eq!(h.sale_count().await, 0);
}

#[tokio::test]
async fn creation_does_not_touch_stock() {
    let h = Harness::new().await;
    h.order(h.ids.potatoes_kg, 300, "kg").await;
    assert_eq!(h.stock(h.ids.potatoes_kg).await, 5000);
}

#[tokio::test]
async fn kilograms_against_tonne_product_is_rejected() {
    let h = Harness::new().await;

    let err = h
        .engine
        .create_sale(CUSTOMER, &CreateSaleRequest::new(h.ids.quinoa_tn, 2000, "kg"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SaleError::UnsupportedUnitConversion { ref from, ref to } if from == "kg" && to == "tn"
    ));
    assert_eq!(h.sale_count().await, 0);
}

#[tokio::test]
async fn producer_cannot_create_sales() {
    let h = Harness::new().await;

    let err = h
        .engine
        .create_sale(PRODUCER, &CreateSaleRequest::new(h.ids.potatoes_kg, 5, "kg"))
        .await
        .unwrap_err();

    assert!(matches!(err, SaleError::Unauthorized(_)));
    assert_eq!(err.status_code(), 403);
    assert_eq!(h.sale_count().await, 0);
}

#[tokio::test]
async fn malformed_requests_fail_validation() {
    let h = Harness::new().await;

    let cases = [
        CreateSaleRequest::default(),
        CreateSaleRequest {
            unit: None,
            ..CreateSaleRequest::new(h.ids.potatoes_kg, 5, "kg")
        },
        CreateSaleRequest::new(h.ids.potatoes_kg, 0, "kg"),
        CreateSaleRequest::new(h.ids.potatoes_kg, -3, "kg"),
        CreateSaleRequest::new(0, 5, "kg"),
        CreateSaleRequest::new(h.ids.potatoes_kg, 5, "   "),
        CreateSaleRequest::new(h.ids.potatoes_kg, 5, "kilogramos-por-saco-grande"),
    ];

    for request in cases {
        let err = h.engine.create_sale(CUSTOMER, &request).await.unwrap_err();
        assert!(matches!(err, SaleError::Validation(_)), "{request:?} gave {err:?}");
    }
    assert_eq!(h.sale_count().await, 0);
}

#[tokio::test]
async fn unknown_unit_is_a_validation_error() {
    let h = Harness::new().await;

    let err = h
        .engine
        .create_sale(CUSTOMER, &CreateSaleRequest::new(h.ids.potatoes_kg, 5, "lb"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Validation error: unit of measure is not valid");
}

#[tokio::test]
async fn unit_names_are_canonicalized() {
    let h = Harness::new().await;
    let sale_id = h.order(h.ids.potatoes_kg, 1, " TN ").await;
    assert_eq!(h.detail(sale_id).await.unit_id, h.ids.tn);
}

#[tokio::test]
async fn missing_customer_and_product_are_not_found() {
    let h = Harness::new().await;

    let err = h
        .engine
        .create_sale(Principal::customer(555), &CreateSaleRequest::new(h.ids.potatoes_kg, 5, "kg"))
        .await
        .unwrap_err();
    assert!(matches!(err, SaleError::NotFound(ref what) if what == "Customer"));

    let err = h
        .engine
        .create_sale(CUSTOMER, &CreateSaleRequest::new(9_999, 5, "kg"))
        .await
        .unwrap_err();
    assert!(matches!(err, SaleError::NotFound(ref what) if what == "Product"));
    assert_eq!(h.sale_count().await, 0);
}

// =============================================================================
// Deletion
// =============================================================================

#[tokio::test]
async fn producer_deletes_sale_with_its_vouchers() {
    let h = Harness::new().await;
    let sale_id = h.order(h.ids.potatoes_kg, 10, "kg").await;

    let proof = h
        .engine
        .add_payment_proof(CUSTOMER, sale_id, &VoucherFile::new("pago.png", b"png".to_vec()))
        .await
        .unwrap();
    h.engine
        .update_sale(
            PRODUCER,
            sale_id,
            &UpdateSaleRequest::receipt(VoucherFile::new("boleta.pdf", b"pdf".to_vec())),
        )
        .await
        .unwrap();
    assert_eq!(h.store.len(), 2);

    h.engine.delete_sale(PRODUCER, sale_id).await.unwrap();

    assert_eq!(h.sale_count().await, 0);
    assert!(h.db().sales().get_detail_by_sale(sale_id).await.unwrap().is_none());
    assert!(h.db().vouchers().list_for_sale(sale_id).await.unwrap().is_empty());
    assert!(!h.store.contains(&proof.path));
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn deletion_survives_object_store_failure() {
    let h = Harness::new().await;
    let sale_id = h.order(h.ids.potatoes_kg, 10, "kg").await;
    h.engine
        .add_payment_proof(CUSTOMER, sale_id, &VoucherFile::new("pago.png", b"png".to_vec()))
        .await
        .unwrap();

    h.store.fail_deletes(true);
    h.engine.delete_sale(PRODUCER, sale_id).await.unwrap();

    assert_eq!(h.sale_count().await, 0);
    assert_eq!(h.store.len(), 1, "object leaks, rows are gone");
}

#[tokio::test]
async fn deletion_requires_owning_producer() {
    let h = Harness::new().await;
    let sale_id = h.order(h.ids.potatoes_kg, 10, "kg").await;

    let err = h.engine.delete_sale(CUSTOMER, sale_id).await.unwrap_err();
    assert!(matches!(err, SaleError::Unauthorized(_)));

    let err = h.engine.delete_sale(OTHER_PRODUCER, sale_id).await.unwrap_err();
    assert!(matches!(err, SaleError::NotFound(_)));

    let err = h.engine.delete_sale(PRODUCER, 9_999).await.unwrap_err();
    assert!(matches!(err, SaleError::NotFound(_)));

    assert_eq!(h.sale_count().await, 1);
}

#[tokio::test]
async fn any_status_policy_deletes_approved_sales() {
    let h = Harness::new().await;
    let sale_id = h.order(h.ids.potatoes_kg, 10, "kg").await;
    h.advance(sale_id, SaleStatus::Approved).await;

    h.engine.delete_sale(PRODUCER, sale_id).await.unwrap();
    assert_eq!(h.sale_count().await, 0);
    // Committed stock is not returned
    assert_eq!(h.stock(h.ids.potatoes_kg).await, 4990);
}

#[tokio::test]
async fn before_approval_policy_protects_approved_sales() {
    let h = Harness::with_options(EngineOptions {
        deletion_policy: DeletionPolicy::BeforeApproval,
        ..EngineOptions::default()
    })
    .await;

    let approved = h.order(h.ids.potatoes_kg, 10, "kg").await;
    h.advance(approved, SaleStatus::Approved).await;
    let err = h.engine.delete_sale(PRODUCER, approved).await.unwrap_err();
    assert!(matches!(err, SaleError::InvalidTransition(_)));
    assert_eq!(err.status_code(), 409);

    let requested = h.order(h.ids.potatoes_kg, 10, "kg").await;
    h.engine.delete_sale(PRODUCER, requested).await.unwrap();

    assert_eq!(h.sale_count().await, 1);
}
