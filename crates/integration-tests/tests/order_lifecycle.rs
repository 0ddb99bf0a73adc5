//! Order placement and fulfilment: stock reservation under
//! concurrency, rollback, number lookup, and the status state machine.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rust_decimal::Decimal;

use atelier_api::error::ErrorCode;
use atelier_api::models::{Address, OrderItem, Product};
use atelier_api::services::orders::CreateOrderInput;
use atelier_core::{Color, OrderStatus, Size, StockStatus};

use atelier_integration_tests::TestContext;

fn shipping_address() -> Address {
    Address {
        street: "1 Rue de Rivoli".to_owned(),
        city: "Paris".to_owned(),
        state: "IDF".to_owned(),
        postcode: "75001".to_owned(),
        country: "France".to_owned(),
    }
}

fn line(product: &Product, quantity: u32) -> OrderItem {
    OrderItem {
        product_id: product.id.clone(),
        color: Color::Black,
        size: Size::M,
        quantity,
        price: product.price,
        img_url: String::new(),
    }
}

fn order_for(lines: Vec<OrderItem>) -> CreateOrderInput {
    let subtotal: Decimal = lines
        .iter()
        .map(|item| item.price * Decimal::from(item.quantity))
        .sum();
    let tax = subtotal * Decimal::new(20, 2);
    CreateOrderInput {
        items: lines,
        subtotal,
        tax,
        total: subtotal + tax,
        shipping_address: shipping_address(),
    }
}

// ============================================================================
// Placement
// ============================================================================

#[tokio::test]
async fn test_create_order_then_lookup_by_number_round_trips() {
    let ctx = TestContext::new();
    let (_, session) = ctx.customer_session("ada@atelier.test").await;
    let product = ctx.seed_product("wool-coat", 10, Decimal::new(120_00, 2)).await;

    let input = order_for(vec![line(&product, 2)]);
    let expected_total = input.total;
    let placed = ctx.ops.create_order(session.access(), input).await.unwrap();
    assert_eq!(placed.status, OrderStatus::Pending);
    assert!(placed.order_number > 0);

    let found = ctx
        .ops
        .order_by_number(session.access(), placed.order_number)
        .await
        .unwrap();
    assert_eq!(found.id, placed.id);
    assert_eq!(found.total, expected_total);
    assert_eq!(found.subtotal + found.tax, found.total);

    // Stock went down by the ordered quantity.
    let after = ctx
        .ops
        .product(&product.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.quantity, 8);
}

#[tokio::test]
async fn test_order_totals_must_reconcile() {
    let ctx = TestContext::new();
    let (_, session) = ctx.customer_session("ada@atelier.test").await;
    let product = ctx.seed_product("wool-coat", 10, Decimal::new(120_00, 2)).await;

    let mut input = order_for(vec![line(&product, 1)]);
    input.total += Decimal::ONE;
    let err = ctx
        .ops
        .create_order(session.access(), input)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InputError);

    // The rejected order reserved nothing.
    let after = ctx.ops.product(&product.id).await.unwrap().unwrap();
    assert_eq!(after.quantity, 10);
}

#[tokio::test]
async fn test_failed_line_restocks_earlier_lines() {
    let ctx = TestContext::new();
    let (user_id, session) = ctx.customer_session("ada@atelier.test").await;
    let coat = ctx.seed_product("wool-coat", 10, Decimal::new(120_00, 2)).await;
    let scarf = ctx.seed_product("silk-scarf", 1, Decimal::new(45_00, 2)).await;

    let err = ctx
        .ops
        .create_order(
            session.access(),
            order_for(vec![line(&coat, 2), line(&scarf, 3)]),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InsufficientStock);

    // The coat reservation was rolled back and no order was written.
    let coat_after = ctx.ops.product(&coat.id).await.unwrap().unwrap();
    assert_eq!(coat_after.quantity, 10);
    let scarf_after = ctx.ops.product(&scarf.id).await.unwrap().unwrap();
    assert_eq!(scarf_after.quantity, 1);
    let orders = ctx
        .ops
        .user_orders(session.access(), &user_id)
        .await
        .unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_selling_out_flips_stock_status() {
    let ctx = TestContext::new();
    let (_, session) = ctx.customer_session("ada@atelier.test").await;
    let product = ctx.seed_product("wool-coat", 2, Decimal::new(120_00, 2)).await;

    ctx.ops
        .create_order(session.access(), order_for(vec![line(&product, 2)]))
        .await
        .unwrap();

    let after = ctx.ops.product(&product.id).await.unwrap().unwrap();
    assert_eq!(after.quantity, 0);
    assert_eq!(after.stock_status, StockStatus::OutOfStock);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn test_concurrent_orders_never_oversell() {
    let ctx = Arc::new(TestContext::new());
    let (_, ada) = ctx.customer_session("ada@atelier.test").await;
    let (_, eve) = ctx.customer_session("eve@atelier.test").await;
    let product = ctx.seed_product("wool-coat", 5, Decimal::new(120_00, 2)).await;

    let mut handles = Vec::new();
    for session in [ada, eve] {
        let ctx = Arc::clone(&ctx);
        let input = order_for(vec![line(&product, 3)]);
        handles.push(tokio::spawn(async move {
            ctx.ops.create_order(session.access(), input).await
        }));
    }

    let mut succeeded = 0u32;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(err) => assert_eq!(err.code(), ErrorCode::InsufficientStock),
        }
    }
    // Five in stock cannot satisfy two three-unit orders.
    assert!(succeeded <= 1);

    let after = ctx.ops.product(&product.id).await.unwrap().unwrap();
    assert_eq!(after.quantity, 5 - succeeded * 3);
}

// ============================================================================
// Status transitions
// ============================================================================

#[tokio::test]
async fn test_status_walk_through_fulfilment() {
    let ctx = TestContext::new();
    let admin = ctx.admin_session().await;
    let (_, session) = ctx.customer_session("ada@atelier.test").await;
    let product = ctx.seed_product("wool-coat", 10, Decimal::new(120_00, 2)).await;

    let placed = ctx
        .ops
        .create_order(session.access(), order_for(vec![line(&product, 1)]))
        .await
        .unwrap();

    for next in [
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Completed,
    ] {
        let status = ctx
            .ops
            .update_order_status(admin.access(), &placed.id, next)
            .await
            .unwrap();
        assert_eq!(status, next);
    }

    // Completed is terminal.
    let err = ctx
        .ops
        .update_order_status(admin.access(), &placed.id, OrderStatus::Refunded)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InputError);
}

#[tokio::test]
async fn test_pending_orders_cannot_skip_to_shipped() {
    let ctx = TestContext::new();
    let admin = ctx.admin_session().await;
    let (_, session) = ctx.customer_session("ada@atelier.test").await;
    let product = ctx.seed_product("wool-coat", 10, Decimal::new(120_00, 2)).await;

    let placed = ctx
        .ops
        .create_order(session.access(), order_for(vec![line(&product, 1)]))
        .await
        .unwrap();

    let err = ctx
        .ops
        .update_order_status(admin.access(), &placed.id, OrderStatus::Shipped)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InputError);

    // Cancellation from pending is allowed.
    ctx.ops
        .update_order_status(admin.access(), &placed.id, OrderStatus::Cancelled)
        .await
        .unwrap();
}
