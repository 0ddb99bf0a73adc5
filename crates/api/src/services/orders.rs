//! Order service.
//!
//! Order creation reserves stock line by line with an atomic
//! conditional decrement, so two concurrent orders can never jointly
//! over-sell a product. If a later line fails, the earlier lines'
//! units are restocked before the error is returned; no order document
//! is written on failure.

use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::instrument;

use atelier_core::{OrderId, OrderStatus, UserId, UserRole};

use super::guard::{Guard, RoleRequirement};
use crate::error::ApiError;
use crate::models::{Address, Order, OrderItem};
use crate::store::{NewOrder, OrderStore, ProductStore, UserStore};
use crate::validate::Validator;

/// Input for the create order mutation. New orders always start in
/// [`OrderStatus::Pending`].
#[derive(Debug)]
pub struct CreateOrderInput {
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub shipping_address: Address,
}

/// Order operations.
pub struct OrdersService {
    orders: Arc<dyn OrderStore>,
    products: Arc<dyn ProductStore>,
    users: Arc<dyn UserStore>,
    guard: Guard,
}

impl OrdersService {
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderStore>,
        products: Arc<dyn ProductStore>,
        users: Arc<dyn UserStore>,
        guard: Guard,
    ) -> Self {
        Self {
            orders,
            products,
            users,
            guard,
        }
    }

    /// The most recent orders, newest first. Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::WrongUserType`] for non-admin callers.
    pub async fn orders(&self, token: Option<&str>, limit: usize) -> Result<Vec<Order>, ApiError> {
        self.guard
            .require(token, RoleRequirement::Role(UserRole::Admin))?;
        Ok(self.orders.recent(limit).await?)
    }

    /// One user's order history. The owner may read their own; admins
    /// may read any.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::WrongUserType`] when the caller may not act
    /// for the user and [`ApiError::UserNotFound`] for an unknown user.
    pub async fn user_orders(
        &self,
        token: Option<&str>,
        user_id: &UserId,
    ) -> Result<Vec<Order>, ApiError> {
        let caller = self.guard.require(token, RoleRequirement::Any)?;
        if !caller.can_act_for(user_id) {
            return Err(ApiError::WrongUserType);
        }

        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(ApiError::UserNotFound);
        }
        Ok(self.orders.find_by_user(user_id).await?)
    }

    /// Look up an order by its human-facing number.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Input`] for a zero order number and
    /// [`ApiError::NotFound`] when no order matches.
    pub async fn order_by_number(
        &self,
        token: Option<&str>,
        order_number: u64,
    ) -> Result<Order, ApiError> {
        self.guard.require(token, RoleRequirement::Any)?;
        if order_number == 0 {
            return Err(ApiError::Input("order number not provided".to_owned()));
        }
        self.orders
            .find_by_number(order_number)
            .await?
            .ok_or_else(|| ApiError::NotFound("order".to_owned()))
    }

    /// Place an order for the calling customer.
    ///
    /// Stock is reserved per line with an atomic conditional decrement;
    /// on any line's failure the already reserved lines are restocked
    /// and the whole order fails with [`ApiError::InsufficientStock`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] on malformed input,
    /// [`ApiError::Input`] when totals do not reconcile,
    /// [`ApiError::NotFound`] for an unknown product line, and
    /// [`ApiError::InsufficientStock`] when a line exceeds stock.
    #[instrument(skip_all, fields(lines = input.items.len()))]
    pub async fn create_order(
        &self,
        token: Option<&str>,
        input: CreateOrderInput,
    ) -> Result<Order, ApiError> {
        let caller = self
            .guard
            .require(token, RoleRequirement::Role(UserRole::Customer))?;

        let mut v = Validator::new();
        v.require_choice("items", &input.items)
            .require_positive_amount("total", input.total)
            .require("street", &input.shipping_address.street)
            .require("city", &input.shipping_address.city)
            .require("country", &input.shipping_address.country);
        v.finish()?;

        if input.subtotal + input.tax != input.total {
            return Err(ApiError::Input(
                "order total must equal subtotal plus tax".to_owned(),
            ));
        }

        let items = input.items;
        self.reserve_stock(&items).await?;

        let order = NewOrder {
            order_number: new_order_number(),
            user_id: caller.user_id,
            status: OrderStatus::Pending,
            items: items.clone(),
            subtotal: input.subtotal,
            tax: input.tax,
            total: input.total,
            shipping_address: input.shipping_address,
            placed_at: Utc::now(),
        };

        match self.orders.insert(order).await {
            Ok(order) => Ok(order),
            Err(err) => {
                // The reservation must not outlive a failed insert.
                let reserved: Vec<&OrderItem> = items.iter().collect();
                self.restock(&reserved).await;
                Err(err.into())
            }
        }
    }

    /// Advance an order's status. Admin only.
    ///
    /// Only forward transitions along
    /// `PENDING -> PROCESSING -> SHIPPED -> COMPLETED` are allowed,
    /// plus a jump to a terminal alternate (`CANCELLED`, `FAILED`,
    /// `REFUNDED`) from any non-terminal state.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown order and
    /// [`ApiError::Input`] for an illegal transition.
    #[instrument(skip_all, fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        token: Option<&str>,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<OrderStatus, ApiError> {
        self.guard
            .require(token, RoleRequirement::Role(UserRole::Admin))?;

        let order = self
            .orders
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("order".to_owned()))?;

        if !order.status.can_transition_to(status) {
            return Err(ApiError::Input(format!(
                "cannot move order from {} to {status}",
                order.status
            )));
        }

        if self.orders.set_status(id, status).await? {
            Ok(status)
        } else {
            Err(ApiError::NotFound("order".to_owned()))
        }
    }

    /// Reserve stock for every line, unwinding on failure.
    async fn reserve_stock(&self, items: &[OrderItem]) -> Result<(), ApiError> {
        let mut reserved: Vec<&OrderItem> = Vec::with_capacity(items.len());
        for item in items {
            let ok = match self.products.try_decrement_stock(&item.product_id, item.quantity).await
            {
                Ok(ok) => ok,
                Err(err) => {
                    self.restock(&reserved).await;
                    return Err(match err {
                        crate::store::StoreError::NotFound => {
                            ApiError::NotFound("product".to_owned())
                        }
                        other => other.into(),
                    });
                }
            };

            if ok {
                reserved.push(item);
                continue;
            }

            let available = self
                .products
                .find_by_id(&item.product_id)
                .await
                .ok()
                .flatten()
                .map_or(0, |product| product.quantity);
            self.restock(&reserved).await;
            return Err(ApiError::InsufficientStock {
                product_id: item.product_id.as_str().to_owned(),
                requested: item.quantity,
                available,
            });
        }
        Ok(())
    }

    async fn restock(&self, reserved: &[&OrderItem]) {
        for item in reserved {
            if let Err(err) = self.products.restock(&item.product_id, item.quantity).await {
                tracing::error!(
                    product_id = %item.product_id,
                    quantity = item.quantity,
                    error = %err,
                    "failed to restock after aborted order"
                );
            }
        }
    }
}

/// Human-facing order number: epoch millis plus a random suffix.
fn new_order_number() -> u64 {
    let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
    millis + rand::rng().random_range(0..1000)
}
