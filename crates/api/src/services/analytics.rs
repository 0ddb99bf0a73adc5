//! Dashboard analytics.
//!
//! Every metric compares a 30-day current window against the 30 days
//! that precede it, so the percentage deltas on the dashboard always
//! describe the same span of time. Only completed orders count toward
//! revenue, order volume, and active users.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use atelier_core::{ProductId, UserRole};

use super::guard::{Guard, RoleRequirement};
use crate::error::ApiError;
use crate::store::{OrderStore, ProductStore, TimeRange};

/// Window length for every dashboard metric.
const WINDOW_DAYS: i64 = 30;

/// Stock level at or below which a product appears on the low-stock
/// panel.
const LOW_STOCK_THRESHOLD: u32 = 50;

/// The current and previous reporting windows, fixed at the moment a
/// query runs so both are measured against the same instant.
#[derive(Debug, Clone, Copy)]
pub struct ReportingWindows {
    pub current: TimeRange,
    pub previous: TimeRange,
}

impl ReportingWindows {
    /// Windows anchored at `now`: the last 30 days, and the 30 days
    /// ending the day before the current window starts.
    #[must_use]
    pub fn compute(now: DateTime<Utc>) -> Self {
        let current_start = now - Duration::days(WINDOW_DAYS);
        let previous_end = current_start - Duration::days(1);
        let previous_start = previous_end - Duration::days(WINDOW_DAYS);
        Self {
            current: TimeRange {
                start: current_start,
                end: now,
            },
            previous: TimeRange {
                start: previous_start,
                end: previous_end,
            },
        }
    }
}

/// Period-over-period change as a percentage.
///
/// Two flat periods count as no change, and growth from a zero
/// baseline is reported as 100% rather than an undefined division.
#[must_use]
pub fn percent_change(previous: Decimal, current: Decimal) -> Decimal {
    if previous.is_zero() {
        if current.is_zero() {
            return Decimal::ZERO;
        }
        return Decimal::ONE_HUNDRED;
    }
    let change = (current - previous) / previous * Decimal::ONE_HUNDRED;
    if change.fract().is_zero() {
        change.normalize()
    } else {
        change.round_dp(2)
    }
}

/// Revenue over the current window with its period-over-period delta.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesMetrics {
    #[serde(with = "rust_decimal::serde::str")]
    pub sales: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub change_in_sales: Decimal,
}

/// Completed order volume with its period-over-period delta.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCountMetrics {
    pub orders: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub change_in_orders: Decimal,
}

/// Distinct purchasing users with the period-over-period delta.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUserMetrics {
    pub users: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub change_in_users: Decimal,
}

/// One day's completed-order revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySales {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::str")]
    pub sales: Decimal,
}

/// A product running low on stock.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockProduct {
    pub id: ProductId,
    pub title: String,
    pub sku: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero_img: Option<String>,
}

/// Completed order items tallied by product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

/// Admin dashboard queries.
pub struct AnalyticsService {
    orders: Arc<dyn OrderStore>,
    products: Arc<dyn ProductStore>,
    guard: Guard,
}

impl AnalyticsService {
    #[must_use]
    pub fn new(orders: Arc<dyn OrderStore>, products: Arc<dyn ProductStore>, guard: Guard) -> Self {
        Self {
            orders,
            products,
            guard,
        }
    }

    /// Revenue from completed orders over the last 30 days. Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::WrongUserType`] for non-admin callers.
    #[instrument(skip_all)]
    pub async fn sales_metrics(&self, token: Option<&str>) -> Result<SalesMetrics, ApiError> {
        self.require_admin(token)?;
        let windows = ReportingWindows::compute(Utc::now());
        let current = self.revenue_in(&windows.current).await?;
        let previous = self.revenue_in(&windows.previous).await?;
        Ok(SalesMetrics {
            sales: current.round_dp(2),
            change_in_sales: percent_change(previous, current),
        })
    }

    /// Completed order volume over the last 30 days. Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::WrongUserType`] for non-admin callers.
    #[instrument(skip_all)]
    pub async fn order_count_metrics(
        &self,
        token: Option<&str>,
    ) -> Result<OrderCountMetrics, ApiError> {
        self.require_admin(token)?;
        let windows = ReportingWindows::compute(Utc::now());
        let current = self.orders.completed_in(&windows.current).await?.len();
        let previous = self.orders.completed_in(&windows.previous).await?.len();
        Ok(OrderCountMetrics {
            orders: current as u64,
            change_in_orders: percent_change(Decimal::from(previous), Decimal::from(current)),
        })
    }

    /// Distinct users who completed an order in the last 30 days.
    /// Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::WrongUserType`] for non-admin callers.
    #[instrument(skip_all)]
    pub async fn active_user_metrics(
        &self,
        token: Option<&str>,
    ) -> Result<ActiveUserMetrics, ApiError> {
        self.require_admin(token)?;
        let windows = ReportingWindows::compute(Utc::now());
        let current = self.distinct_users_in(&windows.current).await?;
        let previous = self.distinct_users_in(&windows.previous).await?;
        Ok(ActiveUserMetrics {
            users: current,
            change_in_users: percent_change(Decimal::from(previous), Decimal::from(current)),
        })
    }

    /// Completed-order revenue per calendar day over the last 30 days,
    /// oldest day first. Days without sales are absent. Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::WrongUserType`] for non-admin callers.
    #[instrument(skip_all)]
    pub async fn sales_over_time(&self, token: Option<&str>) -> Result<Vec<DailySales>, ApiError> {
        self.require_admin(token)?;
        let windows = ReportingWindows::compute(Utc::now());
        let orders = self.orders.completed_in(&windows.current).await?;

        let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for order in orders {
            *by_day.entry(order.placed_at.date_naive()).or_default() += order.total;
        }
        Ok(by_day
            .into_iter()
            .map(|(date, sales)| DailySales {
                date,
                sales: sales.round_dp(2),
            })
            .collect())
    }

    /// Products at or below the low-stock threshold, scarcest first.
    /// Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::WrongUserType`] for non-admin callers.
    #[instrument(skip_all)]
    pub async fn low_stock_products(
        &self,
        token: Option<&str>,
    ) -> Result<Vec<LowStockProduct>, ApiError> {
        self.require_admin(token)?;
        Ok(self
            .products
            .low_stock(LOW_STOCK_THRESHOLD)
            .await?
            .into_iter()
            .map(|product| LowStockProduct {
                hero_img: product.hero_img().map(ToOwned::to_owned),
                id: product.id,
                title: product.title,
                sku: product.sku,
                quantity: product.quantity,
            })
            .collect())
    }

    /// Completed order line items over the last 30 days tallied by
    /// product category, largest category first. Each line item counts
    /// once regardless of its quantity; items whose product has been
    /// deleted are skipped. Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::WrongUserType`] for non-admin callers.
    #[instrument(skip_all)]
    pub async fn orders_by_category(
        &self,
        token: Option<&str>,
    ) -> Result<Vec<CategoryCount>, ApiError> {
        self.require_admin(token)?;
        let windows = ReportingWindows::compute(Utc::now());
        let items = self.orders.completed_items_in(&windows.current).await?;

        let ids: Vec<ProductId> = items.iter().map(|item| item.product_id.clone()).collect();
        let categories = self.products.categories_for(&ids).await?;

        let mut tally: BTreeMap<String, u64> = BTreeMap::new();
        for item in items {
            if let Some(category) = categories.get(&item.product_id) {
                *tally.entry(category.clone()).or_default() += 1;
            }
        }
        let mut counts: Vec<CategoryCount> = tally
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(counts)
    }

    fn require_admin(&self, token: Option<&str>) -> Result<(), ApiError> {
        self.guard
            .require(token, RoleRequirement::Role(UserRole::Admin))?;
        Ok(())
    }

    async fn revenue_in(&self, range: &TimeRange) -> Result<Decimal, ApiError> {
        let orders = self.orders.completed_in(range).await?;
        Ok(orders.into_iter().map(|order| order.total).sum())
    }

    async fn distinct_users_in(&self, range: &TimeRange) -> Result<u64, ApiError> {
        let orders = self.orders.completed_in(range).await?;
        let users: HashSet<_> = orders.into_iter().map(|order| order.user_id).collect();
        Ok(users.len() as u64)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration as StdDuration;

    use secrecy::SecretString;

    use atelier_core::{Color, Email, OrderStatus, Size, StockStatus, UserId};

    use crate::config::JwtConfig;
    use crate::error::ErrorCode;
    use crate::models::{Address, OrderItem, ProductImage};
    use crate::services::token::TokenService;
    use crate::store::{MemoryStore, NewOrder, NewProduct, NewUser, UserStore};

    use super::*;

    #[test]
    fn test_percent_change_flat_zero_is_zero() {
        assert_eq!(percent_change(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_percent_change_from_zero_baseline_is_hundred() {
        assert_eq!(
            percent_change(Decimal::ZERO, Decimal::new(42_50, 2)),
            Decimal::ONE_HUNDRED
        );
    }

    #[test]
    fn test_percent_change_growth() {
        assert_eq!(
            percent_change(Decimal::from(100), Decimal::from(150)),
            Decimal::from(50)
        );
    }

    #[test]
    fn test_percent_change_decline() {
        assert_eq!(
            percent_change(Decimal::from(200), Decimal::from(150)),
            Decimal::from(-25)
        );
    }

    #[test]
    fn test_percent_change_rounds_to_two_places() {
        // (110 - 90) / 90 * 100 = 22.222...
        assert_eq!(
            percent_change(Decimal::from(90), Decimal::from(110)),
            Decimal::new(22_22, 2)
        );
    }

    #[test]
    fn test_reporting_windows_do_not_overlap() {
        let now = Utc::now();
        let windows = ReportingWindows::compute(now);
        assert_eq!(windows.current.end, now);
        assert_eq!(windows.current.start, now - Duration::days(30));
        assert_eq!(
            windows.previous.end,
            windows.current.start - Duration::days(1)
        );
        assert_eq!(
            windows.previous.start,
            windows.previous.end - Duration::days(30)
        );
        assert!(windows.previous.end < windows.current.start);
    }

    struct Fixture {
        service: AnalyticsService,
        store: Arc<MemoryStore>,
        admin: String,
        customer: String,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenService::new(&JwtConfig {
            access_secret: SecretString::from("k2J8x!pQz4Wm9$vL1nR6tY3bF7cH0sDg"),
            refresh_secret: SecretString::from("u5E1y&aT8iO2p#sN4dK7fXq9lZ6wV3mB"),
            access_ttl: StdDuration::from_secs(900),
            refresh_ttl: StdDuration::from_secs(604_800),
        });
        let admin = tokens
            .issue_pair(&UserId::new("root"), UserRole::Admin)
            .unwrap()
            .access;
        let customer = tokens
            .issue_pair(&UserId::new("ada"), UserRole::Customer)
            .unwrap()
            .access;
        let guard = Guard::new(Arc::new(tokens));
        Fixture {
            service: AnalyticsService::new(
                Arc::clone(&store) as Arc<dyn OrderStore>,
                Arc::clone(&store) as Arc<dyn ProductStore>,
                guard,
            ),
            store,
            admin,
            customer,
        }
    }

    fn coat(quantity: u32) -> NewProduct {
        NewProduct {
            title: "Wool Coat".to_owned(),
            slug: "wool-coat".to_owned(),
            description: "A coat".to_owned(),
            colors: vec![Color::Black],
            sizes: vec![Size::M],
            price: Decimal::new(120_00, 2),
            category: "coats".to_owned(),
            quantity,
            sku: "WC-001".to_owned(),
            stock_status: StockStatus::InStock,
            featured: false,
            imgs: vec![ProductImage {
                id: atelier_core::ImageId::new("img-1"),
                url: "memory://images/img-1/front.jpg".to_owned(),
            }],
        }
    }

    fn order_item(product_id: &ProductId, quantity: u32) -> OrderItem {
        OrderItem {
            product_id: product_id.clone(),
            color: Color::Black,
            size: Size::M,
            quantity,
            price: Decimal::new(120_00, 2),
            img_url: "memory://images/img-1/front.jpg".to_owned(),
        }
    }

    fn completed_order(
        user: &str,
        items: Vec<OrderItem>,
        total: Decimal,
        placed_at: DateTime<Utc>,
    ) -> NewOrder {
        NewOrder {
            order_number: 1000,
            user_id: UserId::new(user),
            status: OrderStatus::Completed,
            items,
            subtotal: total,
            tax: Decimal::ZERO,
            total,
            shipping_address: Address {
                street: "1 Rue de Rivoli".to_owned(),
                city: "Paris".to_owned(),
                state: "IDF".to_owned(),
                postcode: "75001".to_owned(),
                country: "France".to_owned(),
            },
            placed_at,
        }
    }

    async fn seed_user(store: &MemoryStore, email: &str) {
        UserStore::insert(
            store,
            NewUser {
                first_name: "Ada".to_owned(),
                last_name: "Lovelace".to_owned(),
                email: Email::parse(email).unwrap(),
                role: UserRole::Customer,
                password_hash: Some("hash".to_owned()),
                google_id: None,
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_dashboard_queries_are_admin_only() {
        let f = fixture();
        let err = f.service.sales_metrics(Some(&f.customer)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::WrongUserType);
        let err = f.service.sales_over_time(None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::TokenMissing);
    }

    #[tokio::test]
    async fn test_sales_metrics_only_count_completed_orders_in_window() {
        let f = fixture();
        seed_user(f.store.as_ref(), "ada@example.com").await;
        let product = ProductStore::insert(f.store.as_ref(), coat(100)).await.unwrap();
        let now = Utc::now();

        let mut current = completed_order(
            "ada",
            vec![order_item(&product.id, 1)],
            Decimal::new(150_00, 2),
            now - Duration::days(3),
        );
        current.order_number = 1001;
        OrderStore::insert(f.store.as_ref(), current).await.unwrap();

        // Pending orders and orders outside the window do not count.
        let mut pending = completed_order(
            "ada",
            vec![order_item(&product.id, 1)],
            Decimal::new(999_00, 2),
            now - Duration::days(2),
        );
        pending.status = OrderStatus::Pending;
        pending.order_number = 1002;
        OrderStore::insert(f.store.as_ref(), pending).await.unwrap();

        let mut previous = completed_order(
            "ada",
            vec![order_item(&product.id, 1)],
            Decimal::new(100_00, 2),
            now - Duration::days(40),
        );
        previous.order_number = 1003;
        OrderStore::insert(f.store.as_ref(), previous).await.unwrap();

        let metrics = f.service.sales_metrics(Some(&f.admin)).await.unwrap();
        assert_eq!(metrics.sales, Decimal::new(150_00, 2));
        assert_eq!(metrics.change_in_sales, Decimal::from(50));
    }

    #[tokio::test]
    async fn test_active_users_are_distinct() {
        let f = fixture();
        let product = ProductStore::insert(f.store.as_ref(), coat(100)).await.unwrap();
        let now = Utc::now();

        for (n, user) in [(1, "ada"), (2, "ada"), (3, "eve")] {
            let mut order = completed_order(
                user,
                vec![order_item(&product.id, 1)],
                Decimal::new(120_00, 2),
                now - Duration::days(n),
            );
            order.order_number = 2000 + n as u64;
            OrderStore::insert(f.store.as_ref(), order).await.unwrap();
        }

        let metrics = f.service.active_user_metrics(Some(&f.admin)).await.unwrap();
        assert_eq!(metrics.users, 2);
        assert_eq!(metrics.change_in_users, Decimal::ONE_HUNDRED);
    }

    #[tokio::test]
    async fn test_sales_over_time_groups_by_day_ascending() {
        let f = fixture();
        let product = ProductStore::insert(f.store.as_ref(), coat(100)).await.unwrap();
        let now = Utc::now();
        let day_ago = now - Duration::days(1);
        let week_ago = now - Duration::days(7);

        for (n, placed_at) in [(1, day_ago), (2, day_ago), (3, week_ago)] {
            let mut order = completed_order(
                "ada",
                vec![order_item(&product.id, 1)],
                Decimal::new(100_00, 2),
                placed_at,
            );
            order.order_number = 3000 + n;
            OrderStore::insert(f.store.as_ref(), order).await.unwrap();
        }

        let series = f.service.sales_over_time(Some(&f.admin)).await.unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, week_ago.date_naive());
        assert_eq!(series[0].sales, Decimal::new(100_00, 2));
        assert_eq!(series[1].date, day_ago.date_naive());
        assert_eq!(series[1].sales, Decimal::new(200_00, 2));
    }

    #[tokio::test]
    async fn test_low_stock_threshold_and_ordering() {
        let f = fixture();
        let mut scarce = coat(3);
        scarce.slug = "scarce".to_owned();
        scarce.sku = "SC-001".to_owned();
        let mut at_threshold = coat(50);
        at_threshold.slug = "at-threshold".to_owned();
        at_threshold.sku = "AT-001".to_owned();
        let mut plentiful = coat(51);
        plentiful.slug = "plentiful".to_owned();
        plentiful.sku = "PL-001".to_owned();
        for product in [plentiful, at_threshold, scarce] {
            ProductStore::insert(f.store.as_ref(), product).await.unwrap();
        }

        let low = f.service.low_stock_products(Some(&f.admin)).await.unwrap();
        assert_eq!(low.len(), 2);
        assert_eq!(low[0].sku, "SC-001");
        assert_eq!(low[0].quantity, 3);
        assert_eq!(low[1].sku, "AT-001");
        assert!(low[0].hero_img.is_some());
    }

    #[tokio::test]
    async fn test_orders_by_category_skips_deleted_products() {
        let f = fixture();
        let coat_product = ProductStore::insert(f.store.as_ref(), coat(100)).await.unwrap();
        let mut scarf = coat(100);
        scarf.slug = "silk-scarf".to_owned();
        scarf.sku = "SS-001".to_owned();
        scarf.category = "accessories".to_owned();
        let scarf_product = ProductStore::insert(f.store.as_ref(), scarf).await.unwrap();
        let now = Utc::now();

        // Each line item counts once; quantities do not weigh the tally.
        let mut order = completed_order(
            "ada",
            vec![
                order_item(&coat_product.id, 2),
                order_item(&coat_product.id, 5),
                order_item(&scarf_product.id, 9),
                order_item(&ProductId::new("deleted"), 9),
            ],
            Decimal::new(360_00, 2),
            now - Duration::days(1),
        );
        order.order_number = 4000;
        OrderStore::insert(f.store.as_ref(), order).await.unwrap();

        let counts = f.service.orders_by_category(Some(&f.admin)).await.unwrap();
        assert_eq!(
            counts,
            vec![
                CategoryCount {
                    category: "coats".to_owned(),
                    count: 2,
                },
                CategoryCount {
                    category: "accessories".to_owned(),
                    count: 1,
                },
            ]
        );
    }
}
