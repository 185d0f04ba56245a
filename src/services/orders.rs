use crate::{
    auth::AuthUser,
    common::money,
    db::DbPool,
    entities::{order, order_item, product, user},
    errors::ServiceError,
    events::{EventBus, StoreEvent},
    services::{payments::PaymentReceipt, products::with_reviews},
};
use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("negative_amount");
        err.message = Some("Amounts cannot be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Cart line as sent by the checkout page
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product: Uuid,
    #[validate(length(min = 1, message = "Item name is required"))]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub qty: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "No order items"))]
    pub order_items: Vec<OrderItemInput>,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = f64)]
    pub items_price: Decimal,
    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = f64)]
    pub tax_price: Decimal,
    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = f64)]
    pub shipping_price: Decimal,
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = f64)]
    pub total_price: Decimal,
}

fn default_payment_method() -> String {
    "Stripe".to_string()
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    pub is_paid: Option<bool>,
    pub is_delivered: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product: Uuid,
    pub name: String,
    pub image: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub qty: i32,
}

impl From<order_item::Model> for OrderItemResponse {
    fn from(item: order_item::Model) -> Self {
        Self {
            product: item.product_id,
            name: item.name,
            image: item.image,
            price: money(item.price),
            qty: item.qty,
        }
    }
}

/// Owner reference: a bare id on the shopper's own listing, a profile on
/// single-order and admin views.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum OrderUser {
    Id(Uuid),
    Profile {
        #[serde(rename = "_id")]
        id: Uuid,
        name: String,
        email: String,
    },
}

impl OrderUser {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Id(id) | Self::Profile { id, .. } => *id,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: OrderUser,
    pub order_items: Vec<OrderItemResponse>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub items_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub tax_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub shipping_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_price: Decimal,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub payment_provider: Option<String>,
    pub paypal_order_id: Option<String>,
    #[schema(value_type = Object)]
    pub payment_result: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderResponse {
    fn from_parts(model: order::Model, items: Vec<order_item::Model>, owner: Option<&user::Model>) -> Self {
        let user = match owner {
            Some(u) => OrderUser::Profile {
                id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
            },
            None => OrderUser::Id(model.user_id),
        };
        let shipping_address =
            serde_json::from_value(model.shipping_address.clone()).unwrap_or_default();

        Self {
            id: model.id,
            user,
            order_items: items.into_iter().map(OrderItemResponse::from).collect(),
            shipping_address,
            payment_method: model.payment_method,
            items_price: money(model.items_price),
            tax_price: money(model.tax_price),
            shipping_price: money(model.shipping_price),
            total_price: money(model.total_price),
            is_paid: model.is_paid,
            paid_at: model.paid_at,
            is_delivered: model.is_delivered,
            delivered_at: model.delivered_at,
            payment_provider: model.payment_provider,
            paypal_order_id: model.paypal_order_id,
            payment_result: model.payment_result,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Result of the central payment commit
#[derive(Debug, Clone)]
pub enum MarkPaid {
    /// This call moved the order from unpaid to paid
    Paid(OrderResponse),
    /// Another confirmation got there first; nothing was written
    AlreadyPaid(OrderResponse),
}

impl MarkPaid {
    pub fn into_order(self) -> OrderResponse {
        match self {
            Self::Paid(order) | Self::AlreadyPaid(order) => order,
        }
    }
}

/// Checkout, order reads, admin status changes and the payment commit
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    events: Arc<dyn EventBus>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, events: Arc<dyn EventBus>) -> Self {
        Self { db_pool, events }
    }

    /// Persists an unpaid order and takes its items out of stock.
    ///
    /// The order, its lines and every stock write share one transaction.
    /// Events go out only after commit.
    #[instrument(skip(self, user, request), fields(user_id = %user.user_id, items = request.order_items.len()))]
    pub async fn create_order(
        &self,
        user: &AuthUser,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;
        for item in &request.order_items {
            item.validate()?;
        }
        flag_untrusted_totals(&request);

        let db = &*self.db_pool;
        let order_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let order_model = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(user.user_id),
            shipping_address: Set(serde_json::to_value(&request.shipping_address)?),
            payment_method: Set(request.payment_method.clone()),
            items_price: Set(request.items_price),
            tax_price: Set(request.tax_price),
            shipping_price: Set(request.shipping_price),
            total_price: Set(request.total_price),
            is_paid: Set(false),
            paid_at: Set(None),
            is_delivered: Set(false),
            delivered_at: Set(None),
            payment_provider: Set(None),
            stripe_payment_intent_id: Set(None),
            paypal_order_id: Set(None),
            payment_result: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to insert order");
            ServiceError::DatabaseError(e)
        })?;

        let mut items = Vec::with_capacity(request.order_items.len());
        for (position, item) in request.order_items.iter().enumerate() {
            let line = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(item.product),
                position: Set(position as i32),
                name: Set(item.name.clone()),
                image: Set(item.image.clone()),
                price: Set(item.price),
                qty: Set(item.qty),
            }
            .insert(&txn)
            .await?;
            items.push(line);
        }

        let touched = decrement_stock(&txn, &request.order_items).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order transaction");
            ServiceError::DatabaseError(e)
        })?;

        for product in with_reviews(db, touched).await? {
            self.events.publish(&StoreEvent::product_updated(&product));
        }

        let response = OrderResponse::from_parts(order_model, items, None);
        self.events.publish(&StoreEvent::order_created(&response));
        counter!("saria_orders.created", 1);
        info!(order_id = %order_id, total = %response.total_price, "Order created");

        Ok(response)
    }

    /// Single order for its owner or an admin
    #[instrument(skip(self, viewer), fields(order_id = %order_id))]
    pub async fn get_order(
        &self,
        order_id: Uuid,
        viewer: &AuthUser,
    ) -> Result<OrderResponse, ServiceError> {
        let model = self.find_model(order_id).await?;
        if !viewer.can_access(model.user_id) {
            return Err(ServiceError::Forbidden(
                "Not authorized to view this order".to_string(),
            ));
        }
        let owner = user::Entity::find_by_id(model.user_id)
            .one(&*self.db_pool)
            .await?;
        self.hydrate_one(model, owner.as_ref()).await
    }

    /// Orders placed by `user_id`, newest first
    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderResponse>, ServiceError> {
        let orders = order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;
        self.hydrate(orders, &HashMap::new()).await
    }

    /// Every order with its owner's name and email, newest first
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;
        let orders = order::Entity::find()
            .order_by_desc(order::Column::CreatedAt)
            .all(db)
            .await?;

        let mut owner_ids: Vec<Uuid> = orders.iter().map(|o| o.user_id).collect();
        owner_ids.sort();
        owner_ids.dedup();
        let owners: HashMap<Uuid, user::Model> = user::Entity::find()
            .filter(user::Column::Id.is_in(owner_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        self.hydrate(orders, &owners).await
    }

    /// Admin override of the paid/delivered flags
    #[instrument(skip(self, request), fields(order_id = %order_id, is_paid = ?request.is_paid, is_delivered = ?request.is_delivered))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        request: UpdateOrderStatusRequest,
    ) -> Result<OrderResponse, ServiceError> {
        let existing = self.find_model(order_id).await?;
        let now = Utc::now();
        let newly_delivered = request.is_delivered == Some(true) && !existing.is_delivered;

        let mut active: order::ActiveModel = existing.clone().into();
        if let Some(paid) = request.is_paid {
            active.is_paid = Set(paid);
            active.paid_at = Set(paid.then(|| {
                existing
                    .paid_at
                    .filter(|_| existing.is_paid)
                    .unwrap_or(now)
            }));
        }
        if let Some(delivered) = request.is_delivered {
            active.is_delivered = Set(delivered);
            active.delivered_at = Set(delivered.then(|| {
                existing
                    .delivered_at
                    .filter(|_| existing.is_delivered)
                    .unwrap_or(now)
            }));
        }

        let saved = active.update(&*self.db_pool).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to update order status");
            ServiceError::DatabaseError(e)
        })?;

        let response = self.hydrate_one(saved, None).await?;
        self.events.publish(&StoreEvent::order_updated(&response));

        if newly_delivered {
            let short: String = order_id.simple().to_string().chars().take(8).collect();
            let note = format!("Good news! Your order #{} has been delivered.", short);
            self.events.publish(
                &StoreEvent::assistant("order_update", &note)
                    .with_field("userId", response.user.id().to_string())
                    .with_field("orderId", order_id.to_string()),
            );
        }

        info!(order_id = %order_id, "Order status updated");
        Ok(response)
    }

    /// Commits a confirmed payment exactly once.
    ///
    /// The write is conditional on `is_paid = false`, so when a webhook and a
    /// client confirmation race only one of them transitions the order.
    #[instrument(skip(self, receipt), fields(order_id = %order_id, provider = %receipt.provider))]
    pub async fn mark_paid(
        &self,
        order_id: Uuid,
        receipt: PaymentReceipt,
    ) -> Result<MarkPaid, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let mut update = order::Entity::update_many()
            .col_expr(order::Column::IsPaid, Expr::value(true))
            .col_expr(order::Column::PaidAt, Expr::value(now))
            .col_expr(
                order::Column::PaymentProvider,
                Expr::value(receipt.provider.as_str()),
            )
            .col_expr(
                order::Column::PaymentResult,
                Expr::value(receipt.payment_result(now)),
            )
            .col_expr(order::Column::UpdatedAt, Expr::value(now));
        update = match receipt.provider {
            super::payments::PaymentProvider::Stripe => update.col_expr(
                order::Column::StripePaymentIntentId,
                Expr::value(receipt.reference.clone()),
            ),
            super::payments::PaymentProvider::PayPal => update.col_expr(
                order::Column::PaypalOrderId,
                Expr::value(receipt.reference.clone()),
            ),
        };

        let result = update
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::IsPaid.eq(false))
            .exec(db)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    warn!(order_id = %order_id, reference = %receipt.reference, "Payment reference already used");
                    ServiceError::BadRequest(
                        "Payment already used for another order".to_string(),
                    )
                }
                _ => {
                    error!(error = %e, order_id = %order_id, "Failed to mark order paid");
                    ServiceError::DatabaseError(e)
                }
            })?;

        let model = self.find_model(order_id).await?;
        let response = self.hydrate_one(model, None).await?;

        if result.rows_affected == 0 {
            info!(order_id = %order_id, "Order already paid, confirmation ignored");
            return Ok(MarkPaid::AlreadyPaid(response));
        }

        self.events.publish(&StoreEvent::order_updated(&response));
        counter!("saria_payments.committed", 1, "provider" => receipt.provider.as_str());
        info!(order_id = %order_id, reference = %receipt.reference, "Order marked paid");
        Ok(MarkPaid::Paid(response))
    }

    /// Stores the PaymentIntent created for an unpaid order
    pub async fn attach_stripe_intent(
        &self,
        order_id: Uuid,
        intent_id: &str,
    ) -> Result<(), ServiceError> {
        order::Entity::update_many()
            .col_expr(
                order::Column::StripePaymentIntentId,
                Expr::value(intent_id.to_string()),
            )
            .col_expr(order::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::IsPaid.eq(false))
            .exec(&*self.db_pool)
            .await?;
        Ok(())
    }

    /// Records a provider failure on an unpaid order. Returns whether the
    /// order was still unpaid.
    pub async fn record_payment_failure(
        &self,
        order_id: Uuid,
        detail: Value,
    ) -> Result<bool, ServiceError> {
        let result = order::Entity::update_many()
            .col_expr(order::Column::PaymentResult, Expr::value(detail))
            .col_expr(order::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::IsPaid.eq(false))
            .exec(&*self.db_pool)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn find_model(&self, order_id: Uuid) -> Result<order::Model, ServiceError> {
        order::Entity::find_by_id(order_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))
    }

    pub async fn find_by_stripe_intent(
        &self,
        intent_id: &str,
    ) -> Result<Option<order::Model>, ServiceError> {
        Ok(order::Entity::find()
            .filter(order::Column::StripePaymentIntentId.eq(intent_id))
            .one(&*self.db_pool)
            .await?)
    }

    pub async fn find_by_paypal_order(
        &self,
        paypal_order_id: &str,
    ) -> Result<Option<order::Model>, ServiceError> {
        Ok(order::Entity::find()
            .filter(order::Column::PaypalOrderId.eq(paypal_order_id))
            .one(&*self.db_pool)
            .await?)
    }

    /// Loads an order the caller may act on, 403 for other users' orders
    pub async fn find_owned(
        &self,
        order_id: Uuid,
        viewer: &AuthUser,
    ) -> Result<order::Model, ServiceError> {
        let model = self.find_model(order_id).await?;
        if !viewer.can_access(model.user_id) {
            return Err(ServiceError::Forbidden(
                "Not authorized to pay for this order".to_string(),
            ));
        }
        Ok(model)
    }

    async fn hydrate_one(
        &self,
        model: order::Model,
        owner: Option<&user::Model>,
    ) -> Result<OrderResponse, ServiceError> {
        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(model.id))
            .order_by_asc(order_item::Column::Position)
            .all(&*self.db_pool)
            .await?;
        Ok(OrderResponse::from_parts(model, items, owner))
    }

    async fn hydrate(
        &self,
        orders: Vec<order::Model>,
        owners: &HashMap<Uuid, user::Model>,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut lines: HashMap<Uuid, Vec<order_item::Model>> = HashMap::new();
        for item in order_item::Entity::find()
            .filter(order_item::Column::OrderId.is_in(ids))
            .order_by_asc(order_item::Column::Position)
            .all(&*self.db_pool)
            .await?
        {
            lines.entry(item.order_id).or_default().push(item);
        }

        Ok(orders
            .into_iter()
            .map(|o| {
                let items = lines.remove(&o.id).unwrap_or_default();
                let owner = owners.get(&o.user_id);
                OrderResponse::from_parts(o, items, owner)
            })
            .collect())
    }
}

/// Totals come from the client and are stored as sent. Mismatches are logged
/// so they can be audited.
fn flag_untrusted_totals(request: &CreateOrderRequest) {
    let lines: Decimal = request
        .order_items
        .iter()
        .map(|i| i.price * Decimal::from(i.qty))
        .sum();
    let expected_total = request.items_price + request.tax_price + request.shipping_price;

    if money(lines) != money(request.items_price) || money(expected_total) != money(request.total_price) {
        warn!(
            price_mismatch = true,
            line_sum = %lines,
            items_price = %request.items_price,
            total_price = %request.total_price,
            "Client-submitted totals do not add up"
        );
    }
}

/// Takes each line out of stock, clamping at zero. Products that no longer
/// exist are skipped. Returns the touched products as they are after the
/// writes, in first-seen order.
async fn decrement_stock<C: ConnectionTrait>(
    conn: &C,
    items: &[OrderItemInput],
) -> Result<Vec<product::Model>, DbErr> {
    let now = Utc::now();
    let mut touched: Vec<Uuid> = Vec::new();

    for item in items {
        let decremented = product::Entity::update_many()
            .col_expr(
                product::Column::CountInStock,
                Expr::col(product::Column::CountInStock).sub(item.qty),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(now))
            .filter(product::Column::Id.eq(item.product))
            .filter(product::Column::CountInStock.gte(item.qty))
            .exec(conn)
            .await?;

        if decremented.rows_affected == 0 {
            let clamped = product::Entity::update_many()
                .col_expr(product::Column::CountInStock, Expr::value(0))
                .col_expr(product::Column::UpdatedAt, Expr::value(now))
                .filter(product::Column::Id.eq(item.product))
                .exec(conn)
                .await?;
            if clamped.rows_affected == 0 {
                warn!(product_id = %item.product, "Ordered product no longer exists, stock untouched");
                continue;
            }
        }

        if !touched.contains(&item.product) {
            touched.push(item.product);
        }
    }

    if touched.is_empty() {
        return Ok(Vec::new());
    }

    let mut products: HashMap<Uuid, product::Model> = product::Entity::find()
        .filter(product::Column::Id.is_in(touched.clone()))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    Ok(touched.iter().filter_map(|id| products.remove(id)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::InProcessEventBus;
    use crate::services::payments::PaymentProvider;
    use crate::services::testing::{auth_user, memory_db, seed_product, seed_user};
    use futures::StreamExt;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn cart(product: Uuid, price: Decimal, qty: i32) -> CreateOrderRequest {
        let items_price = price * Decimal::from(qty);
        CreateOrderRequest {
            order_items: vec![OrderItemInput {
                product,
                name: "Argan Oil".to_string(),
                image: "/images/argan.jpg".to_string(),
                price,
                qty,
            }],
            shipping_address: ShippingAddress {
                address: "1 Palm St".to_string(),
                city: "Dubai".to_string(),
                postal_code: "00000".to_string(),
                country: "AE".to_string(),
            },
            payment_method: "Stripe".to_string(),
            items_price,
            tax_price: Decimal::ZERO,
            shipping_price: Decimal::ZERO,
            total_price: items_price,
        }
    }

    async fn service() -> (OrderService, Arc<InProcessEventBus>, Arc<DbPool>) {
        let db = Arc::new(memory_db().await);
        let bus = Arc::new(InProcessEventBus::new(32));
        let service = OrderService::new(db.clone(), bus.clone());
        (service, bus, db)
    }

    fn stripe_receipt(reference: &str) -> PaymentReceipt {
        PaymentReceipt {
            provider: PaymentProvider::Stripe,
            reference: reference.to_string(),
            status: "succeeded".to_string(),
            payer_email: None,
        }
    }

    #[tokio::test]
    async fn empty_cart_is_rejected() {
        let (service, _, db) = service().await;
        let owner = seed_user(&db, "buyer@example.com", false).await;
        let mut request = cart(Uuid::new_v4(), dec!(20), 1);
        request.order_items.clear();

        let err = service.create_order(&auth_user(&owner), request).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(ref m) if m == "No order items"));
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() {
        let (service, _, db) = service().await;
        let owner = seed_user(&db, "buyer@example.com", false).await;
        let request = cart(Uuid::new_v4(), dec!(20), 0);

        let err = service.create_order(&auth_user(&owner), request).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn create_order_decrements_stock_and_broadcasts_after_commit() {
        let (service, bus, db) = service().await;
        let owner = seed_user(&db, "buyer@example.com", false).await;
        let product = seed_product(&db, "Argan Oil", dec!(20), 5).await;
        let mut events = bus.subscribe();

        let order = service
            .create_order(&auth_user(&owner), cart(product.id, dec!(20), 2))
            .await
            .unwrap();

        assert!(!order.is_paid);
        assert_eq!(order.total_price.to_string(), "40.00");
        assert_eq!(order.order_items.len(), 1);

        let stock = product::Entity::find_by_id(product.id)
            .one(&*db)
            .await
            .unwrap()
            .unwrap()
            .count_in_stock;
        assert_eq!(stock, 3);

        let first: Value = serde_json::from_str(&events.next().await.unwrap()).unwrap();
        assert_eq!(first["type"], "product_updated");
        assert_eq!(first["product"]["countInStock"], 3);
        let second: Value = serde_json::from_str(&events.next().await.unwrap()).unwrap();
        assert_eq!(second["type"], "order_created");
        assert_eq!(second["order"]["_id"], order.id.to_string());
    }

    #[tokio::test]
    async fn oversold_stock_clamps_at_zero_and_missing_products_are_skipped() {
        let (service, _, db) = service().await;
        let owner = seed_user(&db, "buyer@example.com", false).await;
        let product = seed_product(&db, "Rose Water", dec!(10), 1).await;
        let mut request = cart(product.id, dec!(10), 4);
        request.order_items.push(OrderItemInput {
            product: Uuid::new_v4(),
            name: "Discontinued".to_string(),
            image: String::new(),
            price: dec!(5),
            qty: 1,
        });

        let order = service.create_order(&auth_user(&owner), request).await.unwrap();
        assert_eq!(order.order_items.len(), 2);

        let stock = product::Entity::find_by_id(product.id)
            .one(&*db)
            .await
            .unwrap()
            .unwrap()
            .count_in_stock;
        assert_eq!(stock, 0);
    }

    #[tokio::test]
    async fn mark_paid_transitions_exactly_once() {
        let (service, bus, db) = service().await;
        let owner = seed_user(&db, "buyer@example.com", false).await;
        let product = seed_product(&db, "Argan Oil", dec!(20), 5).await;
        let order = service
            .create_order(&auth_user(&owner), cart(product.id, dec!(20), 1))
            .await
            .unwrap();
        let mut events = bus.subscribe();

        let first = service.mark_paid(order.id, stripe_receipt("pi_1")).await.unwrap();
        let second = service.mark_paid(order.id, stripe_receipt("pi_2")).await.unwrap();

        let paid = match first {
            MarkPaid::Paid(o) => o,
            other => panic!("expected Paid, got {:?}", other),
        };
        assert!(paid.is_paid);
        assert_eq!(paid.payment_provider.as_deref(), Some("stripe"));
        assert!(matches!(second, MarkPaid::AlreadyPaid(_)));

        let stored = service.find_model(order.id).await.unwrap();
        assert_eq!(stored.stripe_payment_intent_id.as_deref(), Some("pi_1"));

        let frame: Value = serde_json::from_str(&events.next().await.unwrap()).unwrap();
        assert_eq!(frame["type"], "order_updated");
        let extra = tokio::time::timeout(Duration::from_millis(50), events.next()).await;
        assert!(extra.is_err(), "AlreadyPaid must not broadcast");
    }

    #[tokio::test]
    async fn concurrent_confirmations_have_one_winner() {
        let (service, _, db) = service().await;
        let owner = seed_user(&db, "buyer@example.com", false).await;
        let product = seed_product(&db, "Argan Oil", dec!(20), 5).await;
        let order = service
            .create_order(&auth_user(&owner), cart(product.id, dec!(20), 1))
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            service.mark_paid(order.id, stripe_receipt("pi_a")),
            service.mark_paid(order.id, stripe_receipt("pi_b")),
        );
        let winners = [a.unwrap(), b.unwrap()]
            .iter()
            .filter(|r| matches!(r, MarkPaid::Paid(_)))
            .count();
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn paypal_reference_is_unique_across_orders() {
        let (service, _, db) = service().await;
        let owner = seed_user(&db, "buyer@example.com", false).await;
        let product = seed_product(&db, "Argan Oil", dec!(20), 5).await;
        let first = service
            .create_order(&auth_user(&owner), cart(product.id, dec!(20), 1))
            .await
            .unwrap();
        let second = service
            .create_order(&auth_user(&owner), cart(product.id, dec!(20), 1))
            .await
            .unwrap();
        let receipt = PaymentReceipt {
            provider: PaymentProvider::PayPal,
            reference: "CAPTURE1".to_string(),
            status: "COMPLETED".to_string(),
            payer_email: None,
        };

        service.mark_paid(first.id, receipt.clone()).await.unwrap();
        let err = service.mark_paid(second.id, receipt).await.unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));

        let stored = service.find_model(second.id).await.unwrap();
        assert!(!stored.is_paid);
        let owner_of_capture = service.find_by_paypal_order("CAPTURE1").await.unwrap();
        assert_eq!(owner_of_capture.map(|o| o.id), Some(first.id));
    }

    #[tokio::test]
    async fn other_customers_cannot_read_an_order() {
        let (service, _, db) = service().await;
        let owner = seed_user(&db, "buyer@example.com", false).await;
        let stranger = seed_user(&db, "other@example.com", false).await;
        let admin = seed_user(&db, "admin@example.com", true).await;
        let product = seed_product(&db, "Argan Oil", dec!(20), 5).await;
        let order = service
            .create_order(&auth_user(&owner), cart(product.id, dec!(20), 1))
            .await
            .unwrap();

        let denied = service.get_order(order.id, &auth_user(&stranger)).await.unwrap_err();
        assert!(matches!(denied, ServiceError::Forbidden(_)));

        let seen = service.get_order(order.id, &auth_user(&admin)).await.unwrap();
        assert!(matches!(seen.user, OrderUser::Profile { ref email, .. } if email == "buyer@example.com"));

        let missing = service.get_order(Uuid::new_v4(), &auth_user(&owner)).await.unwrap_err();
        assert!(matches!(missing, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_status_sets_and_clears_timestamps() {
        let (service, bus, db) = service().await;
        let owner = seed_user(&db, "buyer@example.com", false).await;
        let product = seed_product(&db, "Argan Oil", dec!(20), 5).await;
        let order = service
            .create_order(&auth_user(&owner), cart(product.id, dec!(20), 1))
            .await
            .unwrap();
        let mut events = bus.subscribe();

        let delivered = service
            .update_status(
                order.id,
                UpdateOrderStatusRequest {
                    is_paid: None,
                    is_delivered: Some(true),
                },
            )
            .await
            .unwrap();
        assert!(delivered.is_delivered);
        assert!(delivered.delivered_at.is_some());
        assert!(!delivered.is_paid);

        let updated: Value = serde_json::from_str(&events.next().await.unwrap()).unwrap();
        assert_eq!(updated["type"], "order_updated");
        let note: Value = serde_json::from_str(&events.next().await.unwrap()).unwrap();
        assert_eq!(note["channel"], "assistant");
        assert_eq!(note["type"], "order_update");
        assert_eq!(note["userId"], owner.id.to_string());

        let undone = service
            .update_status(
                order.id,
                UpdateOrderStatusRequest {
                    is_paid: None,
                    is_delivered: Some(false),
                },
            )
            .await
            .unwrap();
        assert!(!undone.is_delivered);
        assert!(undone.delivered_at.is_none());
    }

    #[tokio::test]
    async fn orders_round_trip_with_line_snapshots() {
        let (service, _, db) = service().await;
        let owner = seed_user(&db, "buyer@example.com", false).await;
        let a = seed_product(&db, "Argan Oil", dec!(20), 10).await;
        let b = seed_product(&db, "Rose Water", dec!(12.5), 10).await;
        let mut request = cart(a.id, dec!(20), 2);
        request.order_items.push(OrderItemInput {
            product: b.id,
            name: "Rose Water".to_string(),
            image: String::new(),
            price: dec!(12.5),
            qty: 3,
        });
        request.items_price = dec!(77.5);
        request.total_price = dec!(77.5);

        let created = service.create_order(&auth_user(&owner), request).await.unwrap();
        let mine = service.list_for_user(owner.id).await.unwrap();

        assert_eq!(mine.len(), 1);
        let fetched = &mine[0];
        assert_eq!(fetched.id, created.id);
        let lines: Vec<(Uuid, String, i32)> = fetched
            .order_items
            .iter()
            .map(|i| (i.product, i.price.to_string(), i.qty))
            .collect();
        assert_eq!(
            lines,
            vec![(a.id, "20.00".to_string(), 2), (b.id, "12.50".to_string(), 3)]
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]
        #[test]
        fn stock_never_goes_negative(stock in 0i32..50, qty in 1i32..80) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let remaining = rt.block_on(async move {
                let (service, _, db) = service().await;
                let owner = seed_user(&db, "buyer@example.com", false).await;
                let product = seed_product(&db, "Argan Oil", dec!(20), stock).await;
                service
                    .create_order(&auth_user(&owner), cart(product.id, dec!(20), qty))
                    .await
                    .unwrap();
                product::Entity::find_by_id(product.id)
                    .one(&*db)
                    .await
                    .unwrap()
                    .unwrap()
                    .count_in_stock
            });
            prop_assert!(remaining >= 0);
            prop_assert_eq!(remaining, (stock - qty).max(0));
        }
    }
}
