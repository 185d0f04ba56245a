use crate::{
    auth::AuthUser,
    db::DbPool,
    entities::{product, review},
    errors::ServiceError,
    events::{EventBus, StoreEvent},
    services::catalog::{CATALOG, SEED_STOCK},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::common::money;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Case-insensitive match on name or description
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub rating: Option<f64>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: Uuid,
    pub name: String,
    pub rating: f64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl From<review::Model> for ReviewResponse {
    fn from(r: review::Model) -> Self {
        Self {
            id: r.id,
            user: r.user_id,
            name: r.name,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    pub image: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub count_in_stock: i32,
    pub rating: f64,
    pub num_reviews: i32,
    #[schema(value_type = Object)]
    pub translations: Value,
    pub reviews: Vec<ReviewResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductResponse {
    pub fn new(model: product::Model, reviews: Vec<review::Model>) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            category: model.category,
            image: model.image,
            price: money(model.price),
            count_in_stock: model.count_in_stock,
            rating: model.rating,
            num_reviews: model.num_reviews,
            translations: model.translations,
            reviews: reviews.into_iter().map(ReviewResponse::from).collect(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Arithmetic mean rounded to two decimals, 0 when there are no ratings
pub fn mean_rating(ratings: &[f64]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let mean = ratings.iter().sum::<f64>() / ratings.len() as f64;
    (mean * 100.0).round() / 100.0
}

/// Attaches reviews to each product, keeping the input order
pub async fn with_reviews<C: ConnectionTrait>(
    conn: &C,
    products: Vec<product::Model>,
) -> Result<Vec<ProductResponse>, ServiceError> {
    if products.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    let mut grouped: HashMap<Uuid, Vec<review::Model>> = HashMap::new();
    for r in review::Entity::find()
        .filter(review::Column::ProductId.is_in(ids))
        .order_by_asc(review::Column::CreatedAt)
        .all(conn)
        .await?
    {
        grouped.entry(r.product_id).or_default().push(r);
    }

    Ok(products
        .into_iter()
        .map(|p| {
            let reviews = grouped.remove(&p.id).unwrap_or_default();
            ProductResponse::new(p, reviews)
        })
        .collect())
}

/// `%term%` with LIKE wildcards in the term escaped
fn contains_pattern(term: &str) -> LikeExpr {
    let escaped = term
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    LikeExpr::new(format!("%{}%", escaped)).escape('\\')
}

/// Recomputes `rating`/`num_reviews` from the stored reviews
async fn refresh_aggregates<C: ConnectionTrait>(
    conn: &C,
    product: product::Model,
) -> Result<product::Model, ServiceError> {
    let ratings: Vec<f64> = review::Entity::find()
        .select_only()
        .column(review::Column::Rating)
        .filter(review::Column::ProductId.eq(product.id))
        .into_tuple()
        .all(conn)
        .await?;

    let mut active: product::ActiveModel = product.into();
    active.num_reviews = Set(ratings.len() as i32);
    active.rating = Set(mean_rating(&ratings));
    Ok(active.update(conn).await?)
}

/// Catalog reads, reviews and boot seeding
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
    events: Arc<dyn EventBus>,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>, events: Arc<dyn EventBus>) -> Self {
        Self { db_pool, events }
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self, search: Option<&str>) -> Result<Vec<ProductResponse>, ServiceError> {
        let db = &*self.db_pool;
        let mut query = product::Entity::find();
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(product::Column::Name)))
                    .like(contains_pattern(term))
                    .or(Expr::expr(Func::lower(Expr::col(product::Column::Description)))
                        .like(contains_pattern(term))),
            );
        }
        let products = query
            .order_by_asc(product::Column::CreatedAt)
            .order_by_asc(product::Column::Name)
            .all(db)
            .await?;
        with_reviews(db, products).await
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductResponse, ServiceError> {
        let db = &*self.db_pool;
        let product = product::Entity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;
        let mut responses = with_reviews(db, vec![product]).await?;
        responses
            .pop()
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))
    }

    /// Distinct categories, alphabetical
    pub async fn categories(&self) -> Result<Vec<String>, ServiceError> {
        let categories: Vec<String> = product::Entity::find()
            .select_only()
            .column(product::Column::Category)
            .distinct()
            .order_by_asc(product::Column::Category)
            .into_tuple()
            .all(&*self.db_pool)
            .await?;
        Ok(categories)
    }

    /// Products whose name or category contains `term`, best rated first
    pub async fn search_by_name_or_category(
        &self,
        term: &str,
        limit: u64,
    ) -> Result<Vec<product::Model>, ServiceError> {
        Ok(product::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(product::Column::Name)))
                    .like(contains_pattern(term))
                    .or(Expr::expr(Func::lower(Expr::col(product::Column::Category)))
                        .like(contains_pattern(term))),
            )
            .order_by_desc(product::Column::Rating)
            .limit(limit)
            .all(&*self.db_pool)
            .await?)
    }

    /// Case-insensitive substring match on the category alone
    pub async fn search_by_category(
        &self,
        term: &str,
        limit: u64,
    ) -> Result<Vec<product::Model>, ServiceError> {
        Ok(product::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(product::Column::Category)))
                    .like(contains_pattern(term)),
            )
            .order_by_desc(product::Column::Rating)
            .limit(limit)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn in_categories(
        &self,
        categories: Vec<String>,
        limit: u64,
    ) -> Result<Vec<product::Model>, ServiceError> {
        if categories.is_empty() {
            return Ok(Vec::new());
        }
        Ok(product::Entity::find()
            .filter(product::Column::Category.is_in(categories))
            .order_by_desc(product::Column::Rating)
            .limit(limit)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn top_rated(&self, limit: u64) -> Result<Vec<product::Model>, ServiceError> {
        Ok(product::Entity::find()
            .order_by_desc(product::Column::Rating)
            .order_by_desc(product::Column::NumReviews)
            .limit(limit)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn find_many(&self, ids: Vec<Uuid>) -> Result<Vec<product::Model>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(product::Entity::find()
            .filter(product::Column::Id.is_in(ids))
            .all(&*self.db_pool)
            .await?)
    }

    /// Adds the caller's review and refreshes the product's aggregates
    #[instrument(skip(self, user, request), fields(user_id = %user.user_id, product_id = %product_id))]
    pub async fn add_review(
        &self,
        user: &AuthUser,
        product_id: Uuid,
        request: CreateReviewRequest,
    ) -> Result<ReviewResponse, ServiceError> {
        let rating = request
            .rating
            .ok_or_else(|| ServiceError::ValidationError("Rating is required".to_string()))?;
        if !(0.0..=5.0).contains(&rating) {
            return Err(ServiceError::ValidationError(
                "Rating must be between 0 and 5".to_string(),
            ));
        }
        let comment = request
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ServiceError::ValidationError("Comment is required".to_string()))?;

        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let product = product::Entity::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        let existing = review::Entity::find()
            .filter(review::Column::ProductId.eq(product_id))
            .filter(review::Column::UserId.eq(user.user_id))
            .count(&txn)
            .await?;
        if existing > 0 {
            return Err(ServiceError::BadRequest("Product already reviewed".to_string()));
        }

        let created = review::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            user_id: Set(user.user_id),
            name: Set(user.name.clone()),
            rating: Set(rating),
            comment: Set(comment),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ServiceError::BadRequest("Product already reviewed".to_string())
            }
            _ => ServiceError::DatabaseError(e),
        })?;

        let product = refresh_aggregates(&txn, product).await?;
        let product_name = product.name.clone();
        let response = with_reviews(&txn, vec![product]).await?;
        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit review");
            ServiceError::DatabaseError(e)
        })?;

        let review = ReviewResponse::from(created);
        for product in &response {
            self.events.publish(&StoreEvent::product_updated(product));
        }
        self.events
            .publish(&StoreEvent::review_created(&review, product_id, &product_name));
        info!(review_id = %review.id, rating, "Review added");

        Ok(review)
    }

    /// Admin removal of a review
    #[instrument(skip(self))]
    pub async fn delete_review(
        &self,
        product_id: Uuid,
        review_id: Uuid,
    ) -> Result<MessageResponse, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let product = product::Entity::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        let deleted = review::Entity::delete_many()
            .filter(review::Column::Id.eq(review_id))
            .filter(review::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;
        if deleted.rows_affected == 0 {
            return Err(ServiceError::NotFound("Review not found".to_string()));
        }

        let product = refresh_aggregates(&txn, product).await?;
        let response = with_reviews(&txn, vec![product]).await?;
        txn.commit().await?;

        for product in &response {
            self.events.publish(&StoreEvent::product_updated(product));
        }
        info!("Review removed");
        Ok(MessageResponse {
            message: "Review removed".to_string(),
        })
    }

    /// Inserts the launch catalog when there are no products yet
    pub async fn seed_if_empty(&self) -> Result<usize, ServiceError> {
        let db = &*self.db_pool;
        if product::Entity::find().count(db).await? > 0 {
            return Ok(0);
        }

        let now = Utc::now();
        let rows = CATALOG.iter().map(|entry| product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(entry.name.to_string()),
            description: Set(entry.description.to_string()),
            category: Set(entry.category.to_string()),
            image: Set(entry.image.to_string()),
            price: Set(Decimal::new(entry.price_cents, 2)),
            count_in_stock: Set(SEED_STOCK),
            rating: Set(0.0),
            num_reviews: Set(0),
            translations: Set(json!({
                "en": { "name": entry.name, "description": entry.description },
                "fr": { "name": entry.fr.0, "description": entry.fr.1 },
                "ar": { "name": entry.ar.0, "description": entry.ar.1 },
            })),
            created_at: Set(now),
            updated_at: Set(now),
        });

        product::Entity::insert_many(rows).exec(db).await?;
        info!(count = CATALOG.len(), "Seeded product catalog");
        Ok(CATALOG.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::InProcessEventBus;
    use crate::services::testing::{auth_user, memory_db, seed_product, seed_user};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    async fn service() -> (ProductService, Arc<DbPool>) {
        let db = Arc::new(memory_db().await);
        let bus = Arc::new(InProcessEventBus::new(16));
        (ProductService::new(db.clone(), bus), db)
    }

    fn review(rating: Option<f64>, comment: Option<&str>) -> CreateReviewRequest {
        CreateReviewRequest {
            rating,
            comment: comment.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn review_validation_messages() {
        let (service, db) = service().await;
        let user = auth_user(&seed_user(&db, "a@example.com", false).await);
        let product = seed_product(&db, "Rose Toner", dec!(19), 5).await;

        let cases = [
            (review(None, Some("nice")), "Rating is required"),
            (review(Some(5.5), Some("nice")), "Rating must be between 0 and 5"),
            (review(Some(4.0), Some("  ")), "Comment is required"),
        ];
        for (request, expected) in cases {
            let err = service.add_review(&user, product.id, request).await.unwrap_err();
            assert!(matches!(err, ServiceError::ValidationError(ref m) if m == expected), "{:?}", err);
        }

        let missing = service
            .add_review(&user, Uuid::new_v4(), review(Some(4.0), Some("nice")))
            .await
            .unwrap_err();
        assert!(matches!(missing, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn second_review_is_rejected_and_aggregates_hold() {
        let (service, db) = service().await;
        let alice = auth_user(&seed_user(&db, "alice@example.com", false).await);
        let bob = auth_user(&seed_user(&db, "bob@example.com", false).await);
        let product = seed_product(&db, "Rose Toner", dec!(19), 5).await;

        service
            .add_review(&alice, product.id, review(Some(5.0), Some("Lovely")))
            .await
            .unwrap();
        service
            .add_review(&bob, product.id, review(Some(4.0), Some("Good")))
            .await
            .unwrap();
        let dup = service
            .add_review(&alice, product.id, review(Some(1.0), Some("Changed my mind")))
            .await
            .unwrap_err();
        assert!(matches!(dup, ServiceError::BadRequest(ref m) if m == "Product already reviewed"));

        let fetched = service.get_product(product.id).await.unwrap();
        assert_eq!(fetched.num_reviews, 2);
        assert_eq!(fetched.rating, 4.5);
        assert_eq!(fetched.reviews.len(), 2);
    }

    #[tokio::test]
    async fn deleting_last_review_resets_rating() {
        let (service, db) = service().await;
        let alice = auth_user(&seed_user(&db, "alice@example.com", false).await);
        let product = seed_product(&db, "Rose Toner", dec!(19), 5).await;
        let created = service
            .add_review(&alice, product.id, review(Some(3.0), Some("Fine")))
            .await
            .unwrap();

        service.delete_review(product.id, created.id).await.unwrap();
        let fetched = service.get_product(product.id).await.unwrap();
        assert_eq!(fetched.num_reviews, 0);
        assert_eq!(fetched.rating, 0.0);

        let again = service.delete_review(product.id, created.id).await.unwrap_err();
        assert!(matches!(again, ServiceError::NotFound(ref m) if m == "Review not found"));
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_literal() {
        let (service, db) = service().await;
        seed_product(&db, "Rose Glow Serum", dec!(49), 5).await;
        seed_product(&db, "Silk Brow Gel", dec!(19), 5).await;

        let hits = service.list_products(Some("GLOW")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Rose Glow Serum");

        let wildcard = service.list_products(Some("%")).await.unwrap();
        assert!(wildcard.is_empty());

        let all = service.list_products(None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn seeding_runs_once() {
        let (service, _) = service().await;
        let inserted = service.seed_if_empty().await.unwrap();
        assert_eq!(inserted, CATALOG.len());
        assert_eq!(service.seed_if_empty().await.unwrap(), 0);

        let categories = service.categories().await.unwrap();
        assert!(categories.contains(&"Skincare".to_string()));
        let mut sorted = categories.clone();
        sorted.sort();
        assert_eq!(categories, sorted);

        let products = service.list_products(None).await.unwrap();
        assert!(products.iter().all(|p| p.rating == 0.0 && p.count_in_stock == SEED_STOCK));
        assert!(products.iter().all(|p| p.translations["ar"]["name"].is_string()));
    }

    proptest! {
        #[test]
        fn mean_rating_stays_within_bounds(ratings in prop::collection::vec(0.0f64..=5.0, 1..50)) {
            let mean = mean_rating(&ratings);
            let min = ratings.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = ratings.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(mean >= (min * 100.0).floor() / 100.0);
            prop_assert!(mean <= (max * 100.0).ceil() / 100.0);
        }
    }

    #[test]
    fn mean_rating_of_nothing_is_zero() {
        assert_eq!(mean_rating(&[]), 0.0);
        assert_eq!(mean_rating(&[4.0, 5.0, 5.0]), 4.67);
    }
}
