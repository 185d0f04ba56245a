use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};

use super::common::{created_response, parse_id};
use super::events::public_stream;
use crate::{
    auth::{AdminUser, CustomerUser},
    errors::ServiceError,
    services::products::{CreateReviewRequest, MessageResponse, ProductQuery, ProductResponse, ReviewResponse},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/products",
    summary = "List products",
    params(ProductQuery),
    responses((status = 200, description = "Catalog with reviews", body = [ProductResponse])),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<ProductResponse>>, ServiceError> {
    let products = state
        .services
        .products
        .list_products(query.search.as_deref())
        .await?;
    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    summary = "Get product",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product with reviews", body = ProductResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ServiceError> {
    let product_id = parse_id(&id, "Product")?;
    Ok(Json(state.services.products.get_product(product_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/products/categories/list",
    summary = "List categories",
    responses((status = 200, description = "Distinct categories", body = [String])),
    tag = "Products"
)]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<String>>, ServiceError> {
    Ok(Json(state.services.products.categories().await?))
}

/// One review per customer per product
#[utoipa::path(
    post,
    path = "/api/products/{id}/reviews",
    summary = "Review a product",
    params(("id" = String, Path, description = "Product ID")),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review stored", body = ReviewResponse),
        (status = 400, description = "Missing rating or already reviewed", body = crate::errors::ErrorResponse),
        (status = 403, description = "Admins cannot review", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn create_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    CustomerUser(user): CustomerUser,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let product_id = parse_id(&id, "Product")?;
    let review = state
        .services
        .products
        .add_review(&user, product_id, payload)
        .await?;
    Ok(created_response(review))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}/reviews/{review_id}",
    summary = "Delete a review",
    params(
        ("id" = String, Path, description = "Product ID"),
        ("review_id" = String, Path, description = "Review ID"),
    ),
    responses(
        (status = 200, description = "Review removed", body = MessageResponse),
        (status = 403, description = "Admin only", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product or review not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn delete_review(
    State(state): State<AppState>,
    Path((id, review_id)): Path<(String, String)>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<MessageResponse>, ServiceError> {
    let product_id = parse_id(&id, "Product")?;
    let review_id = parse_id(&review_id, "Review")?;
    let message = state
        .services
        .products
        .delete_review(product_id, review_id)
        .await?;
    Ok(Json(message))
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/events", get(public_stream))
        .route("/categories/list", get(list_categories))
        .route("/:id", get(get_product))
        .route("/:id/reviews", post(create_review))
        .route("/:id/reviews/:review_id", delete(delete_review))
}
