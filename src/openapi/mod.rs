use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Saria Beauty API",
        version = "1.0.0",
        description = r#"
# Saria Beauty storefront API

Orders, card and PayPal payments, product reviews, the contact inbox, CMS
pages, the shopping assistant and live events for the storefront and the
back office.

## Authentication

Signed-in endpoints take a JWT issued by `POST /api/users` or
`POST /api/users/login`:

```
Authorization: Bearer <token>
```

`GET /api/admin/stream` also accepts the token as `?token=` because
`EventSource` cannot set headers.

## Errors

Failures share one body:

```json
{
  "error": "Bad Request",
  "message": "Order already paid",
  "requestId": "7f0c...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

## Money

Prices and totals are decimal numbers in the store currency (AED by
default). Payment providers see minor units.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development")
    ),
    tags(
        (name = "Orders", description = "Checkout and order history"),
        (name = "Payments", description = "Stripe and PayPal"),
        (name = "Products", description = "Catalog and reviews"),
        (name = "Contact", description = "Contact inbox and newsletter"),
        (name = "Pages", description = "Editable storefront pages"),
        (name = "Users", description = "Accounts and tokens"),
        (name = "Admin", description = "Back-office figures"),
        (name = "Chat", description = "Shopping assistant"),
        (name = "Events", description = "Server-sent event streams"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::orders::create_order,
        crate::handlers::orders::get_order,
        crate::handlers::orders::my_orders,
        crate::handlers::orders::all_orders,
        crate::handlers::orders::update_order_status,

        crate::handlers::payments::payment_config,
        crate::handlers::payments::create_payment_intent,
        crate::handlers::payments::confirm_stripe_payment,
        crate::handlers::payments::verify_paypal,
        crate::handlers::payments::stripe_webhook,

        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::list_categories,
        crate::handlers::products::create_review,
        crate::handlers::products::delete_review,

        crate::handlers::contact::create_message,
        crate::handlers::contact::list_messages,
        crate::handlers::contact::my_messages,
        crate::handlers::contact::mark_read,
        crate::handlers::contact::reply,
        crate::handlers::contact::mark_seen,
        crate::handlers::contact::subscribe,

        crate::handlers::pages::get_page,
        crate::handlers::pages::upsert_page,

        crate::handlers::users::register,
        crate::handlers::users::login,
        crate::handlers::users::profile,
        crate::handlers::users::update_profile,
        crate::handlers::users::list_users,
        crate::handlers::users::set_admin,

        crate::handlers::admin::stats,
        crate::handlers::chat::chat,
        crate::handlers::events::public_stream,
        crate::handlers::events::admin_stream,
        crate::handlers::health::health_check,
    ),
    components(
        schemas(
            crate::services::orders::OrderResponse,
            crate::services::orders::CreateOrderRequest,
            crate::services::orders::UpdateOrderStatusRequest,
            crate::services::products::ProductResponse,
            crate::services::chat::ChatResponse,
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_storefront_routes() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
        assert!(json.contains("Saria Beauty API"));
        assert!(json.contains("/api/orders/{id}"));
        assert!(json.contains("/api/payment/webhook"));
        assert!(json.contains("/api/chat"));
        assert!(json.contains("\"Bearer\""));
    }
}
