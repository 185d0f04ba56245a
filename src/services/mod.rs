// Checkout and payments
pub mod orders;
pub mod payments;

// Catalog
pub mod catalog;
pub mod products;

// Customer contact and content
pub mod chat;
pub mod contact;
pub mod pages;

// Accounts and dashboard
pub mod admin;
pub mod users;

#[cfg(test)]
pub(crate) mod testing {
    use crate::{
        auth::{AuthUser, ADMIN_ROLE, CUSTOMER_ROLE},
        db::{run_migrations, DbPool},
        entities::{product, user},
    };
    use rust_decimal::Decimal;
    use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};
    use uuid::Uuid;

    /// Private in-memory SQLite with the schema applied. A single connection
    /// keeps every query on the same database.
    pub async fn memory_db() -> DbPool {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.expect("sqlite connects");
        run_migrations(&db).await.expect("migrations apply");
        db
    }

    pub async fn seed_user(db: &DbPool, email: &str, is_admin: bool) -> user::Model {
        user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(email.split('@').next().unwrap_or(email).to_string()),
            email: Set(email.to_string()),
            password_hash: Set("not-a-real-hash".to_string()),
            is_admin: Set(is_admin),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("user inserts")
    }

    pub async fn seed_product(db: &DbPool, name: &str, price: Decimal, stock: i32) -> product::Model {
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(format!("{} for daily care", name)),
            category: Set("Skincare".to_string()),
            image: Set("1.png".to_string()),
            price: Set(price),
            count_in_stock: Set(stock),
            rating: Set(0.0),
            num_reviews: Set(0),
            translations: Set(serde_json::json!({})),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("product inserts")
    }

    pub fn auth_user(user: &user::Model) -> AuthUser {
        let mut roles = vec![CUSTOMER_ROLE.to_string()];
        if user.is_admin {
            roles.push(ADMIN_ROLE.to_string());
        }
        AuthUser {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            roles,
        }
    }
}
