pub mod admin;
pub mod chat;
pub mod common;
pub mod contact;
pub mod events;
pub mod health;
pub mod orders;
pub mod pages;
pub mod payments;
pub mod products;
pub mod users;

use std::sync::Arc;

use crate::{
    auth::AuthService,
    config::AppConfig,
    db::DbPool,
    errors::ServiceError,
    events::EventBus,
    services::{
        admin::AdminService, chat::ChatService, contact::ContactService, orders::OrderService,
        pages::PageService, payments::PaymentService, products::ProductService,
        users::UserService,
    },
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub payments: Arc<PaymentService>,
    pub products: Arc<ProductService>,
    pub contact: Arc<ContactService>,
    pub pages: Arc<PageService>,
    pub users: Arc<UserService>,
    pub admin: Arc<AdminService>,
    pub chat: Arc<ChatService>,
}

impl AppServices {
    /// Wires every service against one pool and one event bus.
    ///
    /// Payment providers and the assistant's completion client are built
    /// from `config`; missing credentials disable them with a warning.
    pub fn new(
        config: &AppConfig,
        db_pool: Arc<DbPool>,
        events: Arc<dyn EventBus>,
        auth: Arc<AuthService>,
    ) -> Result<Self, ServiceError> {
        let orders = OrderService::new(db_pool.clone(), events.clone());
        let products = ProductService::new(db_pool.clone(), events.clone());
        let payments = PaymentService::from_config(config, orders.clone(), events.clone())?;
        let chat = ChatService::from_config(config, db_pool.clone(), products.clone())?;

        Ok(Self {
            orders: Arc::new(orders),
            payments: Arc::new(payments),
            products: Arc::new(products),
            contact: Arc::new(ContactService::new(db_pool.clone(), events.clone())),
            pages: Arc::new(PageService::new(db_pool.clone(), events)),
            users: Arc::new(UserService::new(db_pool.clone(), auth)),
            admin: Arc::new(AdminService::new(db_pool)),
            chat: Arc::new(chat),
        })
    }
}
