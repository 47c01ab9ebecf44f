use std::sync::Arc;

use crate::{
    config::Config,
    db::{
        DbPool, assignment_store::AssignmentStore, order_store::OrderStore,
        product_store::ProductStore, school_store::SchoolStore, supervisor_store::SupervisorStore,
        user_store::UserStore, warehouse_store::WarehouseStore,
    },
    services::{
        auth_service::AuthService,
        notification_service::{NotificationService, Notifier},
        order_service::OrderService,
    },
};

/// Application context, constructed once at startup and handed to request
/// handlers through axum state. Owns the stores and services; nothing here
/// is reachable through globals.
pub struct AppContext {
    pub users: UserStore,
    pub warehouses: WarehouseStore,
    pub products: ProductStore,
    pub supervisors: SupervisorStore,
    pub schools: SchoolStore,
    pub assignments: AssignmentStore,
    pub orders: OrderStore,
    pub auth: AuthService,
    pub order_service: OrderService,
    pub notifications: Arc<NotificationService>,
}

impl AppContext {
    pub fn new(pool: DbPool, config: &Config, notifier: Arc<dyn Notifier>) -> Self {
        let notifications = Arc::new(NotificationService::new(pool.clone(), notifier));

        Self {
            users: UserStore::new(pool.clone()),
            warehouses: WarehouseStore::new(pool.clone()),
            products: ProductStore::new(pool.clone()),
            supervisors: SupervisorStore::new(pool.clone()),
            schools: SchoolStore::new(pool.clone()),
            assignments: AssignmentStore::new(pool.clone()),
            orders: OrderStore::new(pool.clone()),
            auth: AuthService::new(pool.clone(), &config.jwt_secret, config.token_ttl_secs),
            order_service: OrderService::new(pool, notifications.clone()),
            notifications,
        }
    }
}
