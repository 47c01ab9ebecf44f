use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;

pub mod assignment;
pub mod auth;
pub mod order;
pub mod product;
pub mod school;
pub mod supervisor;
pub mod warehouse;

/// Build the application router. The admin surface sits behind the
/// bearer-token middleware; login and public order submission do not.
pub fn router(ctx: Arc<AppContext>) -> Router {
    let admin = Router::new()
        .route(
            "/warehouses",
            get(warehouse::get_all_warehouses).post(warehouse::create_warehouse),
        )
        .route(
            "/warehouses/{id}",
            get(warehouse::get_warehouse_by_id)
                .put(warehouse::update_warehouse)
                .delete(warehouse::delete_warehouse),
        )
        .route(
            "/products",
            get(product::get_all_products).post(product::create_product),
        )
        .route(
            "/products/{id}",
            get(product::get_product_by_id)
                .put(product::update_product)
                .delete(product::delete_product),
        )
        .route("/products/{id}/stock", put(product::set_product_stock))
        .route(
            "/supervisors",
            get(supervisor::get_all_supervisors).post(supervisor::create_supervisor),
        )
        .route(
            "/supervisors/{id}",
            get(supervisor::get_supervisor_by_id)
                .put(supervisor::update_supervisor)
                .delete(supervisor::delete_supervisor),
        )
        .route("/supervisors/{id}/qr", get(supervisor::get_supervisor_qr))
        .route(
            "/schools",
            get(school::get_all_schools).post(school::create_school),
        )
        .route(
            "/schools/{id}",
            get(school::get_school_by_id)
                .put(school::update_school)
                .delete(school::delete_school),
        )
        .route("/schools/{id}/qr", get(school::get_school_qr))
        .route(
            "/assignments",
            get(assignment::get_all_assignments).post(assignment::create_assignment),
        )
        .route("/assignments/{id}", delete(assignment::delete_assignment))
        .route("/orders", get(order::get_all_orders))
        .route("/orders/{id}", get(order::get_order_by_id))
        .route("/orders/{id}/approve", post(order::approve_order))
        .route("/orders/{id}/reject", post(order::reject_order))
        .route_layer(middleware::from_fn_with_state(
            ctx.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/", get(root))
        .route("/api/auth/login", post(auth::login))
        .route("/api/public/orders", post(order::submit_order))
        .nest("/api", admin)
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
}

async fn root() -> &'static str {
    "School supplies inventory server is running."
}
