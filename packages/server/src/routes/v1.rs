use utoipa_axum::{router::OpenApiRouter, routes};

use crate::config::AppConfig;
use crate::handlers::auth::*;
use crate::handlers::product::*;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/products", product_routes(config))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(login))
        .routes(routes!(me))
}

fn product_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let resource = OpenApiRouter::new()
        .routes(routes!(list_products, store_product))
        .routes(routes!(create_form))
        .routes(routes!(list_imports))
        .routes(routes!(show_product, update_product, destroy_product))
        .routes(routes!(edit_form));

    let import = OpenApiRouter::new()
        .routes(routes!(import_products))
        .layer(import_body_limit(&config.storage));

    resource.merge(import)
}
