use crate::http::controllers::{
    auto_generation_status_handler, create_category_handler, create_equipment_unit_handler,
    health_handler, list_brands_handler, list_categories_handler, list_sequences_handler,
    preview_handler, reset_sequence_handler, set_brand_active_handler, statistics_handler,
    toggle_auto_generation_handler, upsert_brand_handler, validate_sku_handler,
};
use crate::SkuEngine;
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;

pub struct AppServer {
    pub router: Router,
    pub engine: Arc<SkuEngine>,
}

pub const PATH_HEALTH: &str = "/health";
pub const PATH_SKU_PREVIEW: &str = "/sku-admin/preview";
pub const PATH_SKU_STATISTICS: &str = "/sku-admin/statistics";
pub const PATH_SKU_VALIDATE: &str = "/sku-admin/validate";
pub const PATH_SKU_RESET_SEQUENCE: &str = "/sku-admin/reset-sequence";
pub const PATH_SKU_SEQUENCES: &str = "/sku-admin/sequences";
pub const PATH_SKU_TOGGLE_AUTO_GENERATION: &str = "/sku-admin/toggle-auto-generation";
pub const PATH_SKU_AUTO_GENERATION_STATUS: &str = "/sku-admin/auto-generation-status";
pub const PATH_EQUIPMENT_UNITS: &str = "/equipment-units";
pub const PATH_CATEGORIES: &str = "/categories";
pub const PATH_BRANDS: &str = "/brands";
pub const PATH_BRAND_ACTIVE: &str = "/brands/{id}/active";

impl AppServer {
    pub fn new(engine: SkuEngine) -> Self {
        let engine = Arc::new(engine);
        AppServer {
            router: Router::new()
                .route(PATH_HEALTH, get(health_handler))
                .route(PATH_SKU_PREVIEW, get(preview_handler))
                .route(PATH_SKU_STATISTICS, get(statistics_handler))
                .route(PATH_SKU_VALIDATE, post(validate_sku_handler))
                .route(PATH_SKU_RESET_SEQUENCE, post(reset_sequence_handler))
                .route(PATH_SKU_SEQUENCES, get(list_sequences_handler))
                .route(
                    PATH_SKU_TOGGLE_AUTO_GENERATION,
                    post(toggle_auto_generation_handler),
                )
                .route(
                    PATH_SKU_AUTO_GENERATION_STATUS,
                    get(auto_generation_status_handler),
                )
                .route(PATH_EQUIPMENT_UNITS, post(create_equipment_unit_handler))
                .route(
                    PATH_CATEGORIES,
                    get(list_categories_handler).post(create_category_handler),
                )
                .route(
                    PATH_BRANDS,
                    get(list_brands_handler).post(upsert_brand_handler),
                )
                .route(PATH_BRAND_ACTIVE, put(set_brand_active_handler))
                .with_state(engine.clone()),
            engine,
        }
    }
}
