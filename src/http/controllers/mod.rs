pub mod equipment_units_controller;
pub mod health_controller;
pub mod reference_data_controller;
pub mod sku_admin_controller;

pub use equipment_units_controller::create_equipment_unit_handler;
pub use health_controller::health_handler;
pub use reference_data_controller::{
    create_category_handler, list_brands_handler, list_categories_handler,
    set_brand_active_handler, upsert_brand_handler,
};
pub use sku_admin_controller::{
    auto_generation_status_handler, list_sequences_handler, preview_handler,
    reset_sequence_handler, statistics_handler, toggle_auto_generation_handler,
    validate_sku_handler,
};
