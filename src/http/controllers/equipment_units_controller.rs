use crate::http::error::ApiError;
use crate::http::models::{CreateEquipmentUnitRequest, EquipmentUnitResponse};
use crate::sku::UnitRequest;
use crate::SkuEngine;
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

/// Handler for POST /equipment-units
#[tracing::instrument(
    name = "handler_create_equipment_unit",
    skip(engine, request),
    fields(
        epg.manual = request.sku.is_some(),
        epg.category_id = ?request.category_id
    )
)]
pub async fn create_equipment_unit_handler(
    State(engine): State<Arc<SkuEngine>>,
    Json(request): Json<CreateEquipmentUnitRequest>,
) -> Result<(StatusCode, Json<EquipmentUnitResponse>), ApiError> {
    let unit_request = UnitRequest {
        sku: request.sku,
        category_id: request.category_id,
        brand_id: request.brand_id,
        brand_name: request.brand_name,
    };

    let unit = engine.create_equipment_unit(&unit_request).await?;

    Ok((StatusCode::CREATED, Json(unit.into())))
}
