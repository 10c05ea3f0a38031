use crate::http::error::ApiError;
use crate::http::models::{
    AutoGenerationStatusResponse, ListSequencesResponse, PreviewParams, PreviewResponse,
    ResetSequenceRequest, ResetSequenceResponse, StatisticsResponse, ToggleAutoGenerationRequest,
    ToggleAutoGenerationResponse, ValidateSkuRequest, ValidateSkuResponse,
};
use crate::sku::{normalize_manual_sku, SkuError};
use crate::SkuEngine;
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

fn required_param(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("Query parameter '{}' is required", name)))
}

/// Handler for GET /sku-admin/preview
#[tracing::instrument(name = "handler_preview_sku", skip(engine, params))]
pub async fn preview_handler(
    State(engine): State<Arc<SkuEngine>>,
    Query(params): Query<PreviewParams>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let category = required_param(params.category, "category")?;
    let brand = required_param(params.brand, "brand")?;

    let next_sku = engine.allocator().preview_sku(&category, &brand).await?;

    Ok(Json(PreviewResponse {
        next_sku,
        category: category.to_ascii_uppercase(),
        brand: brand.to_ascii_uppercase(),
        timestamp: Utc::now(),
    }))
}

/// Handler for GET /sku-admin/statistics
#[tracing::instrument(name = "handler_sku_statistics", skip(engine))]
pub async fn statistics_handler(
    State(engine): State<Arc<SkuEngine>>,
) -> Result<Json<StatisticsResponse>, ApiError> {
    let stats = engine.allocator().statistics().await?;

    Ok(Json(StatisticsResponse {
        total_instances: stats.total_instances,
        sequences_by_category: stats.sequences_by_category,
        last_updated: stats.last_updated,
    }))
}

/// Handler for POST /sku-admin/validate
///
/// Malformed SKUs are rejected with 400; a well-formed SKU that is already
/// taken is reported through `isAvailable`.
#[tracing::instrument(name = "handler_validate_sku", skip(engine, request))]
pub async fn validate_sku_handler(
    State(engine): State<Arc<SkuEngine>>,
    Json(request): Json<ValidateSkuRequest>,
) -> Result<Json<ValidateSkuResponse>, ApiError> {
    let sku = normalize_manual_sku(&request.sku).map_err(SkuError::from)?;
    let taken = engine.catalog().sku_exists(&sku).await?;

    Ok(Json(ValidateSkuResponse {
        success: true,
        sku,
        is_available: !taken,
    }))
}

/// Handler for POST /sku-admin/reset-sequence
#[tracing::instrument(
    name = "handler_reset_sequence",
    skip(engine, request),
    fields(epg.new_sequence = request.new_sequence)
)]
pub async fn reset_sequence_handler(
    State(engine): State<Arc<SkuEngine>>,
    Json(request): Json<ResetSequenceRequest>,
) -> Result<Json<ResetSequenceResponse>, ApiError> {
    let reset = engine
        .allocator()
        .reset_sequence(&request.category, &request.brand, request.new_sequence)
        .await?;

    Ok(Json(ResetSequenceResponse {
        old_sequence: reset.old_sequence,
        new_sequence: reset.new_sequence,
        next_sku: reset.next_sku,
    }))
}

/// Handler for GET /sku-admin/sequences
#[tracing::instrument(name = "handler_list_sequences", skip(engine))]
pub async fn list_sequences_handler(
    State(engine): State<Arc<SkuEngine>>,
) -> Result<Json<ListSequencesResponse>, ApiError> {
    let sequences = engine.allocator().list_sequences().await?;

    Ok(Json(ListSequencesResponse {
        total_sequences: sequences.len(),
        sequences,
    }))
}

/// Handler for POST /sku-admin/toggle-auto-generation
#[tracing::instrument(
    name = "handler_toggle_auto_generation",
    skip(engine, request),
    fields(epg.enabled = request.enabled)
)]
pub async fn toggle_auto_generation_handler(
    State(engine): State<Arc<SkuEngine>>,
    Json(request): Json<ToggleAutoGenerationRequest>,
) -> Result<Json<ToggleAutoGenerationResponse>, ApiError> {
    let status = engine
        .allocator()
        .toggle_auto_generation(request.enabled)
        .await?;

    Ok(Json(ToggleAutoGenerationResponse {
        auto_generation_enabled: status.enabled,
        overridden_by_environment: status.disabled_by_environment,
        timestamp: Utc::now(),
    }))
}

/// Handler for GET /sku-admin/auto-generation-status
#[tracing::instrument(name = "handler_auto_generation_status", skip(engine))]
pub async fn auto_generation_status_handler(
    State(engine): State<Arc<SkuEngine>>,
) -> Result<Json<AutoGenerationStatusResponse>, ApiError> {
    let status = engine.allocator().auto_generation_status().await?;

    Ok(Json(AutoGenerationStatusResponse {
        auto_generation_enabled: status.enabled,
        is_disabled: !status.enabled,
        overridden_by_environment: status.disabled_by_environment,
    }))
}
