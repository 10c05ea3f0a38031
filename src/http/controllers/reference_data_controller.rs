use crate::http::error::ApiError;
use crate::http::models::{
    BrandResponse, CategoryResponse, CreateCategoryRequest, ListBrandsResponse,
    ListCategoriesResponse, SetBrandActiveRequest, UpsertBrandRequest,
};
use crate::SkuEngine;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

/// Handler for GET /categories
#[tracing::instrument(name = "handler_list_categories", skip(engine))]
pub async fn list_categories_handler(
    State(engine): State<Arc<SkuEngine>>,
) -> Result<Json<ListCategoriesResponse>, ApiError> {
    let categories = engine.list_categories().await?;

    Ok(Json(ListCategoriesResponse {
        categories: categories.into_iter().map(CategoryResponse::from).collect(),
    }))
}

/// Handler for POST /categories
#[tracing::instrument(
    name = "handler_create_category",
    skip(engine, request),
    fields(epg.category = %request.name)
)]
pub async fn create_category_handler(
    State(engine): State<Arc<SkuEngine>>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let category = engine
        .add_category(&request.name, request.sku_prefix.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(category.into())))
}

/// Handler for GET /brands
#[tracing::instrument(name = "handler_list_brands", skip(engine))]
pub async fn list_brands_handler(
    State(engine): State<Arc<SkuEngine>>,
) -> Result<Json<ListBrandsResponse>, ApiError> {
    let brands = engine.list_brands().await?;

    Ok(Json(ListBrandsResponse {
        brands: brands.into_iter().map(BrandResponse::from).collect(),
    }))
}

/// Handler for POST /brands
#[tracing::instrument(
    name = "handler_upsert_brand",
    skip(engine, request),
    fields(epg.brand = %request.brand_name)
)]
pub async fn upsert_brand_handler(
    State(engine): State<Arc<SkuEngine>>,
    Json(request): Json<UpsertBrandRequest>,
) -> Result<Json<BrandResponse>, ApiError> {
    let brand = engine
        .upsert_brand(&request.brand_name, &request.prefix)
        .await?;

    Ok(Json(brand.into()))
}

/// Handler for PUT /brands/{id}/active
#[tracing::instrument(
    name = "handler_set_brand_active",
    skip(engine, request),
    fields(epg.brand_id = id)
)]
pub async fn set_brand_active_handler(
    State(engine): State<Arc<SkuEngine>>,
    Path(id): Path<i64>,
    Json(request): Json<SetBrandActiveRequest>,
) -> Result<Json<BrandResponse>, ApiError> {
    let brand = engine.set_brand_active(id, request.is_active).await?;

    Ok(Json(brand.into()))
}
