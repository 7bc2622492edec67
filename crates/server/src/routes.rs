//! Planner HTTP API. Every route except `/health` is scoped to the owner
//! named in the `x-owner-id` header.
//!
//! - `GET    /v1/plan`                        stored weekly plan and run state
//! - `POST   /v1/plan/generate`               generate a new week
//! - `GET    /v1/plan/today`                  outfit for the current day
//! - `GET    /v1/plan/days/{day}`             outfit for one day
//! - `POST   /v1/plan/days/{day}/regenerate`  regenerate one day
//! - `DELETE /v1/suggestion-cache`            drop cached suggestions
//! - `PUT    /v1/credential`                  store the endpoint credential
//! - `DELETE /v1/credential`                  remove it
//! - `GET    /v1/items`, `POST /v1/items`, `PUT /v1/items/{id}`, `DELETE /v1/items/{id}`

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::Datelike;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, Owner};
use wardrobe_core::{
    BodySlot, ClothingItem, Clock, CredentialStore, DayOfWeek, DayReport, ItemId,
    NewClothingItem, OutfitPlanner, Outfit, OwnerId, PlanReport, RepositoryError, RunState,
    WardrobeStore,
};

#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<OutfitPlanner>,
    pub wardrobe: Arc<dyn WardrobeStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Debug, Serialize)]
pub struct PlanView {
    pub owner_id: OwnerId,
    pub run_state: RunState,
    pub outfits: Vec<Outfit>,
}

#[derive(Debug, Serialize)]
pub struct DayView {
    pub day: DayOfWeek,
    pub outfit: Option<Outfit>,
}

#[derive(Debug, Deserialize)]
pub struct CredentialBody {
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemQuery {
    pub slot: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/plan", get(weekly_plan))
        .route("/v1/plan/generate", post(generate_plan))
        .route("/v1/plan/today", get(today))
        .route("/v1/plan/days/{day}", get(outfit_for_day))
        .route("/v1/plan/days/{day}/regenerate", post(regenerate_day))
        .route("/v1/suggestion-cache", delete(reset_suggestion_cache))
        .route("/v1/credential", put(set_credential).delete(clear_credential))
        .route("/v1/items", get(list_items).post(add_item))
        .route("/v1/items/{id}", put(replace_item).delete(delete_item))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn weekly_plan(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<Json<PlanView>, ApiError> {
    let plan = state.planner.weekly_plan(&owner).await?;
    Ok(Json(PlanView {
        run_state: state.planner.run_state(&owner),
        outfits: plan.outfits().cloned().collect(),
        owner_id: owner,
    }))
}

async fn generate_plan(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<Json<PlanReport>, ApiError> {
    Ok(Json(state.planner.generate_weekly_plan(&owner).await?))
}

async fn today(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<Json<DayView>, ApiError> {
    let day = DayOfWeek::from(state.clock.now().weekday());
    let outfit = state.planner.current_day_outfit(&owner).await?;
    Ok(Json(DayView { day, outfit }))
}

async fn outfit_for_day(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(day): Path<String>,
) -> Result<Json<DayView>, ApiError> {
    let day = DayOfWeek::from_str(&day)?;
    let outfit = state.planner.outfit_for_day(&owner, day).await?;
    Ok(Json(DayView { day, outfit }))
}

async fn regenerate_day(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(day): Path<String>,
) -> Result<Json<DayReport>, ApiError> {
    let day = DayOfWeek::from_str(&day)?;
    Ok(Json(state.planner.regenerate_day(&owner, day).await?))
}

async fn reset_suggestion_cache(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<StatusCode, ApiError> {
    state.planner.reset_suggestion_cache(&owner).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_credential(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Json(body): Json<CredentialBody>,
) -> Result<StatusCode, ApiError> {
    let value = body.value.trim();
    if value.is_empty() {
        return Err(ApiError::bad_request("credential value must not be blank"));
    }
    state.credentials.set(SecretString::from(value.to_string())).await?;
    state.planner.reset_endpoint_state();
    tracing::info!(
        event_name = "credential.updated",
        owner_id = %owner,
        "endpoint credential stored"
    );
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_credential(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<StatusCode, ApiError> {
    state.credentials.clear().await?;
    state.planner.reset_endpoint_state();
    tracing::info!(
        event_name = "credential.cleared",
        owner_id = %owner,
        "endpoint credential removed"
    );
    Ok(StatusCode::NO_CONTENT)
}

async fn list_items(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Query(query): Query<ItemQuery>,
) -> Result<Json<Vec<ClothingItem>>, ApiError> {
    let slot = query.slot.as_deref().map(BodySlot::from_str).transpose()?;
    Ok(Json(state.wardrobe.list_items(&owner, slot).await?))
}

async fn add_item(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Json(item): Json<NewClothingItem>,
) -> Result<(StatusCode, Json<ClothingItem>), ApiError> {
    validate_item(&item)?;
    let stored = state.wardrobe.add_item(&owner, item).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn replace_item(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
    Json(item): Json<NewClothingItem>,
) -> Result<Json<ClothingItem>, ApiError> {
    validate_item(&item)?;
    let id = ItemId(id);
    let existing = state
        .wardrobe
        .find_item(&owner, &id)
        .await?
        .ok_or_else(|| RepositoryError::NotFound { entity: "clothing_item", id: id.0.clone() })?;

    let replaced = state
        .wardrobe
        .replace_item(ClothingItem {
            id,
            owner_id: owner.clone(),
            name: item.name,
            image_ref: item.image_ref,
            slot: item.slot,
            category_id: item.category_id,
            subcategory_id: item.subcategory_id,
            color: item.color,
            created_at: existing.created_at,
        })
        .await?;
    state.planner.forget_plan(&owner).await;
    Ok(Json(replaced))
}

async fn delete_item(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.wardrobe.delete_item(&owner, &ItemId(id)).await?;
    state.planner.forget_plan(&owner).await;
    Ok(StatusCode::NO_CONTENT)
}

fn validate_item(item: &NewClothingItem) -> Result<(), ApiError> {
    if item.category_id.trim().is_empty() {
        return Err(ApiError::bad_request("category_id must not be blank"));
    }
    if item.color.trim().is_empty() {
        return Err(ApiError::bad_request("color must not be blank"));
    }
    Ok(())
}
