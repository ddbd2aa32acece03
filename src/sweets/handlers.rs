use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::extractors::{AdminUser, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::sweets::{
    dto::{
        CreateSweetRequest, MessageResponse, PurchaseReceipt, PurchaseResponse, QuantityRequest,
        SearchQuery, SweetListResponse, SweetResponse, UpdateSweetRequest,
    },
    repo::{NewSweet, SearchFilter, Sweet, SweetChanges},
};

pub fn sweet_routes() -> Router<AppState> {
    Router::new()
        .route("/sweets", post(add_sweet).get(list_sweets))
        .route("/sweets/search", get(search_sweets))
        .route(
            "/sweets/:id",
            get(get_sweet).put(update_sweet).delete(delete_sweet),
        )
        .route("/sweets/:id/purchase", post(purchase_sweet))
        .route("/sweets/:id/restock", post(restock_sweet))
}

/// Trims optional text, mapping blank input to "not provided".
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_new_sweet(payload: CreateSweetRequest) -> Result<NewSweet, ApiError> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::Validation("Name is required".into()));
    }
    if !payload.price.is_finite() || payload.price <= 0.0 {
        return Err(ApiError::Validation("Price must be a positive number".into()));
    }
    let quantity = payload.quantity.unwrap_or(0);
    if quantity < 0 {
        return Err(ApiError::Validation(
            "Quantity must be a non-negative number".into(),
        ));
    }
    Ok(NewSweet {
        name,
        category: clean(payload.category),
        price: payload.price,
        quantity,
        image: clean(payload.image),
    })
}

fn validate_update(payload: UpdateSweetRequest) -> Result<SweetChanges, ApiError> {
    let name = payload.name.map(|n| n.trim().to_string());
    if let Some(name) = &name {
        if name.is_empty() {
            return Err(ApiError::Validation("Name cannot be empty".into()));
        }
    }
    if let Some(price) = payload.price {
        if !price.is_finite() || price <= 0.0 {
            return Err(ApiError::Validation("Price must be a positive number".into()));
        }
    }
    if let Some(quantity) = payload.quantity {
        if quantity < 0 {
            return Err(ApiError::Validation(
                "Quantity must be a non-negative number".into(),
            ));
        }
    }
    Ok(SweetChanges {
        name,
        category: clean(payload.category),
        price: payload.price,
        quantity: payload.quantity,
        image: clean(payload.image),
    })
}

fn validate_search(query: SearchQuery) -> Result<SearchFilter, ApiError> {
    if let Some(min) = query.min_price {
        if !min.is_finite() || min < 0.0 {
            return Err(ApiError::Validation(
                "minPrice must be a non-negative number".into(),
            ));
        }
    }
    if let Some(max) = query.max_price {
        if !max.is_finite() || max < 0.0 {
            return Err(ApiError::Validation(
                "maxPrice must be a non-negative number".into(),
            ));
        }
    }
    if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
        if min > max {
            return Err(ApiError::Validation(
                "minPrice cannot be greater than maxPrice".into(),
            ));
        }
    }
    Ok(SearchFilter {
        name: clean(query.name),
        category: clean(query.category),
        min_price: query.min_price,
        max_price: query.max_price,
    })
}

fn require_positive_quantity(quantity: i32) -> Result<(), ApiError> {
    if quantity <= 0 {
        return Err(ApiError::Validation("Quantity must be greater than 0".into()));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn add_sweet(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Json(payload): Json<CreateSweetRequest>,
) -> ApiResult<(StatusCode, Json<SweetResponse>)> {
    let new = validate_new_sweet(payload)?;
    let sweet = Sweet::insert(&state.db, new).await?;
    info!(sweet_id = %sweet.id, name = %sweet.name, admin_id = %admin_id, "sweet added");
    Ok((
        StatusCode::CREATED,
        Json(SweetResponse {
            message: "Sweet added successfully",
            data: sweet,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_sweets(State(state): State<AppState>) -> ApiResult<Json<SweetListResponse>> {
    let sweets = Sweet::list_all(&state.db).await?;
    Ok(Json(SweetListResponse {
        message: "Sweets fetched successfully",
        data: sweets,
    }))
}

#[instrument(skip(state))]
pub async fn search_sweets(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SweetListResponse>> {
    let filter = validate_search(query)?;
    let sweets = Sweet::search(&state.db, &filter).await?;
    Ok(Json(SweetListResponse {
        message: "Search results",
        data: sweets,
    }))
}

#[instrument(skip(state))]
pub async fn get_sweet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SweetResponse>> {
    let sweet = Sweet::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Sweet not found".into()))?;
    Ok(Json(SweetResponse {
        message: "Sweet fetched successfully",
        data: sweet,
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_sweet(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSweetRequest>,
) -> ApiResult<Json<SweetResponse>> {
    let changes = validate_update(payload)?;
    let sweet = Sweet::update(&state.db, id, &changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Sweet not found".into()))?;
    info!(sweet_id = %id, admin_id = %admin_id, "sweet updated");
    Ok(Json(SweetResponse {
        message: "Sweet updated successfully",
        data: sweet,
    }))
}

#[instrument(skip(state))]
pub async fn delete_sweet(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    if !Sweet::delete(&state.db, id).await? {
        warn!(sweet_id = %id, "delete on missing sweet");
        return Err(ApiError::NotFound("Sweet not found".into()));
    }
    info!(sweet_id = %id, admin_id = %admin_id, "sweet deleted");
    Ok(Json(MessageResponse {
        message: "Sweet deleted successfully",
    }))
}

#[instrument(skip(state, payload))]
pub async fn purchase_sweet(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuantityRequest>,
) -> ApiResult<Json<PurchaseResponse>> {
    require_positive_quantity(payload.quantity)?;

    let (sweet, total) = Sweet::purchase(&state.db, user.id, id, payload.quantity).await?;

    info!(
        user_id = %user.id,
        sweet_id = %sweet.id,
        quantity = payload.quantity,
        remaining = sweet.quantity,
        "purchase completed"
    );
    Ok(Json(PurchaseResponse {
        message: "Purchase successful",
        data: PurchaseReceipt {
            sweet_name: sweet.name,
            quantity: payload.quantity,
            total,
            remaining_stock: sweet.quantity,
        },
    }))
}

#[instrument(skip(state, payload))]
pub async fn restock_sweet(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuantityRequest>,
) -> ApiResult<Json<SweetResponse>> {
    require_positive_quantity(payload.quantity)?;

    let sweet = Sweet::restock(&state.db, id, payload.quantity)
        .await?
        .ok_or_else(|| ApiError::NotFound("Sweet not found".into()))?;

    info!(
        admin_id = %admin_id,
        sweet_id = %sweet.id,
        quantity = payload.quantity,
        stock = sweet.quantity,
        "restock completed"
    );
    Ok(Json(SweetResponse {
        message: "Restock successful",
        data: sweet,
    }))
}
