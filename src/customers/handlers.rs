use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::{
    auth::dto::Pagination,
    customers::{
        dto::{CreateCustomerRequest, CustomerResponse, UpdateCustomerRequest},
        repo::Customer,
    },
    error::ApiError,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers/", post(create_customer))
        .route("/customers/", get(list_customers))
        .route("/customers/:id", get(get_customer))
        .route("/customers/:id", put(update_customer))
        .route("/customers/:id", delete(delete_customer))
}

#[instrument(skip(state, payload))]
async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), ApiError> {
    if payload.first_name.trim().is_empty() || payload.last_name.trim().is_empty() {
        return Err(ApiError::Validation(
            "first_name and last_name are required".into(),
        ));
    }

    let customer = Customer::create(
        &state.db,
        &payload.first_name,
        &payload.last_name,
        payload.phone.as_deref(),
        payload.address.as_deref(),
    )
    .await?;

    info!(customer_id = customer.customer_id, "customer created");
    Ok((StatusCode::CREATED, Json(CustomerResponse::from(customer))))
}

#[instrument(skip(state))]
async fn list_customers(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<CustomerResponse>>, ApiError> {
    let customers = Customer::list(&state.db, p.skip(), p.limit()).await?;
    Ok(Json(
        customers.into_iter().map(CustomerResponse::from).collect(),
    ))
}

#[instrument(skip(state))]
async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let customer = Customer::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("customer not found".into()))?;
    Ok(Json(CustomerResponse::from(customer)))
}

#[instrument(skip(state, payload))]
async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> Result<Json<CustomerResponse>, ApiError> {
    // An empty update set returns the record unchanged and does not touch
    // the "update" timestamp.
    if payload.is_empty() {
        let customer = Customer::find_by_id(&state.db, id)
            .await?
            .ok_or_else(|| ApiError::NotFound("customer not found".into()))?;
        return Ok(Json(CustomerResponse::from(customer)));
    }

    let customer = Customer::update(
        &state.db,
        id,
        payload.first_name.as_deref(),
        payload.last_name.as_deref(),
        payload.phone.as_deref(),
        payload.address.as_deref(),
    )
    .await?;

    info!(customer_id = customer.customer_id, "customer updated");
    Ok(Json(CustomerResponse::from(customer)))
}

#[instrument(skip(state))]
async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    Customer::delete(&state.db, id).await?;
    info!(customer_id = id, "customer deleted");
    Ok(Json(json!({ "message": "customer deleted successfully" })))
}
