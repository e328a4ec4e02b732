use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};

use crate::{
    adapters::http::{
        app_state::AppState,
        envelope::{self, keyed},
        extract::{JsonBody, PathId, QueryParams},
        middleware::{AdminUser, AuthUser},
    },
    app_error::AppResult,
    application::validators::FieldErrors,
    domain::entities::purchase::{Purchase, PurchaseStatus},
    use_cases::purchase::PurchaseInput,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(purchase_service).get(list_my_purchases))
        .route("/all", get(list_all_purchases))
        .route("/{id}/cancel", put(cancel_purchase))
}

#[derive(Debug, Default, Deserialize)]
struct ListPurchasesParams {
    status: Option<String>,
}

#[derive(Serialize)]
struct PurchaseList {
    purchases: Vec<Purchase>,
    count: usize,
}

impl From<Vec<Purchase>> for PurchaseList {
    fn from(purchases: Vec<Purchase>) -> Self {
        Self {
            count: purchases.len(),
            purchases,
        }
    }
}

async fn purchase_service(
    State(app_state): State<AppState>,
    AuthUser(identity): AuthUser,
    JsonBody(payload): JsonBody<PurchaseInput>,
) -> AppResult<impl IntoResponse> {
    let purchase = app_state
        .purchase_use_cases
        .purchase(&identity, payload)
        .await?;
    Ok(envelope::created(
        "Service purchased successfully",
        keyed("purchase", purchase),
    ))
}

async fn list_my_purchases(
    State(app_state): State<AppState>,
    AuthUser(identity): AuthUser,
    QueryParams(params): QueryParams<ListPurchasesParams>,
) -> AppResult<impl IntoResponse> {
    let mut errors = FieldErrors::new();
    let status: Option<PurchaseStatus> = errors.parse_enum(
        "status",
        params.status.as_deref().filter(|s| !s.trim().is_empty()),
        "Invalid status",
    );
    errors.into_result()?;

    let purchases = app_state
        .purchase_use_cases
        .list_mine(&identity, status)
        .await?;
    Ok(envelope::ok(PurchaseList::from(purchases)))
}

async fn list_all_purchases(
    State(app_state): State<AppState>,
    AdminUser(identity): AdminUser,
) -> AppResult<impl IntoResponse> {
    let purchases = app_state.purchase_use_cases.list_all(&identity).await?;
    Ok(envelope::ok(PurchaseList::from(purchases)))
}

async fn cancel_purchase(
    State(app_state): State<AppState>,
    AuthUser(identity): AuthUser,
    PathId(id): PathId,
) -> AppResult<impl IntoResponse> {
    let purchase = app_state.purchase_use_cases.cancel(&identity, id).await?;
    Ok(envelope::ok_with(
        "Subscription cancelled successfully",
        keyed("purchase", purchase),
    ))
}
