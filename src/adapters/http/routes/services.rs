use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    adapters::http::{
        app_state::AppState,
        envelope::{self, keyed, page_body},
        extract::{JsonBody, PathId, QueryParams},
        middleware::{AdminUser, AuthUser},
    },
    app_error::AppResult,
    application::{pagination::PageRequest, validators::FieldErrors},
    use_cases::service::{ServiceFilter, ServiceInput},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_service).get(list_services))
        .route(
            "/{id}",
            get(get_service).put(update_service).delete(delete_service),
        )
}

#[derive(Debug, Default, Deserialize)]
struct ListServicesParams {
    page: Option<i64>,
    limit: Option<i64>,
    search: Option<String>,
    category: Option<String>,
    active: Option<String>,
}

impl ListServicesParams {
    fn into_filter(self) -> AppResult<(ServiceFilter, PageRequest)> {
        let mut errors = FieldErrors::new();
        let category = errors.parse_enum(
            "category",
            self.category.as_deref().filter(|s| !s.trim().is_empty()),
            "Invalid category",
        );
        let active = errors.parse_enum(
            "active",
            self.active.as_deref().filter(|s| !s.trim().is_empty()),
            "active must be true or false",
        );
        errors.into_result()?;
        Ok((
            ServiceFilter {
                search: self.search,
                category,
                active,
            },
            PageRequest::new(self.page, self.limit),
        ))
    }
}

async fn create_service(
    State(app_state): State<AppState>,
    AdminUser(identity): AdminUser,
    JsonBody(payload): JsonBody<ServiceInput>,
) -> AppResult<impl IntoResponse> {
    let service = app_state
        .service_use_cases
        .create(&identity, payload)
        .await?;
    Ok(envelope::created(
        "Service created successfully",
        keyed("service", service),
    ))
}

async fn list_services(
    State(app_state): State<AppState>,
    AuthUser(_): AuthUser,
    QueryParams(params): QueryParams<ListServicesParams>,
) -> AppResult<impl IntoResponse> {
    let (filter, page) = params.into_filter()?;
    let services = app_state.service_use_cases.list(filter, page).await?;
    Ok(envelope::ok(page_body("services", "totalServices", services)))
}

async fn get_service(
    State(app_state): State<AppState>,
    AuthUser(_): AuthUser,
    PathId(id): PathId,
) -> AppResult<impl IntoResponse> {
    let service = app_state.service_use_cases.get(id).await?;
    Ok(envelope::ok(keyed("service", service)))
}

async fn update_service(
    State(app_state): State<AppState>,
    AdminUser(identity): AdminUser,
    PathId(id): PathId,
    JsonBody(payload): JsonBody<ServiceInput>,
) -> AppResult<impl IntoResponse> {
    let service = app_state
        .service_use_cases
        .update(&identity, id, payload)
        .await?;
    Ok(envelope::ok_with(
        "Service updated successfully",
        keyed("service", service),
    ))
}

async fn delete_service(
    State(app_state): State<AppState>,
    AdminUser(identity): AdminUser,
    PathId(id): PathId,
) -> AppResult<impl IntoResponse> {
    app_state.service_use_cases.delete(&identity, id).await?;
    Ok(envelope::done("Service deleted successfully"))
}
