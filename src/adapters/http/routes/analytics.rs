use axum::{Router, extract::State, response::IntoResponse, routing::get};
use serde::Deserialize;

use crate::{
    adapters::http::{
        app_state::AppState,
        envelope,
        extract::QueryParams,
        middleware::AdminUser,
    },
    app_error::AppResult,
    domain::entities::analytics::AnalyticsPeriod,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/revenue-trends", get(revenue_trends))
        .route("/client-acquisition", get(client_acquisition))
        .route("/subscription-distribution", get(subscription_distribution))
        .route("/service-performance", get(service_performance))
}

#[derive(Debug, Default, Deserialize)]
struct PeriodParams {
    period: Option<String>,
}

async fn dashboard(
    State(app_state): State<AppState>,
    AdminUser(identity): AdminUser,
    QueryParams(params): QueryParams<PeriodParams>,
) -> AppResult<impl IntoResponse> {
    let period = AnalyticsPeriod::parse_or_default(params.period.as_deref());
    let dashboard = app_state
        .analytics_use_cases
        .dashboard(&identity, period)
        .await?;
    Ok(envelope::ok(dashboard))
}

async fn revenue_trends(
    State(app_state): State<AppState>,
    AdminUser(identity): AdminUser,
) -> AppResult<impl IntoResponse> {
    let points = app_state.analytics_use_cases.revenue_trends(&identity).await?;
    Ok(envelope::ok(points))
}

async fn client_acquisition(
    State(app_state): State<AppState>,
    AdminUser(identity): AdminUser,
) -> AppResult<impl IntoResponse> {
    let points = app_state
        .analytics_use_cases
        .client_acquisition(&identity)
        .await?;
    Ok(envelope::ok(points))
}

async fn subscription_distribution(
    State(app_state): State<AppState>,
    AdminUser(identity): AdminUser,
) -> AppResult<impl IntoResponse> {
    let slices = app_state
        .analytics_use_cases
        .subscription_distribution(&identity)
        .await?;
    Ok(envelope::ok(slices))
}

async fn service_performance(
    State(app_state): State<AppState>,
    AdminUser(identity): AdminUser,
) -> AppResult<impl IntoResponse> {
    let categories = app_state
        .analytics_use_cases
        .service_performance(&identity)
        .await?;
    Ok(envelope::ok(categories))
}
