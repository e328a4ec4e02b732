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
    use_cases::client::{ClientFilter, ClientInput},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_client).get(list_clients))
        .route(
            "/{id}",
            get(get_client).put(update_client).delete(delete_client),
        )
}

#[derive(Debug, Default, Deserialize)]
struct ListClientsParams {
    page: Option<i64>,
    limit: Option<i64>,
    search: Option<String>,
    status: Option<String>,
}

impl ListClientsParams {
    fn into_filter(self) -> AppResult<(ClientFilter, PageRequest)> {
        let mut errors = FieldErrors::new();
        let status = errors.parse_enum(
            "status",
            self.status.as_deref().filter(|s| !s.trim().is_empty()),
            "Invalid subscription status",
        );
        errors.into_result()?;
        Ok((
            ClientFilter {
                search: self.search,
                status,
            },
            PageRequest::new(self.page, self.limit),
        ))
    }
}

async fn create_client(
    State(app_state): State<AppState>,
    AdminUser(identity): AdminUser,
    JsonBody(payload): JsonBody<ClientInput>,
) -> AppResult<impl IntoResponse> {
    let client = app_state
        .client_use_cases
        .create(&identity, payload)
        .await?;
    Ok(envelope::created(
        "Client created successfully",
        keyed("client", client),
    ))
}

async fn list_clients(
    State(app_state): State<AppState>,
    AuthUser(_): AuthUser,
    QueryParams(params): QueryParams<ListClientsParams>,
) -> AppResult<impl IntoResponse> {
    let (filter, page) = params.into_filter()?;
    let clients = app_state.client_use_cases.list(filter, page).await?;
    Ok(envelope::ok(page_body("clients", "totalClients", clients)))
}

async fn get_client(
    State(app_state): State<AppState>,
    AuthUser(_): AuthUser,
    PathId(id): PathId,
) -> AppResult<impl IntoResponse> {
    let client = app_state.client_use_cases.get(id).await?;
    Ok(envelope::ok(keyed("client", client)))
}

async fn update_client(
    State(app_state): State<AppState>,
    AdminUser(identity): AdminUser,
    PathId(id): PathId,
    JsonBody(payload): JsonBody<ClientInput>,
) -> AppResult<impl IntoResponse> {
    let client = app_state
        .client_use_cases
        .update(&identity, id, payload)
        .await?;
    Ok(envelope::ok_with(
        "Client updated successfully",
        keyed("client", client),
    ))
}

async fn delete_client(
    State(app_state): State<AppState>,
    AdminUser(identity): AdminUser,
    PathId(id): PathId,
) -> AppResult<impl IntoResponse> {
    app_state.client_use_cases.delete(&identity, id).await?;
    Ok(envelope::done("Client deleted successfully"))
}

#[cfg(test)]
mod tests {
    use axum::http::{StatusCode, header::AUTHORIZATION};
    use axum_test::TestServer;
    use chrono::Duration;
    use serde_json::{Value, json};

    use crate::domain::entities::{client::SubscriptionStatus, user::Role};
    use crate::infra::app::api_router;
    use crate::test_utils::{TestAppStateBuilder, bearer_for, create_test_client, create_test_user};

    #[tokio::test]
    async fn admin_creates_client_with_creator_expanded() {
        let admin = create_test_user(|u| u.role = Role::Admin);
        let server =
            TestServer::new(api_router(TestAppStateBuilder::new().with_user(admin.clone()).build()))
                .unwrap();

        let response = server
            .post("/api/clients")
            .add_header(AUTHORIZATION, bearer_for(admin.id))
            .json(&json!({
                "name": "Globex",
                "email": "ops@globex.com",
                "company": "Globex Corp",
                "contactNumber": "5551234567"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["message"], "Client created successfully");
        assert_eq!(body["data"]["client"]["planType"], "Basic");
        assert_eq!(body["data"]["client"]["createdBy"]["id"], admin.id.to_string());
    }

    #[tokio::test]
    async fn member_cannot_create_client() {
        let member = create_test_user(|_| {});
        let server =
            TestServer::new(api_router(TestAppStateBuilder::new().with_user(member.clone()).build()))
                .unwrap();

        let response = server
            .post("/api/clients")
            .add_header(AUTHORIZATION, bearer_for(member.id))
            .json(&json!({ "name": "X" }))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn list_pages_and_filters_by_status() {
        let member = create_test_user(|_| {});
        let base = chrono::Utc::now();
        let mut builder = TestAppStateBuilder::new().with_user(member.clone());
        for i in 0..25 {
            builder = builder.with_client(create_test_client(|c| {
                c.created_at = base + Duration::seconds(i);
                if i % 5 == 0 {
                    c.subscription_status = SubscriptionStatus::Suspended;
                }
            }));
        }
        let server = TestServer::new(api_router(builder.build())).unwrap();

        let page_two = server
            .get("/api/clients")
            .add_query_param("page", 2)
            .add_query_param("limit", 10)
            .add_header(AUTHORIZATION, bearer_for(member.id))
            .await;
        page_two.assert_status_ok();
        let body: Value = page_two.json();
        assert_eq!(body["data"]["clients"].as_array().unwrap().len(), 10);
        assert_eq!(body["data"]["totalPages"], 3);
        assert_eq!(body["data"]["currentPage"], 2);
        assert_eq!(body["data"]["totalClients"], 25);

        let suspended = server
            .get("/api/clients")
            .add_query_param("status", "Suspended")
            .add_header(AUTHORIZATION, bearer_for(member.id))
            .await;
        let body: Value = suspended.json();
        assert_eq!(body["data"]["totalClients"], 5);
    }

    #[tokio::test]
    async fn page_far_past_the_end_is_empty() {
        let member = create_test_user(|_| {});
        let state = TestAppStateBuilder::new()
            .with_user(member.clone())
            .with_client(create_test_client(|_| {}))
            .build();
        let server = TestServer::new(api_router(state)).unwrap();

        let response = server
            .get("/api/clients")
            .add_query_param("page", i64::MAX)
            .add_header(AUTHORIZATION, bearer_for(member.id))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert!(body["data"]["clients"].as_array().unwrap().is_empty());
        assert_eq!(body["data"]["totalClients"], 1);
    }

    #[tokio::test]
    async fn unknown_status_filter_is_a_validation_error() {
        let member = create_test_user(|_| {});
        let server =
            TestServer::new(api_router(TestAppStateBuilder::new().with_user(member.clone()).build()))
                .unwrap();

        let response = server
            .get("/api/clients")
            .add_query_param("status", "Gone")
            .add_header(AUTHORIZATION, bearer_for(member.id))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["errors"][0]["field"], "status");
    }

    #[tokio::test]
    async fn malformed_id_and_missing_client() {
        let member = create_test_user(|_| {});
        let server =
            TestServer::new(api_router(TestAppStateBuilder::new().with_user(member.clone()).build()))
                .unwrap();

        let bad = server
            .get("/api/clients/not-a-uuid")
            .add_header(AUTHORIZATION, bearer_for(member.id))
            .await;
        bad.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = bad.json();
        assert_eq!(body["errors"][0]["message"], "Invalid ID format");

        let missing = server
            .get(&format!("/api/clients/{}", uuid::Uuid::new_v4()))
            .add_header(AUTHORIZATION, bearer_for(member.id))
            .await;
        missing.assert_status(StatusCode::NOT_FOUND);
        let body: Value = missing.json();
        assert_eq!(body["message"], "Client not found");
    }

    #[tokio::test]
    async fn admin_deletes_client() {
        let admin = create_test_user(|u| u.role = Role::Admin);
        let client = create_test_client(|_| {});
        let state = TestAppStateBuilder::new()
            .with_user(admin.clone())
            .with_client(client.clone())
            .build();
        let server = TestServer::new(api_router(state)).unwrap();

        let response = server
            .delete(&format!("/api/clients/{}", client.id))
            .add_header(AUTHORIZATION, bearer_for(admin.id))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["message"], "Client deleted successfully");

        server
            .delete(&format!("/api/clients/{}", client.id))
            .add_header(AUTHORIZATION, bearer_for(admin.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
