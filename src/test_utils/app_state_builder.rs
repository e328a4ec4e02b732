//! Test app state builder for HTTP-level integration testing.
//!
//! `TestAppStateBuilder` wires every use case to one `InMemoryStore` and a
//! `StubCompletionClient`, so route tests run without Postgres or the AI API.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use secrecy::SecretString;
use time::Duration;
use url::Url;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    application::jwt,
    domain::entities::{client::Client, service::Service, user::User},
    infra::config::{AppConfig, DEFAULT_GEMINI_API_URL},
    test_utils::{InMemoryStore, StubCompletionClient, TEST_BCRYPT_COST},
    use_cases::{
        analytics::AnalyticsUseCases, chat::ChatUseCases, client::ClientUseCases,
        purchase::PurchaseUseCases, service::ServiceUseCases, ticket::TicketUseCases,
        user::AuthUseCases,
    },
};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".to_string(),
        db_max_connections: 1,
        jwt_secret: SecretString::from(TEST_JWT_SECRET.to_string()),
        access_token_ttl: Duration::hours(1),
        bcrypt_cost: TEST_BCRYPT_COST,
        bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
        cors_origins: vec![],
        gemini_api_key: SecretString::from(String::new()),
        gemini_api_url: Url::parse(DEFAULT_GEMINI_API_URL).unwrap(),
    }
}

/// Value for an `Authorization` header carrying a valid token for `user_id`.
pub fn bearer_for(user_id: Uuid) -> String {
    let secret = SecretString::from(TEST_JWT_SECRET.to_string());
    let token = jwt::issue(user_id, &secret, Duration::hours(1)).unwrap();
    format!("Bearer {token}")
}

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let admin = create_test_user(|u| u.role = Role::Admin);
/// let app_state = TestAppStateBuilder::new().with_user(admin.clone()).build();
/// let server = TestServer::new(api_router(app_state)).unwrap();
/// server.get("/api/users").add_header(AUTHORIZATION, bearer_for(admin.id)).await;
/// ```
pub struct TestAppStateBuilder {
    store: Arc<InMemoryStore>,
    completion: Arc<StubCompletionClient>,
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            completion: Arc::new(StubCompletionClient::new()),
        }
    }

    pub fn with_user(self, user: User) -> Self {
        self.store.seed_user(user);
        self
    }

    pub fn with_client(self, client: Client) -> Self {
        self.store.seed_client(client);
        self
    }

    pub fn with_service(self, service: Service) -> Self {
        self.store.seed_service(service);
        self
    }

    pub fn with_completion(mut self, completion: Arc<StubCompletionClient>) -> Self {
        self.completion = completion;
        self
    }

    /// The backing store, for assertions after requests have run.
    pub fn store(&self) -> Arc<InMemoryStore> {
        self.store.clone()
    }

    pub fn build(self) -> AppState {
        let config = test_config();
        let store = self.store;

        let auth_use_cases = AuthUseCases::new(
            store.clone(),
            config.jwt_secret.clone(),
            config.access_token_ttl,
            config.bcrypt_cost,
        );
        let ticket_use_cases = Arc::new(TicketUseCases::new(store.clone(), store.clone()));
        let chat_use_cases = ChatUseCases::new(self.completion, ticket_use_cases.clone());

        AppState {
            auth_use_cases: Arc::new(auth_use_cases),
            client_use_cases: Arc::new(ClientUseCases::new(store.clone())),
            service_use_cases: Arc::new(ServiceUseCases::new(store.clone())),
            ticket_use_cases,
            purchase_use_cases: Arc::new(PurchaseUseCases::new(store.clone(), store.clone())),
            analytics_use_cases: Arc::new(AnalyticsUseCases::new(store)),
            chat_use_cases: Arc::new(chat_use_cases),
            config: Arc::new(config),
        }
    }
}
