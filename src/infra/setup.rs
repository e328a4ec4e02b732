use std::fs::File;
use std::sync::Arc;

use env_helpers::get_env_default;
use secrecy::ExposeSecret;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{ai::gemini::GeminiClient, http::app_state::AppState},
    application::ports::completion::CompletionClient,
    infra::{config::AppConfig, error::InfraError, http_client, postgres_persistence},
    use_cases::{
        analytics::{AnalyticsRepo, AnalyticsUseCases},
        chat::ChatUseCases,
        client::{ClientRepo, ClientUseCases},
        purchase::{PurchaseRepo, PurchaseUseCases},
        service::{ServiceRepo, ServiceUseCases},
        ticket::{TicketRepo, TicketUseCases},
        user::{AuthUseCases, UserRepo},
    },
};

pub async fn init_app_state() -> Result<AppState, InfraError> {
    let config = AppConfig::from_env()?;

    let postgres_arc =
        Arc::new(postgres_persistence(&config.database_url, config.db_max_connections).await?);

    if config.gemini_api_key.expose_secret().is_empty() {
        tracing::warn!("GEMINI_API_KEY is not set; chat replies will report the assistant as unavailable");
    }
    let completion: Arc<dyn CompletionClient> = Arc::new(GeminiClient::new(
        http_client::try_build_client().map_err(InfraError::HttpClient)?,
        config.gemini_api_url.clone(),
        config.gemini_api_key.clone(),
    ));

    let user_repo_arc = postgres_arc.clone() as Arc<dyn UserRepo>;

    let auth_use_cases = AuthUseCases::new(
        user_repo_arc.clone(),
        config.jwt_secret.clone(),
        config.access_token_ttl,
        config.bcrypt_cost,
    );
    let client_use_cases = ClientUseCases::new(postgres_arc.clone() as Arc<dyn ClientRepo>);
    let service_use_cases = ServiceUseCases::new(postgres_arc.clone() as Arc<dyn ServiceRepo>);
    let ticket_use_cases = Arc::new(TicketUseCases::new(
        postgres_arc.clone() as Arc<dyn TicketRepo>,
        user_repo_arc,
    ));
    let purchase_use_cases = PurchaseUseCases::new(
        postgres_arc.clone() as Arc<dyn PurchaseRepo>,
        postgres_arc.clone() as Arc<dyn ServiceRepo>,
    );
    let analytics_use_cases = AnalyticsUseCases::new(postgres_arc as Arc<dyn AnalyticsRepo>);
    let chat_use_cases = ChatUseCases::new(completion, ticket_use_cases.clone());

    Ok(AppState {
        config: Arc::new(config),
        auth_use_cases: Arc::new(auth_use_cases),
        client_use_cases: Arc::new(client_use_cases),
        service_use_cases: Arc::new(service_use_cases),
        ticket_use_cases,
        purchase_use_cases: Arc::new(purchase_use_cases),
        analytics_use_cases: Arc::new(analytics_use_cases),
        chat_use_cases: Arc::new(chat_use_cases),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "techsphere_api=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer().with_target(false).with_level(true).pretty();

    // File (structured JSON logs); skipped when the file cannot be created.
    let log_file: String = get_env_default("LOG_FILE", "app.log".to_string());
    let json_layer = File::create(&log_file).ok().map(|file| {
        fmt::layer()
            .json()
            .with_writer(file)
            .with_current_span(true)
            .with_span_list(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
