use std::sync::Arc;

use crate::{
    infra::config::AppConfig,
    use_cases::{
        analytics::AnalyticsUseCases, chat::ChatUseCases, client::ClientUseCases,
        purchase::PurchaseUseCases, service::ServiceUseCases, ticket::TicketUseCases,
        user::AuthUseCases,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth_use_cases: Arc<AuthUseCases>,
    pub client_use_cases: Arc<ClientUseCases>,
    pub service_use_cases: Arc<ServiceUseCases>,
    pub ticket_use_cases: Arc<TicketUseCases>,
    pub purchase_use_cases: Arc<PurchaseUseCases>,
    pub analytics_use_cases: Arc<AnalyticsUseCases>,
    pub chat_use_cases: Arc<ChatUseCases>,
}
