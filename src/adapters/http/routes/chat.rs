use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::{
    adapters::http::{
        app_state::AppState,
        envelope::{self, keyed},
        extract::JsonBody,
        middleware::AuthUser,
    },
    app_error::AppResult,
    use_cases::chat::{
        ChatMessageInput, ChatTicketInput, Enriched, IntentInput, RecommendInput, SentimentInput,
        SolutionInput, SummarizeInput, TriageInput,
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/faqs", get(faqs))
        .route("/message", post(send_message))
        .route("/create-ticket", post(create_ticket))
        .route("/analyze-intent", post(analyze_intent))
        .route("/sentiment", post(analyze_sentiment))
        .route("/recommend-services", post(recommend_services))
        .route("/triage-ticket", post(triage_ticket))
        .route("/summarize", post(summarize))
        .route("/solution", post(automated_solution))
}

/// `{<key>: value, fallback}`; `fallback` is set when the AI reply was unusable.
fn enriched<T: Serialize>(key: &str, result: Enriched<T>) -> Value {
    let mut body = keyed(key, result.value);
    body["fallback"] = json!(result.fallback);
    body
}

async fn faqs(State(app_state): State<AppState>) -> impl IntoResponse {
    envelope::ok(keyed("faqs", app_state.chat_use_cases.faqs()))
}

async fn send_message(
    State(app_state): State<AppState>,
    AuthUser(_): AuthUser,
    JsonBody(payload): JsonBody<ChatMessageInput>,
) -> AppResult<impl IntoResponse> {
    let reply = app_state.chat_use_cases.send_message(payload).await?;
    Ok(envelope::ok(reply))
}

async fn create_ticket(
    State(app_state): State<AppState>,
    AuthUser(identity): AuthUser,
    JsonBody(payload): JsonBody<ChatTicketInput>,
) -> AppResult<impl IntoResponse> {
    let ticket = app_state
        .chat_use_cases
        .create_ticket(&identity, payload)
        .await?;
    Ok(envelope::created(
        "Support ticket created successfully",
        keyed("ticket", ticket),
    ))
}

async fn analyze_intent(
    State(app_state): State<AppState>,
    AuthUser(_): AuthUser,
    JsonBody(payload): JsonBody<IntentInput>,
) -> AppResult<impl IntoResponse> {
    let analysis = app_state.chat_use_cases.analyze_intent(payload).await?;
    Ok(envelope::ok(enriched("analysis", analysis)))
}

async fn analyze_sentiment(
    State(app_state): State<AppState>,
    AuthUser(_): AuthUser,
    JsonBody(payload): JsonBody<SentimentInput>,
) -> AppResult<impl IntoResponse> {
    let sentiment = app_state.chat_use_cases.analyze_sentiment(payload).await?;
    Ok(envelope::ok(enriched("sentiment", sentiment)))
}

async fn recommend_services(
    State(app_state): State<AppState>,
    AuthUser(_): AuthUser,
    JsonBody(payload): JsonBody<RecommendInput>,
) -> AppResult<impl IntoResponse> {
    let recommendations = app_state.chat_use_cases.recommend_services(payload).await?;
    Ok(envelope::ok(enriched("recommendations", recommendations)))
}

async fn triage_ticket(
    State(app_state): State<AppState>,
    AuthUser(_): AuthUser,
    JsonBody(payload): JsonBody<TriageInput>,
) -> AppResult<impl IntoResponse> {
    let triage = app_state.chat_use_cases.triage_ticket(payload).await?;
    Ok(envelope::ok(enriched("triage", triage)))
}

async fn summarize(
    State(app_state): State<AppState>,
    AuthUser(_): AuthUser,
    JsonBody(payload): JsonBody<SummarizeInput>,
) -> AppResult<impl IntoResponse> {
    let summary = app_state.chat_use_cases.summarize(payload).await?;
    Ok(envelope::ok(enriched("summary", summary)))
}

async fn automated_solution(
    State(app_state): State<AppState>,
    AuthUser(_): AuthUser,
    JsonBody(payload): JsonBody<SolutionInput>,
) -> AppResult<impl IntoResponse> {
    let solution = app_state.chat_use_cases.automated_solution(payload).await?;
    Ok(envelope::ok(enriched("solution", solution)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::{StatusCode, header::AUTHORIZATION};
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::application::ports::completion::CompletionError;
    use crate::domain::entities::user::User;
    use crate::infra::app::api_router;
    use crate::test_utils::{StubCompletionClient, TestAppStateBuilder, bearer_for, create_test_user};

    fn server_with(stub: Arc<StubCompletionClient>) -> (TestServer, User) {
        let member = create_test_user(|_| {});
        let state = TestAppStateBuilder::new()
            .with_user(member.clone())
            .with_completion(stub)
            .build();
        (TestServer::new(api_router(state)).unwrap(), member)
    }

    #[tokio::test]
    async fn faqs_are_public() {
        let (server, _) = server_with(Arc::new(StubCompletionClient::new()));

        let response = server.get("/api/chat/faqs").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["faqs"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn message_reply_flags_ticket_offer() {
        let stub = Arc::new(StubCompletionClient::replying(["Let me help with that."]));
        let (server, member) = server_with(stub.clone());

        let response = server
            .post("/api/chat/message")
            .add_header(AUTHORIZATION, bearer_for(member.id))
            .json(&json!({ "message": "My VPN is not working" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["response"], "Let me help with that.");
        assert_eq!(body["data"]["suggestTicket"], true);

        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].contents[0].text.ends_with("User: My VPN is not working"));
    }

    #[tokio::test]
    async fn rate_limited_upstream_is_reported() {
        let stub = Arc::new(StubCompletionClient::new());
        stub.push_reply(Err(CompletionError::RateLimited));
        let (server, member) = server_with(stub);

        let response = server
            .post("/api/chat/message")
            .add_header(AUTHORIZATION, bearer_for(member.id))
            .json(&json!({ "message": "hello" }))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(
            body["message"],
            "Rate limit exceeded. Please wait a moment before trying again."
        );
    }

    #[tokio::test]
    async fn chat_ticket_is_drafted_from_history() {
        let (server, member) = server_with(Arc::new(StubCompletionClient::new()));

        let response = server
            .post("/api/chat/create-ticket")
            .add_header(AUTHORIZATION, bearer_for(member.id))
            .json(&json!({
                "conversationHistory": [
                    { "role": "user", "text": "Billing page shows an error" },
                    { "role": "assistant", "text": "Sorry to hear that." }
                ]
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        let ticket = &body["data"]["ticket"];
        assert_eq!(ticket["title"], "Billing page shows an error");
        assert_eq!(ticket["priority"], "Medium");
        assert_eq!(ticket["category"], "General");
    }

    #[tokio::test]
    async fn sentiment_parses_fenced_json() {
        let stub = Arc::new(StubCompletionClient::replying([
            "```json\n{\"sentiment\":\"negative\",\"emotion\":\"frustrated\",\"isFrustrated\":true,\"needsEscalation\":true,\"urgencyScore\":0.9}\n```",
        ]));
        let (server, member) = server_with(stub);

        let response = server
            .post("/api/chat/sentiment")
            .add_header(AUTHORIZATION, bearer_for(member.id))
            .json(&json!({ "message": "This is the third outage this week" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["sentiment"]["emotion"], "frustrated");
        assert_eq!(body["data"]["fallback"], false);
    }

    #[tokio::test]
    async fn enrichment_falls_back_when_upstream_fails() {
        let (server, member) = server_with(Arc::new(StubCompletionClient::new()));

        let response = server
            .post("/api/chat/triage-ticket")
            .add_header(AUTHORIZATION, bearer_for(member.id))
            .json(&json!({ "title": "Login fails", "description": "500 on submit" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["fallback"], true);
        assert_eq!(body["data"]["triage"]["category"], "General");
    }

    #[tokio::test]
    async fn chat_requires_authentication() {
        let (server, _) = server_with(Arc::new(StubCompletionClient::new()));

        server
            .post("/api/chat/message")
            .json(&json!({ "message": "hi" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
