use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post, put},
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
    use_cases::ticket::{AssignInput, NoteInput, TicketFilter, TicketInput, TicketUpdateInput},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_ticket).get(list_tickets))
        .route(
            "/{id}",
            get(get_ticket).put(update_ticket).delete(delete_ticket),
        )
        .route("/{id}/assign", put(assign_ticket))
        .route("/{id}/notes", post(add_note))
}

#[derive(Debug, Default, Deserialize)]
struct ListTicketsParams {
    page: Option<i64>,
    limit: Option<i64>,
    search: Option<String>,
    status: Option<String>,
    priority: Option<String>,
}

impl ListTicketsParams {
    fn into_filter(self) -> AppResult<(TicketFilter, PageRequest)> {
        let mut errors = FieldErrors::new();
        let status = errors.parse_enum(
            "status",
            self.status.as_deref().filter(|s| !s.trim().is_empty()),
            "Invalid status",
        );
        let priority = errors.parse_enum(
            "priority",
            self.priority.as_deref().filter(|s| !s.trim().is_empty()),
            "Invalid priority",
        );
        errors.into_result()?;
        Ok((
            TicketFilter {
                owner: None,
                search: self.search,
                status,
                priority,
            },
            PageRequest::new(self.page, self.limit),
        ))
    }
}

async fn create_ticket(
    State(app_state): State<AppState>,
    AuthUser(identity): AuthUser,
    JsonBody(payload): JsonBody<TicketInput>,
) -> AppResult<impl IntoResponse> {
    let ticket = app_state
        .ticket_use_cases
        .create(&identity, payload)
        .await?;
    Ok(envelope::created(
        "Ticket created successfully",
        keyed("ticket", ticket),
    ))
}

async fn list_tickets(
    State(app_state): State<AppState>,
    AuthUser(identity): AuthUser,
    QueryParams(params): QueryParams<ListTicketsParams>,
) -> AppResult<impl IntoResponse> {
    let (filter, page) = params.into_filter()?;
    let tickets = app_state
        .ticket_use_cases
        .list(&identity, filter, page)
        .await?;
    Ok(envelope::ok(page_body("tickets", "totalTickets", tickets)))
}

async fn get_ticket(
    State(app_state): State<AppState>,
    AuthUser(identity): AuthUser,
    PathId(id): PathId,
) -> AppResult<impl IntoResponse> {
    let ticket = app_state.ticket_use_cases.get(&identity, id).await?;
    Ok(envelope::ok(keyed("ticket", ticket)))
}

async fn update_ticket(
    State(app_state): State<AppState>,
    AdminUser(identity): AdminUser,
    PathId(id): PathId,
    JsonBody(payload): JsonBody<TicketUpdateInput>,
) -> AppResult<impl IntoResponse> {
    let ticket = app_state
        .ticket_use_cases
        .update(&identity, id, payload)
        .await?;
    Ok(envelope::ok_with(
        "Ticket updated successfully",
        keyed("ticket", ticket),
    ))
}

async fn assign_ticket(
    State(app_state): State<AppState>,
    AdminUser(identity): AdminUser,
    PathId(id): PathId,
    JsonBody(payload): JsonBody<AssignInput>,
) -> AppResult<impl IntoResponse> {
    let ticket = app_state
        .ticket_use_cases
        .assign(&identity, id, payload)
        .await?;
    let message = if ticket.assigned_to.is_some() {
        "Ticket assigned successfully"
    } else {
        "Ticket unassigned successfully"
    };
    Ok(envelope::ok_with(message, keyed("ticket", ticket)))
}

async fn add_note(
    State(app_state): State<AppState>,
    AuthUser(identity): AuthUser,
    PathId(id): PathId,
    JsonBody(payload): JsonBody<NoteInput>,
) -> AppResult<impl IntoResponse> {
    let ticket = app_state
        .ticket_use_cases
        .add_note(&identity, id, payload)
        .await?;
    Ok(envelope::ok_with("Note added successfully", keyed("ticket", ticket)))
}

async fn delete_ticket(
    State(app_state): State<AppState>,
    AdminUser(identity): AdminUser,
    PathId(id): PathId,
) -> AppResult<impl IntoResponse> {
    app_state.ticket_use_cases.delete(&identity, id).await?;
    Ok(envelope::done("Ticket deleted successfully"))
}
