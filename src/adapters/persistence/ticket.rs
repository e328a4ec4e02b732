use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Postgres, QueryBuilder, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, enum_column, like_pattern, user_summary},
    app_error::{AppError, AppResult},
    application::pagination::PageRequest,
    domain::entities::{
        ticket::{Ticket, TicketNote},
        user::UserSummary,
    },
    use_cases::ticket::{NewTicket, TicketFilter, TicketPatch, TicketRepo},
};

const SELECT_TICKET: &str = r#"
    SELECT t.id, t.title, t.description, t.priority, t.status, t.category, t.resolved_at,
           t.created_at, t.updated_at,
           u.id AS owner_id, u.name AS owner_name, u.email AS owner_email,
           a.id AS assignee_id, a.name AS assignee_name, a.email AS assignee_email
    FROM tickets t
    JOIN users u ON u.id = t.user_id
    LEFT JOIN users a ON a.id = t.assigned_to
"#;

/// Maps a ticket row without its notes.
fn row_to_ticket(row: &PgRow) -> AppResult<Ticket> {
    Ok(Ticket {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        priority: enum_column(row, "priority")?,
        status: enum_column(row, "status")?,
        category: enum_column(row, "category")?,
        user: UserSummary {
            id: row.get("owner_id"),
            name: row.get("owner_name"),
            email: row.get("owner_email"),
        },
        assigned_to: user_summary(row, "assignee"),
        resolved_at: row.get("resolved_at"),
        notes: Vec::new(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn push_ticket_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &TicketFilter) {
    if let Some(owner) = filter.owner {
        builder.push(" AND t.user_id = ").push_bind(owner);
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search.trim());
        builder.push(" AND (t.title ILIKE ").push_bind(pattern.clone());
        builder.push(" OR t.description ILIKE ").push_bind(pattern);
        builder.push(")");
    }
    if let Some(status) = filter.status {
        builder
            .push(" AND t.status = ")
            .push_bind(status.as_ref().to_string());
    }
    if let Some(priority) = filter.priority {
        builder
            .push(" AND t.priority = ")
            .push_bind(priority.as_ref().to_string());
    }
}

impl PostgresPersistence {
    /// Loads notes for all `tickets` in one query, oldest first.
    async fn attach_notes(&self, tickets: &mut [Ticket]) -> AppResult<()> {
        if tickets.is_empty() {
            return Ok(());
        }
        let ids: Vec<Uuid> = tickets.iter().map(|t| t.id).collect();
        let rows = sqlx::query(
            r#"
            SELECT n.id, n.ticket_id, n.message, n.added_at,
                   u.id AS author_id, u.name AS author_name, u.email AS author_email
            FROM ticket_notes n
            LEFT JOIN users u ON u.id = n.added_by
            WHERE n.ticket_id = ANY($1)
            ORDER BY n.added_at ASC, n.id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        let mut by_ticket: HashMap<Uuid, Vec<TicketNote>> = HashMap::new();
        for row in &rows {
            by_ticket
                .entry(row.get("ticket_id"))
                .or_default()
                .push(TicketNote {
                    id: row.get("id"),
                    message: row.get("message"),
                    added_by: user_summary(row, "author"),
                    added_at: row.get("added_at"),
                });
        }
        for ticket in tickets.iter_mut() {
            ticket.notes = by_ticket.remove(&ticket.id).unwrap_or_default();
        }
        Ok(())
    }

    async fn fetch_ticket(&self, id: Uuid) -> AppResult<Option<Ticket>> {
        let row = sqlx::query(&format!("{SELECT_TICKET} WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut tickets = [row_to_ticket(&row)?];
        self.attach_notes(&mut tickets).await?;
        let [ticket] = tickets;
        Ok(Some(ticket))
    }
}

#[async_trait]
impl TicketRepo for PostgresPersistence {
    async fn create_ticket(&self, ticket: NewTicket) -> AppResult<Ticket> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO tickets (id, title, description, priority, category, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(ticket.priority.as_ref())
        .bind(ticket.category.as_ref())
        .bind(ticket.user_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        self.fetch_ticket(id)
            .await?
            .ok_or_else(|| AppError::Internal("inserted ticket vanished".into()))
    }

    async fn get_ticket(&self, id: Uuid) -> AppResult<Option<Ticket>> {
        self.fetch_ticket(id).await
    }

    async fn list_tickets(
        &self,
        filter: &TicketFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<Ticket>, i64)> {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM tickets t WHERE TRUE");
        push_ticket_filters(&mut count_builder, filter);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;

        let mut data_builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("{SELECT_TICKET} WHERE TRUE"));
        push_ticket_filters(&mut data_builder, filter);
        data_builder.push(" ORDER BY t.created_at DESC, t.id DESC");
        data_builder.push(" LIMIT ").push_bind(page.limit);
        data_builder.push(" OFFSET ").push_bind(page.offset());

        let rows = data_builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;
        let mut tickets = rows.iter().map(row_to_ticket).collect::<AppResult<Vec<_>>>()?;
        self.attach_notes(&mut tickets).await?;
        Ok((tickets, total))
    }

    async fn update_ticket(&self, id: Uuid, patch: TicketPatch) -> AppResult<Option<Ticket>> {
        let (assignee_given, assignee) = match patch.assigned_to {
            Some(assignee) => (true, assignee),
            None => (false, None),
        };
        let result = sqlx::query(
            r#"
            UPDATE tickets
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                priority = COALESCE($4, priority),
                status = COALESCE($5, status),
                category = COALESCE($6, category),
                assigned_to = CASE WHEN $7 THEN $8 ELSE assigned_to END,
                resolved_at = COALESCE(resolved_at, $9),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.priority.map(|p| p.as_ref().to_string()))
        .bind(patch.status.map(|s| s.as_ref().to_string()))
        .bind(patch.category.map(|c| c.as_ref().to_string()))
        .bind(assignee_given)
        .bind(assignee)
        .bind(patch.resolved_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_ticket(id).await
    }

    async fn add_ticket_note(
        &self,
        id: Uuid,
        message: &str,
        added_by: Uuid,
    ) -> AppResult<Option<Ticket>> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        let touched = sqlx::query("UPDATE tickets SET updated_at = CURRENT_TIMESTAMP WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from)?;
        if touched.rows_affected() == 0 {
            return Ok(None);
        }

        sqlx::query(
            "INSERT INTO ticket_notes (id, ticket_id, message, added_by, added_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(message)
        .bind(added_by)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;
        self.fetch_ticket(id).await
    }

    async fn delete_ticket(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
