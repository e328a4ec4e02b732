use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, enum_column, like_pattern, user_summary},
    app_error::{AppError, AppResult},
    application::pagination::PageRequest,
    domain::entities::client::Client,
    use_cases::client::{ClientFilter, ClientPatch, ClientRepo, NewClient},
};

const SELECT_CLIENT: &str = r#"
    SELECT c.id, c.name, c.email, c.company, c.contact_number, c.plan_type,
           c.subscription_status, c.address, c.created_at, c.updated_at,
           u.id AS creator_id, u.name AS creator_name, u.email AS creator_email
    FROM clients c
    LEFT JOIN users u ON u.id = c.created_by
"#;

fn row_to_client(row: &PgRow) -> AppResult<Client> {
    Ok(Client {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        company: row.get("company"),
        contact_number: row.get("contact_number"),
        plan_type: enum_column(row, "plan_type")?,
        subscription_status: enum_column(row, "subscription_status")?,
        address: row.get("address"),
        created_by: user_summary(row, "creator"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Expects the `c` alias for clients and an existing WHERE clause.
fn push_client_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &ClientFilter) {
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search.trim());
        builder.push(" AND (c.name ILIKE ").push_bind(pattern.clone());
        builder.push(" OR c.email ILIKE ").push_bind(pattern.clone());
        builder.push(" OR c.company ILIKE ").push_bind(pattern);
        builder.push(")");
    }
    if let Some(status) = filter.status {
        builder
            .push(" AND c.subscription_status = ")
            .push_bind(status.as_ref().to_string());
    }
}

impl PostgresPersistence {
    async fn fetch_client(&self, id: Uuid) -> AppResult<Option<Client>> {
        let row = sqlx::query(&format!("{SELECT_CLIENT} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        row.as_ref().map(row_to_client).transpose()
    }
}

#[async_trait]
impl ClientRepo for PostgresPersistence {
    async fn create_client(&self, client: NewClient) -> AppResult<Client> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO clients
                (id, name, email, company, contact_number, plan_type, subscription_status, address, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(id)
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.company)
        .bind(&client.contact_number)
        .bind(client.plan_type.as_ref())
        .bind(client.subscription_status.as_ref())
        .bind(&client.address)
        .bind(client.created_by)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        self.fetch_client(id)
            .await?
            .ok_or_else(|| AppError::Internal("inserted client vanished".into()))
    }

    async fn get_client(&self, id: Uuid) -> AppResult<Option<Client>> {
        self.fetch_client(id).await
    }

    async fn list_clients(
        &self,
        filter: &ClientFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<Client>, i64)> {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM clients c WHERE TRUE");
        push_client_filters(&mut count_builder, filter);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;

        let mut data_builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("{SELECT_CLIENT} WHERE TRUE"));
        push_client_filters(&mut data_builder, filter);
        data_builder.push(" ORDER BY c.created_at DESC, c.id DESC");
        data_builder.push(" LIMIT ").push_bind(page.limit);
        data_builder.push(" OFFSET ").push_bind(page.offset());

        let rows = data_builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;
        let clients = rows.iter().map(row_to_client).collect::<AppResult<Vec<_>>>()?;
        Ok((clients, total))
    }

    async fn update_client(&self, id: Uuid, patch: ClientPatch) -> AppResult<Option<Client>> {
        let result = sqlx::query(
            r#"
            UPDATE clients
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                company = COALESCE($4, company),
                contact_number = COALESCE($5, contact_number),
                plan_type = COALESCE($6, plan_type),
                subscription_status = COALESCE($7, subscription_status),
                address = COALESCE($8, address),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.email)
        .bind(patch.company)
        .bind(patch.contact_number)
        .bind(patch.plan_type.map(|p| p.as_ref().to_string()))
        .bind(patch.subscription_status.map(|s| s.as_ref().to_string()))
        .bind(patch.address)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_client(id).await
    }

    async fn delete_client(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
