use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, enum_column, like_pattern, user_summary},
    app_error::{AppError, AppResult},
    application::pagination::PageRequest,
    domain::entities::service::Service,
    use_cases::service::{NewService, SERVICE_HAS_PURCHASES, ServiceFilter, ServicePatch, ServiceRepo},
};

const SELECT_SERVICE: &str = r#"
    SELECT s.id, s.name, s.description, s.price, s.category, s.active_status, s.features,
           s.icon, s.created_at, s.updated_at,
           u.id AS creator_id, u.name AS creator_name, u.email AS creator_email
    FROM services s
    LEFT JOIN users u ON u.id = s.created_by
"#;

fn row_to_service(row: &PgRow) -> AppResult<Service> {
    Ok(Service {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        price: row.get("price"),
        category: enum_column(row, "category")?,
        active_status: row.get("active_status"),
        features: row.get("features"),
        icon: row.get("icon"),
        created_by: user_summary(row, "creator"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn push_service_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &ServiceFilter) {
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search.trim());
        builder.push(" AND (s.name ILIKE ").push_bind(pattern.clone());
        builder.push(" OR s.description ILIKE ").push_bind(pattern);
        builder.push(")");
    }
    if let Some(category) = filter.category {
        builder
            .push(" AND s.category = ")
            .push_bind(category.as_ref().to_string());
    }
    if let Some(active) = filter.active {
        builder.push(" AND s.active_status = ").push_bind(active);
    }
}

impl PostgresPersistence {
    async fn fetch_service(&self, id: Uuid) -> AppResult<Option<Service>> {
        let row = sqlx::query(&format!("{SELECT_SERVICE} WHERE s.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        row.as_ref().map(row_to_service).transpose()
    }
}

#[async_trait]
impl ServiceRepo for PostgresPersistence {
    async fn create_service(&self, service: NewService) -> AppResult<Service> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO services
                (id, name, description, price, category, active_status, features, icon, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(id)
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.price)
        .bind(service.category.as_ref())
        .bind(service.active_status)
        .bind(&service.features)
        .bind(&service.icon)
        .bind(service.created_by)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        self.fetch_service(id)
            .await?
            .ok_or_else(|| AppError::Internal("inserted service vanished".into()))
    }

    async fn get_service(&self, id: Uuid) -> AppResult<Option<Service>> {
        self.fetch_service(id).await
    }

    async fn list_services(
        &self,
        filter: &ServiceFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<Service>, i64)> {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM services s WHERE TRUE");
        push_service_filters(&mut count_builder, filter);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;

        let mut data_builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("{SELECT_SERVICE} WHERE TRUE"));
        push_service_filters(&mut data_builder, filter);
        data_builder.push(" ORDER BY s.created_at DESC, s.id DESC");
        data_builder.push(" LIMIT ").push_bind(page.limit);
        data_builder.push(" OFFSET ").push_bind(page.offset());

        let rows = data_builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;
        let services = rows.iter().map(row_to_service).collect::<AppResult<Vec<_>>>()?;
        Ok((services, total))
    }

    async fn update_service(&self, id: Uuid, patch: ServicePatch) -> AppResult<Option<Service>> {
        let result = sqlx::query(
            r#"
            UPDATE services
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                category = COALESCE($5, category),
                active_status = COALESCE($6, active_status),
                features = COALESCE($7, features),
                icon = COALESCE($8, icon),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.price)
        .bind(patch.category.map(|c| c.as_ref().to_string()))
        .bind(patch.active_status)
        .bind(patch.features)
        .bind(patch.icon)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_service(id).await
    }

    async fn delete_service(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| match &err {
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                    AppError::Conflict(SERVICE_HAS_PURCHASES.into())
                }
                _ => AppError::from(err),
            })?;
        Ok(result.rows_affected() > 0)
    }
}
