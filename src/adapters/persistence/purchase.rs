use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, enum_column},
    app_error::{AppError, AppResult},
    domain::entities::{
        purchase::{Purchase, PurchaseStatus},
        service::ServiceSummary,
        user::UserSummary,
    },
    use_cases::purchase::{NewPurchase, PurchaseRepo},
};

const SELECT_PURCHASE: &str = r#"
    SELECT p.id, p.status, p.start_date, p.next_billing_date, p.billing_cycle, p.price,
           p.created_at, p.updated_at,
           u.id AS user_id, u.name AS user_name, u.email AS user_email,
           s.id AS service_id, s.name AS service_name, s.description AS service_description,
           s.category AS service_category, s.price AS service_price, s.icon AS service_icon
    FROM purchases p
    JOIN users u ON u.id = p.user_id
    JOIN services s ON s.id = p.service_id
"#;

fn row_to_purchase(row: &PgRow) -> AppResult<Purchase> {
    Ok(Purchase {
        id: row.get("id"),
        user: UserSummary {
            id: row.get("user_id"),
            name: row.get("user_name"),
            email: row.get("user_email"),
        },
        service: ServiceSummary {
            id: row.get("service_id"),
            name: row.get("service_name"),
            description: row.get("service_description"),
            category: enum_column(row, "service_category")?,
            price: row.get("service_price"),
            icon: row.get("service_icon"),
        },
        status: enum_column(row, "status")?,
        start_date: row.get("start_date"),
        next_billing_date: row.get("next_billing_date"),
        billing_cycle: enum_column(row, "billing_cycle")?,
        price: row.get("price"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

impl PostgresPersistence {
    async fn fetch_purchase(&self, id: Uuid) -> AppResult<Option<Purchase>> {
        let row = sqlx::query(&format!("{SELECT_PURCHASE} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        row.as_ref().map(row_to_purchase).transpose()
    }
}

#[async_trait]
impl PurchaseRepo for PostgresPersistence {
    async fn create_purchase(&self, purchase: NewPurchase) -> AppResult<Purchase> {
        let id = Uuid::new_v4();
        // purchases_one_active_idx turns a concurrent duplicate into a Conflict.
        sqlx::query(
            r#"
            INSERT INTO purchases
                (id, user_id, service_id, status, start_date, next_billing_date, billing_cycle, price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(purchase.user_id)
        .bind(purchase.service_id)
        .bind(PurchaseStatus::Active.as_ref())
        .bind(purchase.start_date)
        .bind(purchase.next_billing_date)
        .bind(purchase.billing_cycle.as_ref())
        .bind(purchase.price)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        self.fetch_purchase(id)
            .await?
            .ok_or_else(|| AppError::Internal("inserted purchase vanished".into()))
    }

    async fn get_purchase(&self, id: Uuid) -> AppResult<Option<Purchase>> {
        self.fetch_purchase(id).await
    }

    async fn has_active_purchase(&self, user_id: Uuid, service_id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM purchases
                WHERE user_id = $1 AND service_id = $2 AND status = $3
            )
            "#,
        )
        .bind(user_id)
        .bind(service_id)
        .bind(PurchaseStatus::Active.as_ref())
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(exists)
    }

    async fn list_purchases(
        &self,
        user_id: Option<Uuid>,
        status: Option<PurchaseStatus>,
    ) -> AppResult<Vec<Purchase>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("{SELECT_PURCHASE} WHERE TRUE"));
        if let Some(user_id) = user_id {
            builder.push(" AND p.user_id = ").push_bind(user_id);
        }
        if let Some(status) = status {
            builder
                .push(" AND p.status = ")
                .push_bind(status.as_ref().to_string());
        }
        builder.push(" ORDER BY p.created_at DESC, p.id DESC");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;
        rows.iter().map(row_to_purchase).collect()
    }

    async fn set_purchase_status(
        &self,
        id: Uuid,
        status: PurchaseStatus,
    ) -> AppResult<Option<Purchase>> {
        let result = sqlx::query(
            "UPDATE purchases SET status = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_ref())
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_purchase(id).await
    }
}
