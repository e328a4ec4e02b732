use async_trait::async_trait;
use sqlx::Row;

use crate::{
    adapters::persistence::{PostgresPersistence, enum_column},
    app_error::{AppError, AppResult},
    domain::entities::{
        analytics::{CategoryPerformance, DistributionSlice, TicketStats, Window},
        client::SubscriptionStatus,
        ticket::TicketStatus,
    },
    use_cases::analytics::AnalyticsRepo,
};

#[async_trait]
impl AnalyticsRepo for PostgresPersistence {
    async fn count_services_created(&self, window: Window) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM services WHERE created_at >= $1 AND created_at < $2",
        )
        .bind(window.start)
        .bind(window.end)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn count_clients_created(&self, window: Window) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM clients WHERE created_at >= $1 AND created_at < $2",
        )
        .bind(window.start)
        .bind(window.end)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn average_service_price(&self) -> AppResult<f64> {
        let avg: Option<f64> = sqlx::query_scalar("SELECT AVG(price) FROM services")
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(avg.unwrap_or(0.0))
    }

    async fn count_clients_by_status(&self) -> AppResult<Vec<(SubscriptionStatus, i64)>> {
        let rows = sqlx::query(
            "SELECT subscription_status, COUNT(*) AS n FROM clients GROUP BY subscription_status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        rows.iter()
            .map(|row| Ok((enum_column(row, "subscription_status")?, row.get("n"))))
            .collect()
    }

    async fn ticket_stats(&self, window: Window) -> AppResult<TicketStats> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = $3) AS open,
                   COUNT(*) FILTER (WHERE status = $4) AS resolved
            FROM tickets
            WHERE created_at >= $1 AND created_at < $2
            "#,
        )
        .bind(window.start)
        .bind(window.end)
        .bind(TicketStatus::Open.as_ref())
        .bind(TicketStatus::Resolved.as_ref())
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(TicketStats {
            total: row.get("total"),
            open: row.get("open"),
            resolved: row.get("resolved"),
        })
    }

    async fn plan_distribution(&self) -> AppResult<Vec<DistributionSlice>> {
        let rows = sqlx::query(
            "SELECT plan_type, COUNT(*) AS n FROM clients GROUP BY plan_type ORDER BY plan_type",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows
            .iter()
            .map(|row| DistributionSlice {
                name: row.get("plan_type"),
                value: row.get("n"),
            })
            .collect())
    }

    async fn category_performance(&self) -> AppResult<Vec<CategoryPerformance>> {
        let rows = sqlx::query(
            r#"
            SELECT category, COUNT(*) AS services, COALESCE(SUM(price), 0) AS revenue
            FROM services
            GROUP BY category
            ORDER BY category
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows
            .iter()
            .map(|row| CategoryPerformance {
                name: row.get("category"),
                services: row.get("services"),
                revenue: row.get("revenue"),
            })
            .collect())
    }
}
