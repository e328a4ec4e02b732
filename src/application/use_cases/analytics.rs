use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::app_error::AppResult;
use crate::application::authz::Identity;
use crate::domain::entities::{
    analytics::{
        AcquisitionPoint, AnalyticsPeriod, CategoryPerformance, Dashboard, DashboardMetrics,
        DistributionSlice, RateMetric, RevenuePoint, TicketStats, TrendMetric, Window,
        last_twelve_months, ratio_percent,
    },
    client::SubscriptionStatus,
};

#[async_trait]
pub trait AnalyticsRepo: Send + Sync {
    async fn count_services_created(&self, window: Window) -> AppResult<i64>;
    async fn count_clients_created(&self, window: Window) -> AppResult<i64>;
    /// Mean price over all services, 0 when there are none.
    async fn average_service_price(&self) -> AppResult<f64>;
    async fn count_clients_by_status(&self) -> AppResult<Vec<(SubscriptionStatus, i64)>>;
    async fn ticket_stats(&self, window: Window) -> AppResult<TicketStats>;
    async fn plan_distribution(&self) -> AppResult<Vec<DistributionSlice>>;
    async fn category_performance(&self) -> AppResult<Vec<CategoryPerformance>>;
}

#[derive(Clone)]
pub struct AnalyticsUseCases {
    repo: Arc<dyn AnalyticsRepo>,
}

impl AnalyticsUseCases {
    pub fn new(repo: Arc<dyn AnalyticsRepo>) -> Self {
        Self { repo }
    }

    pub async fn dashboard(&self, identity: &Identity, period: AnalyticsPeriod) -> AppResult<Dashboard> {
        self.dashboard_at(identity, period, Utc::now()).await
    }

    #[instrument(skip(self))]
    pub async fn dashboard_at(
        &self,
        identity: &Identity,
        period: AnalyticsPeriod,
        now: DateTime<Utc>,
    ) -> AppResult<Dashboard> {
        identity.require_admin()?;
        let current = period.current_window(now);
        let previous = current.previous();

        // Revenue is approximated as services created times the catalogue's mean price.
        let avg_price = self.repo.average_service_price().await?;
        let services_now = self.repo.count_services_created(current).await?;
        let services_before = self.repo.count_services_created(previous).await?;
        let revenue = TrendMetric::compare(
            services_now as f64 * avg_price,
            services_before as f64 * avg_price,
        );

        let clients_now = self.repo.count_clients_created(current).await?;
        let clients_before = self.repo.count_clients_created(previous).await?;
        let clients = TrendMetric::compare(clients_now as f64, clients_before as f64);

        let by_status = self.repo.count_clients_by_status().await?;
        let total: i64 = by_status.iter().map(|(_, n)| n).sum();
        let active: i64 = by_status
            .iter()
            .filter(|(s, _)| *s == SubscriptionStatus::Active)
            .map(|(_, n)| n)
            .sum();
        let churned: i64 = by_status
            .iter()
            .filter(|(s, _)| s.is_churned())
            .map(|(_, n)| n)
            .sum();

        let tickets = self.repo.ticket_stats(current).await?;

        Ok(Dashboard {
            metrics: DashboardMetrics {
                revenue,
                clients,
                conversion_rate: RateMetric {
                    value: ratio_percent(active, total),
                },
                churn_rate: RateMetric {
                    value: ratio_percent(churned, total),
                },
            },
            tickets,
        })
    }

    pub async fn revenue_trends(&self, identity: &Identity) -> AppResult<Vec<RevenuePoint>> {
        self.revenue_trends_at(identity, Utc::now()).await
    }

    #[instrument(skip(self))]
    pub async fn revenue_trends_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<RevenuePoint>> {
        identity.require_admin()?;
        let avg_price = self.repo.average_service_price().await?;
        let mut points = Vec::with_capacity(12);
        for bucket in last_twelve_months(now) {
            let created = self.repo.count_services_created(bucket.window).await?;
            points.push(RevenuePoint {
                month: bucket.label,
                revenue: created as f64 * avg_price,
            });
        }
        Ok(points)
    }

    pub async fn client_acquisition(&self, identity: &Identity) -> AppResult<Vec<AcquisitionPoint>> {
        self.client_acquisition_at(identity, Utc::now()).await
    }

    #[instrument(skip(self))]
    pub async fn client_acquisition_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<AcquisitionPoint>> {
        identity.require_admin()?;
        let mut points = Vec::with_capacity(12);
        for bucket in last_twelve_months(now) {
            let clients = self.repo.count_clients_created(bucket.window).await?;
            points.push(AcquisitionPoint {
                month: bucket.label,
                clients,
            });
        }
        Ok(points)
    }

    #[instrument(skip(self))]
    pub async fn subscription_distribution(
        &self,
        identity: &Identity,
    ) -> AppResult<Vec<DistributionSlice>> {
        identity.require_admin()?;
        self.repo.plan_distribution().await
    }

    #[instrument(skip(self))]
    pub async fn service_performance(
        &self,
        identity: &Identity,
    ) -> AppResult<Vec<CategoryPerformance>> {
        identity.require_admin()?;
        self.repo.category_performance().await
    }
}
