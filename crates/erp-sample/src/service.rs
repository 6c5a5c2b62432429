//! # ERP Service
//!
//! The service layer callers actually use. Each method resolves the tenant's
//! actor through the pool and submits a work closure against the exclusive
//! connection; the actor serializes everything behind the scenes, so this
//! layer stays free of locking concerns.

use crate::backend::{Article, Customer, FakeErpConnection, Order, OrderRequest};
use erp_actor::{ActorError, ActorStats, ErpActorPool, TenantKey};
use std::sync::Arc;

pub struct ErpService {
    pool: Arc<ErpActorPool<FakeErpConnection>>,
}

impl ErpService {
    pub fn new(pool: Arc<ErpActorPool<FakeErpConnection>>) -> Self {
        Self { pool }
    }

    fn key(tenant_id: &str, business_unit: Option<&str>) -> TenantKey {
        match business_unit {
            Some(unit) => TenantKey::with_business_unit(tenant_id, unit),
            None => TenantKey::new(tenant_id),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn article(
        &self,
        tenant_id: &str,
        business_unit: Option<&str>,
        article_id: &str,
    ) -> Result<Article, ActorError> {
        let actor = self.pool.actor(&Self::key(tenant_id, business_unit)).await?;
        let article_id = article_id.to_string();
        actor
            .execute(move |conn, _signal| {
                Box::pin(async move { conn.fetch_article(&article_id).await.map_err(Into::into) })
            })
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn articles(
        &self,
        tenant_id: &str,
        business_unit: Option<&str>,
        article_ids: Vec<String>,
    ) -> Result<Vec<Article>, ActorError> {
        let actor = self.pool.actor(&Self::key(tenant_id, business_unit)).await?;
        actor
            .execute(move |conn, _signal| {
                Box::pin(async move { conn.fetch_articles(&article_ids).await.map_err(Into::into) })
            })
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn customer(
        &self,
        tenant_id: &str,
        business_unit: Option<&str>,
        customer_id: &str,
    ) -> Result<Customer, ActorError> {
        let actor = self.pool.actor(&Self::key(tenant_id, business_unit)).await?;
        let customer_id = customer_id.to_string();
        actor
            .execute(move |conn, _signal| {
                Box::pin(async move { conn.fetch_customer(&customer_id).await.map_err(Into::into) })
            })
            .await
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn create_order(
        &self,
        tenant_id: &str,
        business_unit: Option<&str>,
        request: OrderRequest,
    ) -> Result<Order, ActorError> {
        let actor = self.pool.actor(&Self::key(tenant_id, business_unit)).await?;
        actor
            .execute(move |conn, _signal| {
                Box::pin(async move { conn.create_order(request).await.map_err(Into::into) })
            })
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn order_count(
        &self,
        tenant_id: &str,
        business_unit: Option<&str>,
    ) -> Result<usize, ActorError> {
        let actor = self.pool.actor(&Self::key(tenant_id, business_unit)).await?;
        actor
            .execute(move |conn, _signal| Box::pin(async move { Ok(conn.order_count()) }))
            .await
    }

    pub fn stats(&self) -> Vec<ActorStats> {
        self.pool.stats()
    }

    pub async fn shutdown(&self) {
        self.pool.shutdown_all().await;
    }
}
