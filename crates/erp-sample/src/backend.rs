//! # Fake ERP Backend
//!
//! An in-memory stand-in for the real ERP system, for development and
//! demos. It fabricates articles and customers on demand and keeps created
//! orders per connection, so each tenant's actor sees its own isolated
//! state. This is the shape the real backend has, minus the network.

use erp_actor::{BoxError, ErpConnector, TenantKey};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderLine {
    pub article_id: String,
    pub quantity: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub lines: Vec<OrderLine>,
    pub total: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderRequest {
    pub customer_id: String,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("order request has no lines")]
    EmptyOrder,
    #[error("quantity must be positive for article {0}")]
    ZeroQuantity(String),
}

/// One tenant's exclusive backend connection.
///
/// Not safe for concurrent use; the actor guarantees it never is.
pub struct FakeErpConnection {
    tenant: TenantKey,
    orders: Vec<Order>,
    next_order: u32,
    latency: Duration,
}

impl FakeErpConnection {
    fn new(tenant: TenantKey, latency: Duration) -> Self {
        Self {
            tenant,
            orders: Vec::new(),
            next_order: 1,
            latency,
        }
    }

    pub fn tenant(&self) -> &TenantKey {
        &self.tenant
    }

    pub async fn fetch_article(&mut self, article_id: &str) -> Result<Article, BackendError> {
        tokio::time::sleep(self.latency).await;
        Ok(fake_article(article_id))
    }

    pub async fn fetch_articles(
        &mut self,
        article_ids: &[String],
    ) -> Result<Vec<Article>, BackendError> {
        tokio::time::sleep(self.latency).await;
        Ok(article_ids.iter().map(|id| fake_article(id)).collect())
    }

    pub async fn fetch_customer(&mut self, customer_id: &str) -> Result<Customer, BackendError> {
        tokio::time::sleep(self.latency).await;
        Ok(fake_customer(customer_id))
    }

    pub async fn create_order(&mut self, request: OrderRequest) -> Result<Order, BackendError> {
        tokio::time::sleep(self.latency).await;

        if request.lines.is_empty() {
            return Err(BackendError::EmptyOrder);
        }
        for line in &request.lines {
            if line.quantity == 0 {
                return Err(BackendError::ZeroQuantity(line.article_id.clone()));
            }
        }

        let total = request
            .lines
            .iter()
            .map(|line| fake_article(&line.article_id).price * f64::from(line.quantity))
            .sum();
        let order = Order {
            id: format!("ORD-{:06}", self.next_order),
            customer_id: request.customer_id,
            lines: request.lines,
            total,
        };
        self.next_order += 1;
        self.orders.push(order.clone());
        Ok(order)
    }

    /// Orders created over this connection's lifetime.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}

fn fake_article(article_id: &str) -> Article {
    Article {
        id: article_id.to_string(),
        name: format!("Fake Article {article_id}"),
        description: format!("Development article {article_id}"),
        price: 19.90,
        stock: 100,
    }
}

fn fake_customer(customer_id: &str) -> Customer {
    Customer {
        id: customer_id.to_string(),
        name: format!("Fake Customer {customer_id}"),
        email: format!("customer-{customer_id}@example.test"),
    }
}

/// Connector producing one [`FakeErpConnection`] per tenant.
#[derive(Clone, Debug)]
pub struct FakeErpConnector {
    latency: Duration,
}

impl FakeErpConnector {
    pub fn new() -> Self {
        Self::with_latency(Duration::from_millis(2))
    }

    /// Simulated per-call backend latency.
    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for FakeErpConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ErpConnector<FakeErpConnection> for FakeErpConnector {
    async fn connect(&self, tenant: &TenantKey) -> Result<FakeErpConnection, BoxError> {
        tokio::time::sleep(self.latency).await;
        Ok(FakeErpConnection::new(tenant.clone(), self.latency))
    }
}
