//! Demo binary: several tenants hammering the fake ERP through the
//! serializing actor pool.

use erp_actor::{ActorConfig, ErpActorPool, TenantKey};
use erp_sample::backend::{FakeErpConnector, OrderLine, OrderRequest};
use erp_sample::lifecycle::setup_tracing;
use erp_sample::service::ErpService;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();
    info!("Starting ERP gateway sample");

    let config = ActorConfig::default()
        .with_queue_capacity(100)
        .with_default_deadline(Duration::from_secs(5));
    let connector = FakeErpConnector::with_latency(Duration::from_millis(5));
    let pool = Arc::new(ErpActorPool::with_config(connector, config));

    let tenants = [
        TenantKey::new("acme"),
        TenantKey::with_business_unit("acme", "10"),
        TenantKey::new("globex"),
    ];
    pool.warmup(&tenants).await?;

    let service = ErpService::new(pool.clone());

    // Different tenants run in parallel; calls within one tenant are
    // serialized by its actor.
    let (article, scoped_article, customer) = tokio::join!(
        service.article("acme", None, "1000"),
        service.article("acme", Some("10"), "2000"),
        service.customer("globex", None, "77"),
    );
    let article = article?;
    let scoped_article = scoped_article?;
    let customer = customer?;
    info!(name = %article.name, "Fetched article");
    info!(name = %scoped_article.name, "Fetched business-unit article");
    info!(email = %customer.email, "Fetched customer");

    let order = service
        .create_order(
            "acme",
            None,
            OrderRequest {
                customer_id: "77".into(),
                lines: vec![
                    OrderLine {
                        article_id: "1000".into(),
                        quantity: 3,
                    },
                    OrderLine {
                        article_id: "1001".into(),
                        quantity: 1,
                    },
                ],
            },
        )
        .await?;
    info!(order_id = %order.id, total = order.total, "Order created");

    for snapshot in service.stats() {
        info!(%snapshot, "Actor health");
    }

    service.shutdown().await;
    info!("Sample finished");
    Ok(())
}
