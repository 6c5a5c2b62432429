use erp_actor::{ActorError, ErpActorPool};
use erp_sample::backend::{FakeErpConnector, OrderLine, OrderRequest};
use erp_sample::service::ErpService;
use std::sync::Arc;
use std::time::Duration;

fn service() -> ErpService {
    let connector = FakeErpConnector::with_latency(Duration::from_millis(1));
    ErpService::new(Arc::new(ErpActorPool::new(connector)))
}

#[tokio::test]
async fn fetches_articles_and_customers() {
    let service = service();

    let article = service.article("acme", None, "1000").await.unwrap();
    assert_eq!(article.id, "1000");
    assert_eq!(article.name, "Fake Article 1000");

    let customer = service.customer("acme", None, "77").await.unwrap();
    assert_eq!(customer.email, "customer-77@example.test");

    service.shutdown().await;
}

#[tokio::test]
async fn bulk_article_fetch_preserves_order() {
    let service = service();

    let ids: Vec<String> = ["3", "1", "2"].iter().map(|s| s.to_string()).collect();
    let articles = service.articles("acme", None, ids.clone()).await.unwrap();

    let fetched: Vec<&str> = articles.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(fetched, vec!["3", "1", "2"]);

    service.shutdown().await;
}

#[tokio::test]
async fn order_creation_computes_totals() {
    let service = service();

    let order = service
        .create_order(
            "acme",
            None,
            OrderRequest {
                customer_id: "77".into(),
                lines: vec![
                    OrderLine {
                        article_id: "1000".into(),
                        quantity: 2,
                    },
                    OrderLine {
                        article_id: "1001".into(),
                        quantity: 1,
                    },
                ],
            },
        )
        .await
        .unwrap();

    assert_eq!(order.id, "ORD-000001");
    assert!((order.total - 3.0 * 19.90).abs() < 1e-9);

    service.shutdown().await;
}

#[tokio::test]
async fn invalid_orders_fail_as_execution_errors() {
    let service = service();

    let err = service
        .create_order(
            "acme",
            None,
            OrderRequest {
                customer_id: "77".into(),
                lines: vec![],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ActorError::Execution(_)));

    service.shutdown().await;
}

#[tokio::test]
async fn tenants_keep_isolated_state() {
    let service = service();
    let request = OrderRequest {
        customer_id: "77".into(),
        lines: vec![OrderLine {
            article_id: "1000".into(),
            quantity: 1,
        }],
    };

    service
        .create_order("acme", None, request.clone())
        .await
        .unwrap();
    service
        .create_order("acme", None, request.clone())
        .await
        .unwrap();
    service
        .create_order("globex", None, request)
        .await
        .unwrap();

    assert_eq!(service.order_count("acme", None).await.unwrap(), 2);
    assert_eq!(service.order_count("globex", None).await.unwrap(), 1);

    // Business units are separate contexts with their own connection.
    assert_eq!(service.order_count("acme", Some("10")).await.unwrap(), 0);

    service.shutdown().await;
}
