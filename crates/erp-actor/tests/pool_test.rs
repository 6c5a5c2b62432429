use erp_actor::mock::MockConnector;
use erp_actor::{ActorError, ErpActorPool, Lifecycle, TenantKey};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn one_actor_per_tenant_key() {
    let connector = Arc::new(MockConnector::new());
    let pool = ErpActorPool::new(connector.clone());

    let first = pool.actor(&TenantKey::new("acme")).await.unwrap();
    let second = pool.actor(&TenantKey::new("acme")).await.unwrap();
    let other = pool.actor(&TenantKey::new("globex")).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(!Arc::ptr_eq(&first, &other));
    assert_eq!(pool.len(), 2);
    assert_eq!(connector.connect_count(), 2);
}

#[tokio::test]
async fn business_units_get_their_own_actor() {
    let connector = Arc::new(MockConnector::new());
    let pool = ErpActorPool::new(connector.clone());

    let default_unit = pool.actor(&TenantKey::new("acme")).await.unwrap();
    let unit_ten = pool
        .actor(&TenantKey::with_business_unit("acme", "10"))
        .await
        .unwrap();

    assert!(!Arc::ptr_eq(&default_unit, &unit_ten));
    assert_eq!(pool.len(), 2);
}

#[tokio::test]
async fn concurrent_lookups_observe_one_instance() {
    let connector = Arc::new(MockConnector::new());
    let pool = Arc::new(ErpActorPool::new(connector.clone()));
    let tenant = TenantKey::new("acme");

    let mut handles = Vec::new();
    for _ in 0..50 {
        let pool = pool.clone();
        let tenant = tenant.clone();
        handles.push(tokio::spawn(async move { pool.actor(&tenant).await }));
    }
    let mut actors = Vec::new();
    for handle in handles {
        actors.push(handle.await.unwrap().unwrap());
    }

    let first = &actors[0];
    assert!(actors.iter().all(|actor| Arc::ptr_eq(actor, first)));
    assert_eq!(pool.len(), 1);
    assert_eq!(connector.connect_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn tenants_run_in_parallel() {
    let connector = Arc::new(MockConnector::new());
    let pool = ErpActorPool::new(connector.clone());

    let acme = pool.actor(&TenantKey::new("acme")).await.unwrap();
    let globex = pool.actor(&TenantKey::new("globex")).await.unwrap();

    let started = tokio::time::Instant::now();
    let (first, second) = tokio::join!(
        acme.execute(|conn, _signal| Box::pin(async move {
            Ok(conn.call("report", Duration::from_millis(100)).await)
        })),
        globex.execute(|conn, _signal| Box::pin(async move {
            Ok(conn.call("report", Duration::from_millis(100)).await)
        })),
    );
    first.unwrap();
    second.unwrap();

    let total = started.elapsed();
    assert!(total < Duration::from_millis(150), "took {total:?}");
}

#[tokio::test]
async fn failed_initialization_retries_on_next_lookup() {
    let connector = Arc::new(MockConnector::failing_first(1));
    let pool = ErpActorPool::new(connector.clone());
    let tenant = TenantKey::new("acme");

    let err = pool.actor(&tenant).await.unwrap_err();
    assert!(matches!(err, ActorError::InitFailed(_)));

    let actor = pool.actor(&tenant).await.unwrap();
    assert!(actor.is_ready());
    assert_eq!(connector.connect_count(), 2);
    assert_eq!(pool.len(), 1);
}

#[tokio::test]
async fn disposed_actor_is_replaced_on_lookup() {
    let connector = Arc::new(MockConnector::new());
    let pool = ErpActorPool::new(connector.clone());
    let tenant = TenantKey::new("acme");

    let first = pool.actor(&tenant).await.unwrap();
    first.shutdown().await;
    assert_eq!(first.state(), Lifecycle::Disposed);

    let second = pool.actor(&tenant).await.unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(second.is_ready());
    assert_eq!(connector.connect_count(), 2);
}

#[tokio::test]
async fn get_does_not_construct() {
    let connector = Arc::new(MockConnector::new());
    let pool: ErpActorPool<erp_actor::mock::MockConnection> = ErpActorPool::new(connector.clone());

    assert!(pool.get(&TenantKey::new("acme")).is_none());
    assert!(pool.is_empty());
    assert_eq!(connector.connect_count(), 0);
}

#[tokio::test]
async fn warmup_constructs_and_initializes() {
    let connector = Arc::new(MockConnector::new());
    let pool = ErpActorPool::new(connector.clone());
    let tenants = vec![
        TenantKey::new("acme"),
        TenantKey::with_business_unit("acme", "10"),
        TenantKey::new("globex"),
    ];

    pool.warmup(&tenants).await.unwrap();

    assert_eq!(pool.len(), 3);
    assert_eq!(connector.connect_count(), 3);
    let stats = pool.stats();
    assert_eq!(stats.len(), 3);
    assert!(stats.iter().all(|snapshot| snapshot.is_ready));
}

#[tokio::test]
async fn shutdown_all_disposes_constructed_actors() {
    let connector = Arc::new(MockConnector::new());
    let pool = ErpActorPool::new(connector.clone());

    let acme = pool.actor(&TenantKey::new("acme")).await.unwrap();
    let globex = pool.actor(&TenantKey::new("globex")).await.unwrap();

    pool.shutdown_all().await;

    assert!(pool.is_empty());
    assert_eq!(acme.state(), Lifecycle::Disposed);
    assert_eq!(globex.state(), Lifecycle::Disposed);

    // Second teardown is a no-op.
    pool.shutdown_all().await;
    assert!(pool.is_empty());
}
