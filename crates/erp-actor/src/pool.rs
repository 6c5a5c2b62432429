//! # Actor Pool
//!
//! Process-wide registry mapping tenant keys to actors. The pool guarantees
//! that for any given key exactly one live actor is ever observed, even
//! under concurrent first access, without serializing unrelated tenants
//! behind one lock: lookups go through the concurrent map's atomic
//! entry API, so only same-key callers contend.

use crate::actor::{ActorStats, ErpActor, Lifecycle};
use crate::config::ActorConfig;
use crate::connector::ErpConnector;
use crate::error::ActorError;
use crate::tenant::TenantKey;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Creates and reuses exactly one actor per tenant key.
///
/// A crashed or disposed instance found in the map is evicted and replaced
/// with a fresh actor on lookup, so one dead worker never permanently
/// disables a tenant.
pub struct ErpActorPool<C> {
    actors: DashMap<TenantKey, Arc<ErpActor<C>>>,
    connector: Arc<dyn ErpConnector<C>>,
    config: ActorConfig,
}

impl<C: Send + 'static> ErpActorPool<C> {
    pub fn new(connector: impl ErpConnector<C> + 'static) -> Self {
        Self::with_config(connector, ActorConfig::default())
    }

    pub fn with_config(connector: impl ErpConnector<C> + 'static, config: ActorConfig) -> Self {
        Self {
            actors: DashMap::new(),
            connector: Arc::new(connector),
            config,
        }
    }

    /// Returns the tenant's actor, constructing it on first access and
    /// triggering its (idempotent) connection initialization.
    pub async fn actor(&self, tenant: &TenantKey) -> Result<Arc<ErpActor<C>>, ActorError> {
        let actor = self.lookup(tenant);
        actor.initialize(self.connector.as_ref()).await?;
        Ok(actor)
    }

    /// Peeks at an existing actor without constructing one.
    pub fn get(&self, tenant: &TenantKey) -> Option<Arc<ErpActor<C>>> {
        self.actors.get(tenant).map(|entry| entry.value().clone())
    }

    /// Pre-creates and initializes actors for a set of tenants.
    pub async fn warmup(&self, tenants: &[TenantKey]) -> Result<(), ActorError> {
        for tenant in tenants {
            self.actor(tenant).await?;
        }
        info!(count = tenants.len(), "Pool warmed up");
        Ok(())
    }

    /// Shuts down every actor that was actually constructed and clears the
    /// map. Idempotent.
    pub async fn shutdown_all(&self) {
        let actors: Vec<_> = self
            .actors
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        self.actors.clear();

        if actors.is_empty() {
            return;
        }
        info!(count = actors.len(), "Disposing all actors");
        for actor in actors {
            actor.shutdown().await;
        }
    }

    /// Health snapshots for every constructed actor.
    pub fn stats(&self) -> Vec<ActorStats> {
        self.actors
            .iter()
            .map(|entry| entry.value().stats())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    fn lookup(&self, tenant: &TenantKey) -> Arc<ErpActor<C>> {
        match self.actors.entry(tenant.clone()) {
            Entry::Occupied(mut occupied) => {
                let dead = {
                    let actor = occupied.get();
                    actor.has_crashed()
                        || matches!(
                            actor.state(),
                            Lifecycle::ShuttingDown | Lifecycle::Disposed
                        )
                };
                if dead {
                    warn!(tenant = %tenant, "Evicting dead actor");
                    let fresh = Arc::new(ErpActor::new(tenant.clone(), self.config.clone()));
                    occupied.insert(fresh.clone());
                    fresh
                } else {
                    occupied.get().clone()
                }
            }
            Entry::Vacant(vacant) => {
                let actor = Arc::new(ErpActor::new(tenant.clone(), self.config.clone()));
                vacant.insert(actor.clone());
                actor
            }
        }
    }
}
