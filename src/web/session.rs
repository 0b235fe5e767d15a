//! Per-session carts held in process memory.

use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use crate::domain::aggregates::Cart;

/// Each cart sits behind its own lock so a slow checkout on one session
/// never blocks another.
#[derive(Clone)]
pub struct CartSessions {
    carts: Arc<RwLock<HashMap<String, Arc<Mutex<Cart>>>>>,
    currency: String,
}

impl CartSessions {
    pub fn new(currency: impl Into<String>) -> Self {
        Self { carts: Arc::default(), currency: currency.into() }
    }

    pub fn currency(&self) -> &str { &self.currency }

    /// Returns the session's cart, creating an empty one on first use.
    /// Only mutating routes call this; reads go through [`CartSessions::peek`].
    pub async fn cart(&self, session: &str) -> Arc<Mutex<Cart>> {
        if let Some(cart) = self.peek(session).await {
            return cart;
        }
        let mut carts = self.carts.write().await;
        carts.entry(session.to_string()).or_insert_with(|| Arc::new(Mutex::new(Cart::new(&self.currency)))).clone()
    }

    /// The session's cart if one exists. Never creates.
    pub async fn peek(&self, session: &str) -> Option<Arc<Mutex<Cart>>> {
        self.carts.read().await.get(session).cloned()
    }

    pub async fn forget(&self, session: &str) {
        self.carts.write().await.remove(session);
    }

    pub async fn len(&self) -> usize { self.carts.read().await.len() }

    /// Drops carts untouched for at least `ttl`. A cart whose lock is held is in use and stays.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let cutoff = Utc::now() - ttl;
        let mut carts = self.carts.write().await;
        let before = carts.len();
        carts.retain(|_, cart| cart.try_lock().map_or(true, |cart| cart.updated_at() > cutoff));
        before - carts.len()
    }

    /// Sweeps idle carts every `every` until `shutdown` fires.
    pub fn spawn_eviction(&self, ttl: Duration, every: std::time::Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let sessions = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = sessions.evict_idle(ttl).await;
                        if evicted > 0 { tracing::debug!(evicted, "idle carts evicted"); }
                    }
                }
            }
        })
    }
}
