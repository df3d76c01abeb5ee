use crate::domain::card::{BalanceDelta, CardNumber, CardRecord};
use crate::domain::ports::CardStore;
use crate::error::{BankError, Result};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Wraps a store so that no call blocks longer than `limit`.
///
/// An elapsed call surfaces as `StoreUnavailable`. With `limit == None`
/// calls are forwarded untouched.
///
/// The deadline is checked whenever the inner future yields, so adapters
/// must run blocking I/O on the blocking pool (as `RocksDBStore` does).
/// An abandoned call may still complete in the background.
pub struct TimeoutStore<S> {
    inner: S,
    limit: Option<Duration>,
}

impl<S: CardStore> TimeoutStore<S> {
    pub fn new(inner: S, limit: Option<Duration>) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(&self, op: &'static str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match self.limit {
            None => fut.await,
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(op, limit_ms = limit.as_millis() as u64, "record store call timed out");
                    Err(BankError::StoreUnavailable(format!(
                        "{op} timed out after {limit:?}"
                    )))
                }
            },
        }
    }
}

#[async_trait]
impl<S: CardStore> CardStore for TimeoutStore<S> {
    async fn find(&self, number: &CardNumber) -> Result<Option<CardRecord>> {
        self.bounded("find", self.inner.find(number)).await
    }

    async fn insert(&self, record: CardRecord) -> Result<()> {
        self.bounded("insert", self.inner.insert(record)).await
    }

    async fn delete(&self, number: &CardNumber) -> Result<()> {
        self.bounded("delete", self.inner.delete(number)).await
    }

    async fn apply_balance_deltas(&self, deltas: &[BalanceDelta]) -> Result<()> {
        self.bounded("apply_balance_deltas", self.inner.apply_balance_deltas(deltas))
            .await
    }

    async fn all_cards(&self) -> Result<Vec<CardRecord>> {
        self.bounded("all_cards", self.inner.all_cards()).await
    }

    async fn exists(&self, number: &CardNumber) -> Result<bool> {
        self.bounded("exists", self.inner.exists(number)).await
    }
}
