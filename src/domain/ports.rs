use super::card::{BalanceDelta, CardNumber, CardRecord};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Durable storage of card records.
///
/// Implementations enforce uniqueness of card numbers at insert time and
/// apply every balance batch atomically: readers see either all of its
/// changes or none of them.
#[async_trait]
pub trait CardStore: Send + Sync {
    async fn find(&self, number: &CardNumber) -> Result<Option<CardRecord>>;

    /// Fails with `UniquenessViolation` if the number is already stored.
    async fn insert(&self, record: CardRecord) -> Result<()>;

    /// Fails with `NotFound` if the number is not stored.
    async fn delete(&self, number: &CardNumber) -> Result<()>;

    /// Applies all deltas or none of them.
    ///
    /// Fails with `NotFound` if any row is missing and with
    /// `InsufficientFunds` if a debit would take its row below zero.
    async fn apply_balance_deltas(&self, deltas: &[BalanceDelta]) -> Result<()>;

    /// All records ordered by card number.
    async fn all_cards(&self) -> Result<Vec<CardRecord>>;

    async fn exists(&self, number: &CardNumber) -> Result<bool> {
        Ok(self.find(number).await?.is_some())
    }
}

pub type CardStoreBox = Box<dyn CardStore>;
pub type SharedCardStore = Arc<dyn CardStore>;

#[async_trait]
impl<S: CardStore + ?Sized> CardStore for Box<S> {
    async fn find(&self, number: &CardNumber) -> Result<Option<CardRecord>> {
        (**self).find(number).await
    }

    async fn insert(&self, record: CardRecord) -> Result<()> {
        (**self).insert(record).await
    }

    async fn delete(&self, number: &CardNumber) -> Result<()> {
        (**self).delete(number).await
    }

    async fn apply_balance_deltas(&self, deltas: &[BalanceDelta]) -> Result<()> {
        (**self).apply_balance_deltas(deltas).await
    }

    async fn all_cards(&self) -> Result<Vec<CardRecord>> {
        (**self).all_cards().await
    }

    async fn exists(&self, number: &CardNumber) -> Result<bool> {
        (**self).exists(number).await
    }
}
