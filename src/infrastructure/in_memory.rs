use crate::domain::card::{BalanceDelta, CardNumber, CardRecord};
use crate::domain::ports::CardStore;
use crate::error::{BankError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for card records.
///
/// Uses `Arc<RwLock<BTreeMap<CardNumber, CardRecord>>>` so clones share the
/// same map. Every mutation runs under one write guard, which makes each
/// balance batch atomic with respect to readers.
#[derive(Default, Clone)]
pub struct InMemoryCardStore {
    cards: Arc<RwLock<BTreeMap<CardNumber, CardRecord>>>,
}

impl InMemoryCardStore {
    /// Creates a new, empty in-memory card store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Computes the post-batch balance of every touched row without writing.
pub(crate) fn stage_deltas<F>(
    deltas: &[BalanceDelta],
    mut lookup: F,
) -> Result<BTreeMap<CardNumber, CardRecord>>
where
    F: FnMut(&CardNumber) -> Result<Option<CardRecord>>,
{
    let mut staged: BTreeMap<CardNumber, CardRecord> = BTreeMap::new();
    for delta in deltas {
        if !staged.contains_key(&delta.number) {
            let record = lookup(&delta.number)?.ok_or(BankError::NotFound)?;
            staged.insert(delta.number.clone(), record);
        }
        if let Some(record) = staged.get_mut(&delta.number) {
            record.balance = record.balance.apply(delta.change)?;
        }
    }
    Ok(staged)
}

#[async_trait]
impl CardStore for InMemoryCardStore {
    async fn find(&self, number: &CardNumber) -> Result<Option<CardRecord>> {
        let cards = self.cards.read().await;
        Ok(cards.get(number).cloned())
    }

    async fn insert(&self, record: CardRecord) -> Result<()> {
        let mut cards = self.cards.write().await;
        if cards.contains_key(&record.number) {
            return Err(BankError::UniquenessViolation);
        }
        cards.insert(record.number.clone(), record);
        Ok(())
    }

    async fn delete(&self, number: &CardNumber) -> Result<()> {
        let mut cards = self.cards.write().await;
        cards.remove(number).map(|_| ()).ok_or(BankError::NotFound)
    }

    async fn apply_balance_deltas(&self, deltas: &[BalanceDelta]) -> Result<()> {
        let mut cards = self.cards.write().await;
        let staged = stage_deltas(deltas, |number| Ok(cards.get(number).cloned()))?;
        cards.extend(staged);
        Ok(())
    }

    async fn all_cards(&self) -> Result<Vec<CardRecord>> {
        let cards = self.cards.read().await;
        Ok(cards.values().cloned().collect())
    }
}
