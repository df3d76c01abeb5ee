use crate::domain::card::{BODY_LEN, CardNumber};
use crate::domain::ports::SharedCardStore;
use crate::error::{BankError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use tracing::warn;

const BODY_SPACE: u64 = 10u64.pow(BODY_LEN as u32);

/// Draws fresh card numbers that are not yet in the store.
pub struct NumberGenerator {
    store: SharedCardStore,
    iin: String,
    max_attempts: u32,
    rng: Mutex<StdRng>,
}

impl NumberGenerator {
    pub fn new(store: SharedCardStore, iin: impl Into<String>, max_attempts: u32) -> Self {
        Self::with_rng(store, iin, max_attempts, StdRng::from_entropy())
    }

    /// Uses the given random source; tests pass a seeded one.
    pub fn with_rng(
        store: SharedCardStore,
        iin: impl Into<String>,
        max_attempts: u32,
        rng: StdRng,
    ) -> Self {
        Self {
            store,
            iin: iin.into(),
            max_attempts,
            rng: Mutex::new(rng),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Draws a 4-digit PIN from the same random source.
    pub fn draw_pin(&self) -> Result<String> {
        let pin: u16 = self.rng()?.gen_range(0..10_000);
        Ok(format!("{pin:04}"))
    }

    fn rng(&self) -> Result<std::sync::MutexGuard<'_, StdRng>> {
        self.rng
            .lock()
            .map_err(|_| BankError::Internal("random source lock poisoned".to_string()))
    }

    fn candidate(&self) -> Result<CardNumber> {
        let body: u64 = self.rng()?.gen_range(0..BODY_SPACE);
        CardNumber::from_payload(format!("{}{body:0width$}", self.iin, width = BODY_LEN))
    }

    /// Returns a checksum-valid number absent from the store.
    ///
    /// Gives up with `ResourceExhausted` after `max_attempts` collisions.
    pub async fn generate(&self) -> Result<CardNumber> {
        for attempt in 1..=self.max_attempts {
            let number = self.candidate()?;
            if !self.store.exists(&number).await? {
                return Ok(number);
            }
            warn!(attempt, "generated card number already issued, drawing again");
        }
        Err(BankError::ResourceExhausted(self.max_attempts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::card::{BalanceDelta, CardRecord};
    use crate::domain::checksum;
    use crate::domain::ports::CardStore;
    use crate::infrastructure::in_memory::InMemoryCardStore;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Arc;

    /// Reports every number as taken.
    struct FullStore;

    #[async_trait]
    impl CardStore for FullStore {
        async fn find(&self, number: &CardNumber) -> Result<Option<CardRecord>> {
            Ok(Some(CardRecord::new(number.clone(), String::new())))
        }
        async fn insert(&self, _record: CardRecord) -> Result<()> {
            Err(BankError::UniquenessViolation)
        }
        async fn delete(&self, _number: &CardNumber) -> Result<()> {
            Ok(())
        }
        async fn apply_balance_deltas(&self, _deltas: &[BalanceDelta]) -> Result<()> {
            Ok(())
        }
        async fn all_cards(&self) -> Result<Vec<CardRecord>> {
            Ok(Vec::new())
        }
    }

    fn seeded(store: SharedCardStore, seed: u64) -> NumberGenerator {
        NumberGenerator::with_rng(store, "400000", 8, StdRng::seed_from_u64(seed))
    }

    #[tokio::test]
    async fn test_generated_numbers_are_well_formed() {
        let generator = seeded(Arc::new(InMemoryCardStore::new()), 1);
        for _ in 0..100 {
            let number = generator.generate().await.unwrap();
            assert_eq!(number.as_str().len(), 16);
            assert!(number.as_str().starts_with("400000"));
            assert!(checksum::is_valid(number.as_str()).unwrap());
        }
    }

    #[tokio::test]
    async fn test_never_returns_stored_number() {
        let store = InMemoryCardStore::new();
        let shared: SharedCardStore = Arc::new(store.clone());
        let generator = seeded(shared, 2);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let number = generator.generate().await.unwrap();
            assert!(!store.exists(&number).await.unwrap());
            store
                .insert(CardRecord::new(number.clone(), String::new()))
                .await
                .unwrap();
            assert!(seen.insert(number));
        }
    }

    #[tokio::test]
    async fn test_skips_collisions() {
        // A generator with the same seed replays the same sequence, so the
        // first draw of the second generator is already stored.
        let store = InMemoryCardStore::new();
        let first = seeded(Arc::new(store.clone()), 3).generate().await.unwrap();
        store
            .insert(CardRecord::new(first.clone(), String::new()))
            .await
            .unwrap();

        let second = seeded(Arc::new(store.clone()), 3).generate().await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_exhaustion_is_reported() {
        let generator = seeded(Arc::new(FullStore), 4);
        let result = generator.generate().await;
        assert!(matches!(result, Err(BankError::ResourceExhausted(8))));
    }

    #[test]
    fn test_pin_is_four_digits() {
        let generator = seeded(Arc::new(InMemoryCardStore::new()), 5);
        for _ in 0..100 {
            let pin = generator.draw_pin().unwrap();
            assert_eq!(pin.len(), 4);
            assert!(pin.bytes().all(|b| b.is_ascii_digit()));
        }
    }
}
