use crate::domain::card::{BalanceDelta, CardNumber, CardRecord};
use crate::domain::ports::CardStore;
use crate::error::{BankError, Result};
use crate::infrastructure::in_memory::stage_deltas;
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Column Family for storing card records.
pub const CF_CARDS: &str = "cards";

/// A persistent store implementation using RocksDB.
///
/// Records live in the `cards` column family keyed by the card number and
/// encoded with `serde_json`.
///
/// RocksDB holds an exclusive lock on the directory, so this process is the
/// only writer. Writes are serialized through `write_lock`: the read of the
/// current rows and the `WriteBatch` that replaces them happen under the same
/// guard, and a batch becomes visible to readers in one step.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the `cards` column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_cards = ColumnFamilyDescriptor::new(CF_CARDS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_cards])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cards(&self) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(CF_CARDS)
            .ok_or_else(|| BankError::StoreUnavailable("cards column family not found".to_string()))
    }

    fn read(&self, number: &CardNumber) -> Result<Option<CardRecord>> {
        let cf = self.cards()?;
        match self.db.get_cf(cf, number.as_str())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| BankError::StoreUnavailable("writer lock poisoned".to_string()))
    }

    /// Runs `op` on the blocking thread pool and awaits it.
    ///
    /// RocksDB calls and the writer lock block the calling thread, so they
    /// never run on an async worker directly.
    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&RocksDBStore) -> Result<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(&store)).await?
    }

    fn insert_now(&self, record: &CardRecord) -> Result<()> {
        let _guard = self.lock()?;
        let cf = self.cards()?;
        if self.db.get_pinned_cf(cf, record.number.as_str())?.is_some() {
            return Err(BankError::UniquenessViolation);
        }
        let value = serde_json::to_vec(record)?;
        self.db.put_cf(cf, record.number.as_str(), value)?;
        debug!(number = %record.number, "card record inserted");
        Ok(())
    }

    fn delete_now(&self, number: &CardNumber) -> Result<()> {
        let _guard = self.lock()?;
        let cf = self.cards()?;
        if self.db.get_pinned_cf(cf, number.as_str())?.is_none() {
            return Err(BankError::NotFound);
        }
        self.db.delete_cf(cf, number.as_str())?;
        debug!(%number, "card record deleted");
        Ok(())
    }

    fn apply_now(&self, deltas: &[BalanceDelta]) -> Result<()> {
        let _guard = self.lock()?;
        let cf = self.cards()?;
        let staged = stage_deltas(deltas, |number| self.read(number))?;

        let mut batch = WriteBatch::default();
        for (number, record) in &staged {
            batch.put_cf(cf, number.as_str(), serde_json::to_vec(record)?);
        }
        self.db.write(batch)?;
        debug!(rows = staged.len(), "balance batch committed");
        Ok(())
    }

    fn scan(&self) -> Result<Vec<CardRecord>> {
        let cf = self.cards()?;
        let mut cards = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            cards.push(serde_json::from_slice(&value)?);
        }
        Ok(cards)
    }
}

#[async_trait]
impl CardStore for RocksDBStore {
    async fn find(&self, number: &CardNumber) -> Result<Option<CardRecord>> {
        let number = number.clone();
        self.blocking(move |store| store.read(&number)).await
    }

    async fn insert(&self, record: CardRecord) -> Result<()> {
        self.blocking(move |store| store.insert_now(&record)).await
    }

    async fn delete(&self, number: &CardNumber) -> Result<()> {
        let number = number.clone();
        self.blocking(move |store| store.delete_now(&number)).await
    }

    async fn apply_balance_deltas(&self, deltas: &[BalanceDelta]) -> Result<()> {
        let deltas = deltas.to_vec();
        self.blocking(move |store| store.apply_now(&deltas)).await
    }

    async fn all_cards(&self) -> Result<Vec<CardRecord>> {
        self.blocking(|store| store.scan()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::card::{Amount, Balance};
    use crate::infrastructure::timeout::TimeoutStore;
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    fn number(s: &str) -> CardNumber {
        CardNumber::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");
        assert!(store.db.cf_handle(CF_CARDS).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_card_lifecycle() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let a = number("4000008449433403");

        store
            .insert(CardRecord::new(a.clone(), "h".to_string()))
            .await
            .unwrap();
        assert!(matches!(
            store.insert(CardRecord::new(a.clone(), "other".to_string())).await,
            Err(BankError::UniquenessViolation)
        ));

        let found = store.find(&a).await.unwrap().unwrap();
        assert_eq!(found.pin_hash, "h");
        assert_eq!(found.balance, Balance::ZERO);

        store.delete(&a).await.unwrap();
        assert!(store.find(&a).await.unwrap().is_none());
        assert!(matches!(store.delete(&a).await, Err(BankError::NotFound)));
    }

    #[tokio::test]
    async fn test_rocksdb_balance_batch() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let a = number("4000008449433403");
        let b = number("4000003972196501");
        store
            .insert(CardRecord::new(a.clone(), "ha".to_string()))
            .await
            .unwrap();
        store
            .insert(CardRecord::new(b.clone(), "hb".to_string()))
            .await
            .unwrap();

        let ten = Amount::new(10).unwrap();
        store
            .apply_balance_deltas(&[BalanceDelta::credit(a.clone(), ten)])
            .await
            .unwrap();

        let over = Amount::new(11).unwrap();
        let result = store
            .apply_balance_deltas(&[
                BalanceDelta::debit(a.clone(), over),
                BalanceDelta::credit(b.clone(), over),
            ])
            .await;
        assert!(matches!(result, Err(BankError::InsufficientFunds)));

        store
            .apply_balance_deltas(&[
                BalanceDelta::debit(a.clone(), ten),
                BalanceDelta::credit(b.clone(), ten),
            ])
            .await
            .unwrap();

        let all = store.all_cards().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].number, b);
        assert_eq!(all[0].balance, Balance::new(10));
        assert_eq!(all[1].balance, Balance::ZERO);
    }

    #[tokio::test]
    async fn test_rocksdb_reopen_keeps_records() {
        let dir = tempdir().unwrap();
        let a = number("4000008449433403");
        {
            let store = RocksDBStore::open(dir.path()).unwrap();
            store
                .insert(CardRecord::new(a.clone(), "h".to_string()))
                .await
                .unwrap();
        }
        let store = RocksDBStore::open(dir.path()).unwrap();
        assert!(store.exists(&a).await.unwrap());
    }

    #[tokio::test]
    async fn test_rocksdb_waiting_writer_times_out() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let bounded = TimeoutStore::new(store.clone(), Some(Duration::from_millis(50)));
        let a = number("4000008449433403");

        let guard = store.write_lock.lock().unwrap();
        let started = Instant::now();
        let result = bounded
            .insert(CardRecord::new(a.clone(), "h".to_string()))
            .await;
        assert!(matches!(result, Err(BankError::StoreUnavailable(_))));
        assert!(started.elapsed() < Duration::from_secs(2));
        drop(guard);

        // The abandoned insert still runs once the lock is free.
        for _ in 0..200 {
            if store.exists(&a).await.unwrap() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("late insert never landed");
    }
}
