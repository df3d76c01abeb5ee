use crate::domain::card::CardNumber;
use crate::domain::ports::SharedCardStore;
use crate::error::{BankError, Result};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use tracing::warn;

/// Salted Argon2 hashing of PINs.
#[derive(Clone, Default)]
pub struct PinHasher {
    argon2: Argon2<'static>,
}

impl PinHasher {
    /// Argon2id with explicit cost parameters.
    pub fn with_params(m_cost_kib: u32, t_cost: u32) -> Result<Self> {
        let params = Params::new(m_cost_kib, t_cost, 1, None)
            .map_err(|e| BankError::Internal(format!("argon2 params: {e}")))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Returns a PHC string carrying algorithm, parameters, salt and hash.
    ///
    /// Runs on the blocking thread pool.
    pub async fn hash(&self, pin: &str) -> Result<String> {
        let hasher = self.clone();
        let pin = pin.to_string();
        tokio::task::spawn_blocking(move || hasher.hash_now(&pin)).await?
    }

    /// Verifies against the parameters recorded in `stored`, on the blocking
    /// thread pool.
    pub async fn verify(&self, pin: &str, stored: &str) -> Result<bool> {
        let hasher = self.clone();
        let (pin, stored) = (pin.to_string(), stored.to_string());
        Ok(tokio::task::spawn_blocking(move || hasher.verify_now(&pin, &stored)).await?)
    }

    fn hash_now(&self, pin: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(pin.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| BankError::Internal(format!("hashing PIN: {e}")))
    }

    fn verify_now(&self, pin: &str, stored: &str) -> bool {
        match PasswordHash::new(stored) {
            Ok(parsed) => self.argon2.verify_password(pin.as_bytes(), &parsed).is_ok(),
            Err(_) => false,
        }
    }
}

/// Proof that a card number and PIN were verified together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    card: CardNumber,
}

impl Session {
    pub fn card(&self) -> &CardNumber {
        &self.card
    }
}

pub struct Authenticator {
    store: SharedCardStore,
    hasher: PinHasher,
    // Verified against when the card is unknown so both failure paths cost
    // one hash.
    dummy_hash: String,
}

impl Authenticator {
    pub fn new(store: SharedCardStore, hasher: PinHasher) -> Result<Self> {
        let dummy_hash = hasher.hash_now("0000")?;
        Ok(Self {
            store,
            hasher,
            dummy_hash,
        })
    }

    pub fn hasher(&self) -> &PinHasher {
        &self.hasher
    }

    /// Fails with `AuthenticationFailed` for a malformed or unknown number and
    /// for a wrong PIN alike. Store errors pass through.
    pub async fn authenticate(&self, number: &str, pin: &str) -> Result<Session> {
        let record = match CardNumber::parse(number) {
            Ok(card) => self.store.find(&card).await?,
            Err(_) => None,
        };

        match record {
            Some(record) => {
                if self.hasher.verify(pin, &record.pin_hash).await? {
                    return Ok(Session {
                        card: record.number,
                    });
                }
            }
            None => {
                self.hasher.verify(pin, &self.dummy_hash).await?;
            }
        }
        warn!("login rejected");
        Err(BankError::AuthenticationFailed)
    }
}
