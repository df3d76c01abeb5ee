use crate::domain::card::IIN_LEN;
use crate::error::{BankError, Result};
use std::time::Duration;

pub const DEFAULT_IIN: &str = "400000";
pub const DEFAULT_MAX_GENERATE_ATTEMPTS: u32 = 64;
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime settings shared by the generator, the store wrapper and the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankConfig {
    /// Issuer identification number every card starts with.
    pub iin: String,
    /// Upper bound on number draws before giving up with `ResourceExhausted`.
    pub max_generate_attempts: u32,
    /// Bound on each record store call. `None` waits indefinitely.
    pub store_timeout: Option<Duration>,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            iin: DEFAULT_IIN.to_string(),
            max_generate_attempts: DEFAULT_MAX_GENERATE_ATTEMPTS,
            store_timeout: Some(DEFAULT_STORE_TIMEOUT),
        }
    }
}

impl BankConfig {
    pub fn validate(&self) -> Result<()> {
        if self.iin.len() != IIN_LEN || !self.iin.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BankError::InvalidFormat(format!(
                "IIN must be exactly {IIN_LEN} digits, got {:?}",
                self.iin
            )));
        }
        if self.max_generate_attempts == 0 {
            return Err(BankError::InvalidFormat(
                "max generate attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
