use super::checksum;
use crate::error::{BankError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of digits in the issuer identification prefix.
pub const IIN_LEN: usize = 6;
/// Number of randomly drawn digits after the prefix.
pub const BODY_LEN: usize = 9;
/// Full card number length, check digit included.
pub const CARD_LEN: usize = IIN_LEN + BODY_LEN + 1;

/// A 16-digit card number whose last digit is a valid Luhn check digit.
///
/// The only ways to obtain one are [`CardNumber::parse`] and the number
/// generator, so every value in circulation passes the checksum.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardNumber(String);

impl CardNumber {
    /// Parses user or storage input.
    ///
    /// Fails with `InvalidFormat` on a wrong length or a non-digit character
    /// and with `InvalidCardNumber` when the check digit does not match.
    pub fn parse(input: &str) -> Result<Self> {
        if checksum::is_valid(input)? {
            Ok(Self(input.to_string()))
        } else {
            Err(BankError::InvalidCardNumber)
        }
    }

    /// Appends the check digit to a full-length payload.
    pub(crate) fn from_payload(payload: String) -> Result<Self> {
        let digit = checksum::check_digit(&payload)?;
        Ok(Self(format!("{payload}{digit}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CardNumber {
    type Error = BankError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<CardNumber> for String {
    fn from(number: CardNumber) -> Self {
        number.0
    }
}

/// A balance in the smallest currency unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(pub i64);

impl Balance {
    pub const ZERO: Self = Self(0);

    pub fn new(units: i64) -> Self {
        Self(units)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Applies a signed change.
    ///
    /// A negative change may not take the balance below zero. Overflow is
    /// reported as `InvalidAmount`.
    pub fn apply(self, change: i64) -> Result<Self> {
        let next = self.0.checked_add(change).ok_or(BankError::InvalidAmount)?;
        if change < 0 && next < 0 {
            return Err(BankError::InsufficientFunds);
        }
        Ok(Self(next))
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A strictly positive amount for credits and transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(i64);

impl Amount {
    pub fn new(units: i64) -> Result<Self> {
        if units > 0 {
            Ok(Self(units))
        } else {
            Err(BankError::InvalidAmount)
        }
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Amount {
    type Error = BankError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

/// The persisted card record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    pub number: CardNumber,
    /// Salted PHC hash of the 4-digit PIN.
    pub pin_hash: String,
    #[serde(default)]
    pub balance: Balance,
}

impl CardRecord {
    pub fn new(number: CardNumber, pin_hash: String) -> Self {
        Self {
            number,
            pin_hash,
            balance: Balance::ZERO,
        }
    }
}

/// One signed row change inside an all-or-nothing balance update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceDelta {
    pub number: CardNumber,
    pub change: i64,
}

impl BalanceDelta {
    pub fn credit(number: CardNumber, amount: Amount) -> Self {
        Self {
            number,
            change: amount.value(),
        }
    }

    pub fn debit(number: CardNumber, amount: Amount) -> Self {
        Self {
            number,
            change: -amount.value(),
        }
    }
}
