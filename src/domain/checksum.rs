//! Modulus-10 (Luhn) check digits.
//!
//! Digits at even zero-based positions, counted from the left, are doubled.
//! For the 15-digit payload of a 16-digit card number this is the standard
//! Luhn weighting.

use super::card::CARD_LEN;
use crate::error::{BankError, Result};

fn digits(input: &str) -> Result<Vec<u8>> {
    input
        .bytes()
        .map(|b| {
            if b.is_ascii_digit() {
                Ok(b - b'0')
            } else {
                Err(BankError::InvalidFormat(format!(
                    "non-digit character in {input:?}"
                )))
            }
        })
        .collect()
}

fn weighted_sum(payload: &[u8]) -> u32 {
    payload
        .iter()
        .enumerate()
        .map(|(i, &d)| {
            let d = u32::from(d);
            if i % 2 == 0 {
                let doubled = d * 2;
                if doubled >= 10 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum()
}

fn expect_len(input: &str, len: usize) -> Result<()> {
    if input.len() == len {
        Ok(())
    } else {
        Err(BankError::InvalidFormat(format!(
            "expected {len} digits, got {}",
            input.len()
        )))
    }
}

/// Computes the digit that completes a 15-digit `payload` into a valid
/// card number.
pub fn check_digit(payload: &str) -> Result<u8> {
    expect_len(payload, CARD_LEN - 1)?;
    let payload = digits(payload)?;
    Ok(((10 - weighted_sum(&payload) % 10) % 10) as u8)
}

/// Returns whether the last digit of a 16-digit `number` is the check digit
/// of the rest.
pub fn is_valid(number: &str) -> Result<bool> {
    expect_len(number, CARD_LEN)?;
    let all = digits(number)?;
    let (payload, last) = all.split_at(all.len() - 1);
    Ok(((10 - weighted_sum(payload) % 10) % 10) as u8 == last[0])
}
