use crate::domain::card::{Balance, CardNumber, CardRecord};
use crate::error::{BankError, Result};
use serde::Serialize;
use std::io::Write;

/// The exported columns. PIN hashes never leave the store.
#[derive(Debug, Serialize)]
struct CardRow<'a> {
    number: &'a CardNumber,
    balance: Balance,
}

/// Writes card records as CSV with a `number,balance` header.
pub struct CardWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CardWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_cards<'a, I>(&mut self, cards: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a CardRecord>,
    {
        for card in cards {
            self.writer.serialize(CardRow {
                number: &card.number,
                balance: card.balance,
            })?;
        }
        self.writer
            .flush()
            .map_err(|e| BankError::Internal(format!("csv: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_header_and_rows() {
        let mut record = CardRecord::new(
            CardNumber::parse("4000008449433403").unwrap(),
            "secret-hash".to_string(),
        );
        record.balance = Balance::new(70);

        let mut out = Vec::new();
        CardWriter::new(&mut out).write_cards([&record]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "number,balance\n4000008449433403,70\n");
        assert!(!text.contains("secret-hash"));
    }

    #[test]
    fn test_empty_export_has_no_rows() {
        let mut out = Vec::new();
        CardWriter::new(&mut out)
            .write_cards(Vec::<&CardRecord>::new())
            .unwrap();
        assert!(out.is_empty());
    }
}
