//! Domain types and the storage port.
//!
//! Nothing here performs I/O; the checksum engine and the card value types
//! are pure, and [`ports::CardStore`] is the seam the adapters implement.

pub mod card;
pub mod checksum;
pub mod ports;
