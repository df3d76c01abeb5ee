use cardbank::application::auth::{Authenticator, PinHasher};
use cardbank::application::bank::Bank;
use cardbank::application::generator::NumberGenerator;
use cardbank::domain::ports::SharedCardStore;
use cardbank::infrastructure::in_memory::InMemoryCardStore;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

/// A controller over a fresh in-memory store with cheap PIN hashing.
#[allow(dead_code)]
pub fn bank_with_store(seed: u64) -> (Bank, InMemoryCardStore) {
    let store = InMemoryCardStore::new();
    let shared: SharedCardStore = Arc::new(store.clone());
    let generator =
        NumberGenerator::with_rng(shared.clone(), "400000", 32, StdRng::seed_from_u64(seed));
    let hasher = PinHasher::with_params(8, 1).expect("valid argon2 params");
    let authenticator = Authenticator::new(shared.clone(), hasher).expect("authenticator");
    (Bank::with_parts(shared, generator, authenticator), store)
}

/// Extracts the card number and PIN printed after "Your card has been created".
#[allow(dead_code)]
pub fn issued_card(stdout: &str) -> (String, String) {
    let lines: Vec<&str> = stdout.lines().collect();
    let number_at = lines
        .iter()
        .position(|l| *l == "Your card number:")
        .expect("card number printed");
    let pin_at = lines
        .iter()
        .position(|l| *l == "Your card PIN:")
        .expect("PIN printed");
    (
        lines[number_at + 1].to_string(),
        lines[pin_at + 1].to_string(),
    )
}
