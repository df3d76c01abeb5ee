use super::auth::{Authenticator, PinHasher, Session};
use super::generator::NumberGenerator;
use crate::config::BankConfig;
use crate::domain::card::{Amount, Balance, BalanceDelta, CardNumber, CardRecord};
use crate::domain::ports::SharedCardStore;
use crate::error::{BankError, Result};
use tracing::{info, warn};

/// Credentials handed out once, when a card is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCard {
    pub number: CardNumber,
    pub pin: String,
}

/// The session and ledger controller.
///
/// Holds at most one [`Session`]. It never caches a record: every balance
/// read goes back to the store. Operations that change the session or the
/// books take `&mut self`, so two of them can never interleave on the same
/// controller.
pub struct Bank {
    store: SharedCardStore,
    generator: NumberGenerator,
    authenticator: Authenticator,
    session: Option<Session>,
}

impl Bank {
    /// Builds a controller over `store` from validated settings.
    pub fn new(store: SharedCardStore, config: &BankConfig, hasher: PinHasher) -> Result<Self> {
        config.validate()?;
        let generator = NumberGenerator::new(
            store.clone(),
            config.iin.clone(),
            config.max_generate_attempts,
        );
        let authenticator = Authenticator::new(store.clone(), hasher)?;
        Ok(Self::with_parts(store, generator, authenticator))
    }

    pub fn with_parts(
        store: SharedCardStore,
        generator: NumberGenerator,
        authenticator: Authenticator,
    ) -> Self {
        Self {
            store,
            generator,
            authenticator,
            session: None,
        }
    }

    /// The card of the current session, if any.
    pub fn active_card(&self) -> Option<&CardNumber> {
        self.session.as_ref().map(Session::card)
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    fn require_session(&self) -> Result<&CardNumber> {
        self.active_card().ok_or(BankError::NotLoggedIn)
    }

    /// Issues a new card with a zero balance. The session is unchanged.
    pub async fn create_account(&mut self) -> Result<IssuedCard> {
        if self.is_logged_in() {
            return Err(BankError::AlreadyLoggedIn);
        }
        let max_attempts = self.generator.max_attempts();
        for _ in 0..max_attempts {
            let number = self.generator.generate().await?;
            let pin = self.generator.draw_pin()?;
            let pin_hash = self.authenticator.hasher().hash(&pin).await?;
            match self
                .store
                .insert(CardRecord::new(number.clone(), pin_hash))
                .await
            {
                Ok(()) => {
                    info!(%number, "card created");
                    return Ok(IssuedCard { number, pin });
                }
                // Someone else stored the same number between the existence
                // check and the insert.
                Err(BankError::UniquenessViolation) => {
                    warn!(%number, "card number taken at insert, drawing again");
                }
                Err(e) => return Err(e),
            }
        }
        Err(BankError::ResourceExhausted(max_attempts))
    }

    pub async fn login(&mut self, number: &str, pin: &str) -> Result<()> {
        if self.is_logged_in() {
            return Err(BankError::AlreadyLoggedIn);
        }
        let session = self.authenticator.authenticate(number, pin).await?;
        info!(number = %session.card(), "logged in");
        self.session = Some(session);
        Ok(())
    }

    /// Ends the session, if there is one.
    pub fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            info!(number = %session.card(), "logged out");
        }
    }

    pub async fn balance(&self) -> Result<Balance> {
        let card = self.require_session()?;
        let record = self.store.find(card).await?.ok_or(BankError::NotFound)?;
        Ok(record.balance)
    }

    pub async fn credit(&mut self, amount: i64) -> Result<()> {
        let card = self.require_session()?.clone();
        let amount = Amount::new(amount)?;
        self.store
            .apply_balance_deltas(&[BalanceDelta::credit(card.clone(), amount)])
            .await?;
        info!(number = %card, amount = amount.value(), "income added");
        Ok(())
    }

    /// Checks the destination of a transfer without touching any balance.
    ///
    /// Rejects, in this order: the active card itself, a number failing the
    /// checksum, and a number with no record.
    pub async fn check_transfer_target(&self, to: &str) -> Result<CardNumber> {
        let from = self.require_session()?;
        if to == from.as_str() {
            return Err(BankError::SelfTransfer);
        }
        let to = CardNumber::parse(to).map_err(|_| BankError::InvalidCardNumber)?;
        if !self.store.exists(&to).await? {
            return Err(BankError::NotFound);
        }
        Ok(to)
    }

    /// Moves `amount` from the active card to `to`.
    ///
    /// All checks run before the single all-or-nothing store update, so a
    /// rejected transfer leaves both balances untouched.
    pub async fn transfer(&mut self, to: &str, amount: i64) -> Result<()> {
        let to = self.check_transfer_target(to).await?;
        let from = self.require_session()?.clone();
        let amount = Amount::new(amount)?;

        let current = self
            .store
            .find(&from)
            .await?
            .ok_or(BankError::NotFound)?
            .balance;
        if current.value() < amount.value() {
            return Err(BankError::InsufficientFunds);
        }

        self.store
            .apply_balance_deltas(&[
                BalanceDelta::debit(from.clone(), amount),
                BalanceDelta::credit(to.clone(), amount),
            ])
            .await?;
        info!(from = %from, to = %to, amount = amount.value(), "transfer applied");
        Ok(())
    }

    /// Deletes the active card and ends the session.
    pub async fn close_account(&mut self) -> Result<()> {
        let card = self.require_session()?.clone();
        let result = self.store.delete(&card).await;
        if matches!(result, Ok(()) | Err(BankError::NotFound)) {
            self.session = None;
            info!(number = %card, "card closed");
        }
        result
    }
}
