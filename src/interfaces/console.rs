use crate::application::bank::Bank;
use crate::error::BankError;
use std::io::{self, BufRead, Write};
use tracing::error;

const MAIN_MENU: &str = "1. Create an account\n2. Log into account\n0. Exit\n";
const ACCOUNT_MENU: &str = "1. Balance\n2. Add income\n3. Do transfer\n4. Close account\n5. Log out\n0. Exit\n";

enum Flow {
    Continue,
    Exit,
}

/// The line-oriented prompt surface.
///
/// Reads one answer per line from `input` and writes prompts to `output`.
/// Every [`BankError`] is turned into a message and the loop returns to the
/// menu it came from; only I/O errors on the console itself end the loop.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Runs menus until the user exits or the input ends.
    pub async fn run(&mut self, bank: &mut Bank) -> io::Result<()> {
        loop {
            let flow = if bank.is_logged_in() {
                self.account_menu(bank).await?
            } else {
                self.main_menu(bank).await?
            };
            if let Flow::Exit = flow {
                writeln!(self.output, "Bye!")?;
                self.output.flush()?;
                return Ok(());
            }
        }
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        writeln!(self.output, "{text}")?;
        self.read_line()
    }

    fn choose(&mut self, menu: &str) -> io::Result<Option<String>> {
        write!(self.output, "{menu}")?;
        let choice = self.read_line()?;
        writeln!(self.output)?;
        Ok(choice)
    }

    async fn main_menu(&mut self, bank: &mut Bank) -> io::Result<Flow> {
        let Some(choice) = self.choose(MAIN_MENU)? else {
            return Ok(Flow::Exit);
        };
        match choice.as_str() {
            "1" => self.create_account(bank).await,
            "2" => self.login(bank).await,
            "0" => Ok(Flow::Exit),
            _ => Ok(Flow::Continue),
        }
    }

    async fn account_menu(&mut self, bank: &mut Bank) -> io::Result<Flow> {
        let Some(choice) = self.choose(ACCOUNT_MENU)? else {
            return Ok(Flow::Exit);
        };
        match choice.as_str() {
            "1" => self.balance(bank).await,
            "2" => self.add_income(bank).await,
            "3" => self.transfer(bank).await,
            "4" => self.close_account(bank).await,
            "5" => {
                bank.logout();
                writeln!(self.output, "Logged out!\n")?;
                Ok(Flow::Continue)
            }
            "0" => Ok(Flow::Exit),
            _ => Ok(Flow::Continue),
        }
    }

    async fn create_account(&mut self, bank: &mut Bank) -> io::Result<Flow> {
        match bank.create_account().await {
            Ok(card) => {
                writeln!(self.output, "Your card has been created")?;
                writeln!(self.output, "Your card number:\n{}", card.number)?;
                writeln!(self.output, "Your card PIN:\n{}\n", card.pin)?;
            }
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    async fn login(&mut self, bank: &mut Bank) -> io::Result<Flow> {
        let Some(number) = self.prompt("Enter your card number:")? else {
            return Ok(Flow::Exit);
        };
        let Some(pin) = self.prompt("Enter your PIN:")? else {
            return Ok(Flow::Exit);
        };
        match bank.login(&number, &pin).await {
            Ok(()) => writeln!(self.output, "\nYou have successfully logged in!\n")?,
            Err(e) => {
                self.report(&e)?;
                writeln!(self.output)?;
            }
        }
        Ok(Flow::Continue)
    }

    async fn balance(&mut self, bank: &mut Bank) -> io::Result<Flow> {
        match bank.balance().await {
            Ok(balance) => writeln!(self.output, "Balance: {balance}\n")?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    /// Reads an integer amount; `Ok(None)` means the input ended.
    fn read_amount(&mut self, text: &str) -> io::Result<Option<Option<i64>>> {
        let Some(raw) = self.prompt(text)? else {
            return Ok(None);
        };
        match raw.parse::<i64>() {
            Ok(amount) => Ok(Some(Some(amount))),
            Err(_) => {
                writeln!(self.output, "Must be a number")?;
                Ok(Some(None))
            }
        }
    }

    async fn add_income(&mut self, bank: &mut Bank) -> io::Result<Flow> {
        let amount = match self.read_amount("Enter income:")? {
            None => return Ok(Flow::Exit),
            Some(None) => return Ok(Flow::Continue),
            Some(Some(amount)) => amount,
        };
        match bank.credit(amount).await {
            Ok(()) => writeln!(self.output, "Income was added!\n")?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    async fn transfer(&mut self, bank: &mut Bank) -> io::Result<Flow> {
        writeln!(self.output, "Transfer")?;
        let Some(to) = self.prompt("Enter card number:")? else {
            return Ok(Flow::Exit);
        };
        if let Err(e) = bank.check_transfer_target(&to).await {
            self.report(&e)?;
            return Ok(Flow::Continue);
        }
        let amount = match self.read_amount("Enter how much money you want to transfer:")? {
            None => return Ok(Flow::Exit),
            Some(None) => return Ok(Flow::Continue),
            Some(Some(amount)) => amount,
        };
        match bank.transfer(&to, amount).await {
            Ok(()) => writeln!(self.output, "Success!\n")?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    async fn close_account(&mut self, bank: &mut Bank) -> io::Result<Flow> {
        match bank.close_account().await {
            Ok(()) => writeln!(self.output, "The account has been closed!\n")?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn report(&mut self, err: &BankError) -> io::Result<()> {
        match err {
            BankError::StoreUnavailable(_) | BankError::Internal(_) => {
                error!(error = %err, "operation failed");
            }
            _ => {}
        }
        writeln!(self.output, "{}", user_message(err))
    }
}

/// The line shown to the user for each error.
pub fn user_message(err: &BankError) -> String {
    match err {
        BankError::AuthenticationFailed => "Wrong card number or PIN!".to_string(),
        BankError::SelfTransfer => "You can't transfer money to the same account!".to_string(),
        BankError::InvalidCardNumber | BankError::InvalidFormat(_) => {
            "Probably you made a mistake in the card number. Please try again!".to_string()
        }
        BankError::NotFound => "Such a card does not exist.".to_string(),
        BankError::InvalidAmount => "Must be positive".to_string(),
        BankError::InsufficientFunds => "Not enough money!".to_string(),
        BankError::NotLoggedIn => "You are not logged in.".to_string(),
        BankError::AlreadyLoggedIn => "Log out first.".to_string(),
        BankError::UniquenessViolation | BankError::ResourceExhausted(_) => {
            "Could not issue a card number. Please try again later.".to_string()
        }
        BankError::StoreUnavailable(_) | BankError::Internal(_) => {
            format!("Something went wrong: {err}")
        }
    }
}
