use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::form::{validate, FieldError, FormState};
use crate::account::{Account, AccountState};
use crate::wallet::{WalletError, WalletState};

/// Shown under the field when the node accepted the password.
///
/// This reuses the field's error slot, like the incorrect-password text.
pub const MSG_PASSWORD_CORRECT: &str = "The entered password is correct";
pub const MSG_PASSWORD_INCORRECT: &str = "The entered password is incorrect";

pub const PASSWORD_PLACEHOLDER: &str = "Password";
pub const PASSWORD_DESCRIPTION: &str = "Enter the account password";

/// Number of trailing address characters shown in the card heading.
const HEADING_TAIL_LEN: usize = 5;

#[derive(Debug, Error)]
pub enum UnlockError {
    #[error("no active account selected")]
    NoActiveAccount,

    #[error("form is invalid: {}", .0.first().map(|e| e.message.as_str()).unwrap_or("unknown"))]
    InvalidForm(Vec<FieldError>),

    #[error("an unlock is already in progress")]
    AlreadySubmitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitting,
}

/// What the last finished submission produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockOutcome {
    Unlocked,
    Rejected,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitIcon {
    Unlock,
    Loading,
}

/// A submission that has passed validation and is waiting on the wallet.
///
/// Owns everything the call needs so it can be moved onto a task while
/// the card keeps rendering.
pub struct PendingUnlock {
    wallet: Arc<dyn WalletState>,
    address: String,
    password: String,
}

impl PendingUnlock {
    pub async fn run(self) -> Result<bool, WalletError> {
        self.wallet.unlock_account(&self.address, &self.password).await
    }
}

/// Password card for unlocking the active account.
pub struct AccountUnlock {
    account: Account,
    wallet: Arc<dyn WalletState>,
    form: FormState,
    last_outcome: Option<UnlockOutcome>,
}

impl AccountUnlock {
    pub fn new(accounts: &dyn AccountState, wallet: Arc<dyn WalletState>) -> Result<Self, UnlockError> {
        let account = accounts.active_account().ok_or(UnlockError::NoActiveAccount)?;
        debug!(account = %account.name, "unlock card opened");

        Ok(Self {
            account,
            wallet,
            form: FormState::new(),
            last_outcome: None,
        })
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    pub fn last_outcome(&self) -> Option<&UnlockOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn phase(&self) -> Phase {
        if self.form.is_submitting() {
            Phase::Submitting
        } else {
            Phase::Idle
        }
    }

    /// Heading text: `Unlock 0x..` followed by the address tail.
    pub fn title(&self) -> String {
        format!("Unlock 0x..{}", address_tail(&self.account.account_address))
    }

    /// The full address, shown under the heading.
    pub fn description(&self) -> &str {
        &self.account.account_address
    }

    pub fn can_submit(&self) -> bool {
        !self.form.is_submitting() && self.form.is_valid()
    }

    pub fn input_enabled(&self) -> bool {
        !self.form.is_submitting()
    }

    pub fn submit_label(&self) -> &'static str {
        match self.phase() {
            Phase::Idle => "Unlock",
            Phase::Submitting => "Unlocking",
        }
    }

    pub fn submit_icon(&self) -> SubmitIcon {
        match self.phase() {
            Phase::Idle => SubmitIcon::Unlock,
            Phase::Submitting => SubmitIcon::Loading,
        }
    }

    /// Validate and enter the submitting state.
    ///
    /// The previous field message and outcome are cleared here, so a stale
    /// outcome is never shown next to an in-flight request.
    pub fn begin_submit(&mut self) -> Result<PendingUnlock, UnlockError> {
        if self.form.is_submitting() {
            return Err(UnlockError::AlreadySubmitting);
        }

        let validation = validate(self.form.password());
        if !validation.valid {
            return Err(UnlockError::InvalidForm(validation.errors));
        }

        self.form.clear_message();
        self.last_outcome = None;
        self.form.set_submitting(true);
        info!(account = %self.account.name, "submitting unlock");

        Ok(PendingUnlock {
            wallet: Arc::clone(&self.wallet),
            address: self.account.account_address.clone(),
            password: self.form.password().to_string(),
        })
    }

    /// Apply the wallet's answer and return to idle.
    pub fn finish_submit(&mut self, result: Result<bool, WalletError>) -> &UnlockOutcome {
        let outcome = match result {
            Ok(true) => {
                self.form.set_message(MSG_PASSWORD_CORRECT);
                UnlockOutcome::Unlocked
            }
            Ok(false) => {
                self.form.set_message(MSG_PASSWORD_INCORRECT);
                UnlockOutcome::Rejected
            }
            Err(e) => {
                warn!(account = %self.account.name, error = %e, "unlock call failed");
                let message = format!("Unable to unlock account: {}", e);
                self.form.set_message(message.clone());
                UnlockOutcome::Failed(message)
            }
        };

        self.form.set_submitting(false);
        info!(account = %self.account.name, outcome = ?outcome, "unlock finished");

        self.last_outcome.insert(outcome)
    }

    /// Run one full submission cycle.
    pub async fn submit(&mut self) -> Result<&UnlockOutcome, UnlockError> {
        let pending = self.begin_submit()?;
        let result = pending.run().await;
        Ok(self.finish_submit(result))
    }
}

/// Last `HEADING_TAIL_LEN` characters, or the whole string if shorter.
fn address_tail(address: &str) -> &str {
    let count = address.chars().count();
    match address.char_indices().nth(count.saturating_sub(HEADING_TAIL_LEN)) {
        Some((idx, _)) => &address[idx..],
        None => address,
    }
}
