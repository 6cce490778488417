pub mod store;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of hex digits that follow the address prefix.
const ADDRESS_HEX_LEN: usize = 40;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,
    #[error("address must start with `0x` or `Z`: {0}")]
    MissingPrefix(String),
    #[error("address must have {expected} hex digits after the prefix, found {found}")]
    BadLength { expected: usize, found: usize },
    #[error("address contains non-hex characters: {0}")]
    NotHex(String),
}

/// Account address in its textual form, e.g. `Z20d2...` or `0x20d2...`.
///
/// Parsing keeps the prefix the user typed so the address is shown back
/// exactly as it was entered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }

        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("Z"))
            .ok_or_else(|| AddressError::MissingPrefix(s.to_string()))?;

        if digits.len() != ADDRESS_HEX_LEN {
            return Err(AddressError::BadLength {
                expected: ADDRESS_HEX_LEN,
                found: digits.len(),
            });
        }

        hex::decode(digits).map_err(|_| AddressError::NotHex(s.to_string()))?;

        Ok(Address(s.to_string()))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The account the unlock card operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    pub account_address: String,
}

impl Account {
    pub fn new(name: impl Into<String>, account_address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            account_address: account_address.into(),
        }
    }
}

/// Read access to whichever account is currently selected.
pub trait AccountState: Send + Sync {
    fn active_account(&self) -> Option<Account>;
}

/// Account-state that always answers with one fixed account.
///
/// Used when the address is given on the command line instead of coming
/// from the saved store.
#[derive(Debug, Clone)]
pub struct FixedAccount(pub Account);

impl AccountState for FixedAccount {
    fn active_account(&self) -> Option<Account> {
        Some(self.0.clone())
    }
}
