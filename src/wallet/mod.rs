pub mod rpc;

use async_trait::async_trait;
use thiserror::Error;

pub use rpc::RpcWallet;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("node request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("node returned error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("unexpected node response: {0}")]
    InvalidResponse(String),

    #[error("unlock task stopped before the node answered")]
    Interrupted,
}

/// Operations the unlock card needs from the wallet backend.
#[async_trait]
pub trait WalletState: Send + Sync {
    /// Try to unlock `address` with `password`.
    ///
    /// `Ok(false)` means the node answered and refused the password; an
    /// `Err` means no answer could be obtained.
    async fn unlock_account(&self, address: &str, password: &str) -> Result<bool, WalletError>;
}
