/// Errors returned by a [`WalletSigner`](crate::signers::WalletSigner).
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// The user declined the request.
    #[error("request cancelled by the user")]
    UserCancelled,
    /// No wallet session is active.
    #[error("wallet is not connected")]
    NotConnected,
    /// The wallet exposes no accounts.
    #[error("wallet has no accounts")]
    NoAccounts,
    /// The requested account is not managed by the wallet.
    #[error("account {0} is not managed by the wallet")]
    UnknownAccount(String),
    /// The wallet refused the request.
    #[error("wallet rejected the request: {0}")]
    Rejected(String),
    /// The wallet could not be reached.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    /// The wallet answered with an unexpected shape.
    #[error("unexpected wallet response: {0}")]
    Protocol(String),
}
