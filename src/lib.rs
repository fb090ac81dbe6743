use crate::protocol::InputError;

pub mod ao;
pub mod controller;
pub mod display;
#[cfg(test)]
mod http_stub;
pub mod protocol;
pub mod session;
pub mod test_helpers;
pub mod view;
pub mod wallets;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("wallet is not available")]
    WalletUnavailable,
    #[error("wallet permission request was rejected: {0}")]
    CapabilityDenied(String),
    #[error("data item signer is not available")]
    SignerUnavailable,
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("{tag} not found in messages")]
    MissingResponse { tag: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("{message}")]
    Rejected { message: String },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with {status}: {body}")]
    Remote {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },
}
