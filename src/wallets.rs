//! Wallet access.
//!
//! The wallet holds the keys; this client never does. [`Wallet`] mirrors the
//! browser extension API (connect with permissions, active address, disconnect,
//! data-item signer) and [`BridgeWallet`] reaches a wallet bridge that exposes
//! that API over local HTTP.

use crate::{
    Error,
    Result,
    ao::success_body,
    protocol::Tag,
};
use reqwest::StatusCode;
use serde::{
    Deserialize,
    Serialize,
};
use std::time::Duration;

pub const DEFAULT_BRIDGE_URL: &str = "http://localhost:4100";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Permission {
    #[serde(rename = "ACCESS_ADDRESS")]
    AccessAddress,
    #[serde(rename = "SIGNATURE")]
    Signature,
    #[serde(rename = "SIGN_TRANSACTION")]
    SignTransaction,
}

pub const REQUIRED_PERMISSIONS: [Permission; 3] = [
    Permission::AccessAddress,
    Permission::Signature,
    Permission::SignTransaction,
];

/// Unsigned message envelope handed to the wallet for signing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DataItem {
    pub target: String,
    pub anchor: String,
    pub tags: Vec<Tag>,
    pub data: String,
}

pub trait DataItemSigner {
    /// Returns the signed data item, ready to post as raw bytes.
    fn sign(&self, item: &DataItem) -> impl Future<Output = Result<Vec<u8>>>;
}

pub trait Wallet {
    type Signer: DataItemSigner;

    fn is_available(&self) -> impl Future<Output = bool>;

    fn connect(&mut self, permissions: &[Permission]) -> impl Future<Output = Result<()>>;

    fn active_address(&self) -> impl Future<Output = Result<String>>;

    fn disconnect(&mut self) -> impl Future<Output = Result<()>>;

    fn signer(&self) -> Result<Self::Signer>;
}

#[derive(Clone, Debug)]
pub struct BridgeWallet {
    base_url: String,
    http: reqwest::Client,
    connected: bool,
}

#[derive(Clone, Debug)]
pub struct BridgeSigner {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct ConnectRequestDto<'a> {
    permissions: &'a [Permission],
}

#[derive(Deserialize)]
struct ActiveAddressDto {
    address: String,
}

impl BridgeWallet {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::HttpClient)?;
        Ok(Self {
            base_url,
            http,
            connected: false,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

impl Wallet for BridgeWallet {
    type Signer = BridgeSigner;

    async fn is_available(&self) -> bool {
        match self.http.get(self.url("")).send().await {
            Ok(res) => res.status().is_success(),
            Err(err) => {
                tracing::debug!(error = %err, url = %self.base_url, "wallet bridge unreachable");
                false
            }
        }
    }

    async fn connect(&mut self, permissions: &[Permission]) -> Result<()> {
        let url = self.url("connect");
        let res = self
            .http
            .post(&url)
            .json(&ConnectRequestDto { permissions })
            .send()
            .await
            .map_err(|source| Error::Http {
                url: url.clone(),
                source,
            })?;
        if matches!(res.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            let body = res.text().await.unwrap_or_default();
            let reason = if body.trim().is_empty() {
                String::from("permission request rejected by user")
            } else {
                body
            };
            return Err(Error::CapabilityDenied(reason));
        }
        success_body(res, &url).await?;
        self.connected = true;
        Ok(())
    }

    async fn active_address(&self) -> Result<String> {
        let url = self.url("active-address");
        let res = self.http.get(&url).send().await.map_err(|source| Error::Http {
            url: url.clone(),
            source,
        })?;
        let bytes = success_body(res, &url).await?;
        let dto: ActiveAddressDto = serde_json::from_slice(&bytes)
            .map_err(|e| Error::MalformedResponse(format!("active address: {e}")))?;
        Ok(dto.address)
    }

    async fn disconnect(&mut self) -> Result<()> {
        let url = self.url("disconnect");
        let res = self.http.post(&url).send().await.map_err(|source| Error::Http {
            url: url.clone(),
            source,
        })?;
        success_body(res, &url).await?;
        self.connected = false;
        Ok(())
    }

    fn signer(&self) -> Result<BridgeSigner> {
        if !self.connected {
            return Err(Error::SignerUnavailable);
        }
        Ok(BridgeSigner {
            base_url: self.base_url.clone(),
            http: self.http.clone(),
        })
    }
}

impl DataItemSigner for BridgeSigner {
    async fn sign(&self, item: &DataItem) -> Result<Vec<u8>> {
        let url = format!("{}/sign-data-item", self.base_url);
        let res = self
            .http
            .post(&url)
            .json(item)
            .send()
            .await
            .map_err(|source| Error::Http {
                url: url.clone(),
                source,
            })?;
        let signed = success_body(res, &url).await?;
        if signed.is_empty() {
            return Err(Error::MalformedResponse(String::from(
                "wallet returned an empty signed data item",
            )));
        }
        Ok(signed)
    }
}
