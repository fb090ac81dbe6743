//! Messaging client for the arena process.
//!
//! Dry runs go to a compute unit, which evaluates the message against the
//! process without committing anything. Commits are signed by the wallet and
//! posted to a messenger unit.

use crate::{
    Error,
    Result,
    protocol::{
        Action,
        DryRunResult,
        MessageId,
        Tag,
    },
    wallets::{
        DataItem,
        DataItemSigner,
    },
};
use rand::{
    Rng,
    distr::Alphanumeric,
};
use reqwest::header::CONTENT_TYPE;
use serde::{
    Deserialize,
    Serialize,
};
use std::time::Duration;

pub const DEFAULT_PROCESS_ID: &str = "OUjbV7GD2mNHTFxx1iAm7E8nqLpvChMDCEHo_-zglVI";
pub const DEFAULT_TESTNET_CU_URL: &str = "https://cu.ao-testnet.xyz";
pub const DEFAULT_TESTNET_MU_URL: &str = "https://mu.ao-testnet.xyz";
pub const DEFAULT_LOCAL_CU_URL: &str = "http://localhost:6363";
pub const DEFAULT_LOCAL_MU_URL: &str = "http://localhost:3004";
const DRY_RUN_PLACEHOLDER: &str = "1234";
const ANCHOR_LEN: usize = 32;
const SDK_NAME: &str = "chronoclash";

pub trait ProcessMessenger {
    /// Evaluates `action` without committing it.
    fn dryrun(&self, action: &Action) -> impl Future<Output = Result<DryRunResult>>;

    /// Signs `action` with `signer` and sends it for real.
    fn message<S: DataItemSigner>(
        &self,
        action: &Action,
        signer: &S,
    ) -> impl Future<Output = Result<MessageId>>;
}

#[derive(Clone, Debug)]
pub struct AoClient {
    process_id: String,
    cu_url: String,
    mu_url: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DryRunRequestDto<'a> {
    id: &'a str,
    target: &'a str,
    owner: &'a str,
    anchor: &'a str,
    data: &'a str,
    tags: Vec<Tag>,
}

#[derive(Deserialize)]
struct MessageReceiptDto {
    id: String,
}

impl AoClient {
    pub fn new(
        process_id: impl Into<String>,
        cu_url: impl Into<String>,
        mu_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::HttpClient)?;
        Ok(Self {
            process_id: process_id.into(),
            cu_url: cu_url.into().trim_end_matches('/').to_string(),
            mu_url: mu_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    fn dry_run_url(&self) -> String {
        format!("{}/dry-run?process-id={}", self.cu_url, self.process_id)
    }

    fn dry_run_body<'a>(&'a self, action: &'a Action) -> DryRunRequestDto<'a> {
        DryRunRequestDto {
            id: DRY_RUN_PLACEHOLDER,
            target: &self.process_id,
            owner: action.address().unwrap_or(DRY_RUN_PLACEHOLDER),
            anchor: "0",
            data: DRY_RUN_PLACEHOLDER,
            tags: message_tags(action),
        }
    }

    fn data_item(&self, action: &Action) -> DataItem {
        DataItem {
            target: self.process_id.clone(),
            anchor: random_anchor(),
            tags: message_tags(action),
            data: String::new(),
        }
    }
}

impl ProcessMessenger for AoClient {
    async fn dryrun(&self, action: &Action) -> Result<DryRunResult> {
        let url = self.dry_run_url();
        tracing::debug!(action = action.name(), tags = ?action.tags(), "dry run request");
        let res = self
            .http
            .post(&url)
            .json(&self.dry_run_body(action))
            .send()
            .await
            .map_err(|source| Error::Http {
                url: url.clone(),
                source,
            })?;
        let bytes = success_body(res, &url).await?;
        tracing::debug!(
            action = action.name(),
            response = %String::from_utf8_lossy(&bytes),
            "dry run response"
        );
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::MalformedResponse(format!("dry run result: {e}")))
    }

    async fn message<S: DataItemSigner>(
        &self,
        action: &Action,
        signer: &S,
    ) -> Result<MessageId> {
        let item = self.data_item(action);
        let signed = signer.sign(&item).await?;
        let url = format!("{}/", self.mu_url);
        tracing::debug!(action = action.name(), bytes = signed.len(), "posting message");
        let res = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(signed)
            .send()
            .await
            .map_err(|source| Error::Http {
                url: url.clone(),
                source,
            })?;
        let bytes = success_body(res, &url).await?;
        let receipt: MessageReceiptDto = serde_json::from_slice(&bytes)
            .map_err(|e| Error::MalformedResponse(format!("message receipt: {e}")))?;
        tracing::debug!(action = action.name(), id = %receipt.id, "message accepted");
        Ok(MessageId(receipt.id))
    }
}

/// Action tags followed by the protocol tags every ao message carries.
fn message_tags(action: &Action) -> Vec<Tag> {
    let mut tags = action.tags();
    tags.extend([
        Tag::new("Data-Protocol", "ao"),
        Tag::new("Variant", "ao.TN.1"),
        Tag::new("Type", "Message"),
        Tag::new("SDK", SDK_NAME),
    ]);
    tags
}

fn random_anchor() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ANCHOR_LEN)
        .map(char::from)
        .collect()
}

/// Reads the body, turning any non-2xx status into [`Error::Remote`].
pub(crate) async fn success_body(res: reqwest::Response, url: &str) -> Result<Vec<u8>> {
    let status = res.status();
    let bytes = res.bytes().await.map_err(|source| Error::Http {
        url: url.to_owned(),
        source,
    })?;
    if !status.is_success() {
        return Err(Error::Remote {
            url: url.to_owned(),
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::{
        http_stub::StubServer,
        test_helpers::FakeSigner,
    };
    use reqwest::StatusCode;
    use serde_json::json;

    fn client() -> AoClient {
        AoClient::new(
            "proc-1",
            "https://cu.example/",
            "https://mu.example/",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn dry_run_url__targets_process_on_compute_unit() {
        assert_eq!(
            client().dry_run_url(),
            "https://cu.example/dry-run?process-id=proc-1"
        );
    }

    #[test]
    fn dry_run_body__uses_address_as_owner_and_appends_protocol_tags() {
        // given
        let client = client();
        let action = Action::JoinGame {
            address: "addr-1".to_string(),
        };

        // when
        let body = serde_json::to_value(client.dry_run_body(&action)).unwrap();

        // then
        assert_eq!(body["Target"], json!("proc-1"));
        assert_eq!(body["Owner"], json!("addr-1"));
        assert_eq!(body["Id"], json!("1234"));
        assert_eq!(body["Tags"][0], json!({ "name": "Action", "value": "JoinGame" }));
        assert_eq!(body["Tags"][2], json!({ "name": "filetype", "value": "json" }));
        assert_eq!(
            body["Tags"][3],
            json!({ "name": "Data-Protocol", "value": "ao" })
        );
    }

    #[test]
    fn dry_run_body__without_address__uses_placeholder_owner() {
        let client = client();
        let body = serde_json::to_value(client.dry_run_body(&Action::GetLeaderboard)).unwrap();
        assert_eq!(body["Owner"], json!("1234"));
    }

    #[test]
    fn data_item__targets_process_with_fresh_anchor() {
        // given
        let client = client();
        let action = Action::CreateRoom {
            address: "addr-1".to_string(),
            wager: 10,
        };

        // when
        let first = client.data_item(&action);
        let second = client.data_item(&action);

        // then
        assert_eq!(first.target, "proc-1");
        assert_eq!(first.anchor.len(), ANCHOR_LEN);
        assert_ne!(first.anchor, second.anchor);
        assert!(first.tags.contains(&Tag::new("WagerAmount", "10")));
        assert!(first.tags.contains(&Tag::new("Type", "Message")));
    }

    fn client_for(server: &StubServer) -> AoClient {
        AoClient::new("proc-1", &server.url, &server.url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn dryrun__decodes_compute_unit_messages() {
        // given
        let reply = json!({
            "Messages": [{
                "Data": "{\"status\":\"success\"}",
                "Tags": [{ "name": "Action", "value": "CoordinateRoomResponse" }]
            }],
            "Output": { "data": "" }
        });
        let server = StubServer::respond(200, &reply.to_string()).await;
        let client = client_for(&server);

        // when
        let result = client.dryrun(&Action::GetLeaderboard).await.unwrap();

        // then
        assert_eq!(result.first_data(), r#"{"status":"success"}"#);
        assert!(result.tagged("CoordinateRoomResponse").is_some());
        let request = server.request().await;
        assert!(request.starts_with("POST /dry-run?process-id=proc-1 HTTP/1.1"));
        assert!(request.contains(r#""Target":"proc-1""#));
    }

    #[tokio::test]
    async fn dryrun__server_error__carries_status_and_body() {
        let server = StubServer::respond(500, "process crashed").await;
        let client = client_for(&server);

        let err = client.dryrun(&Action::GetLeaderboard).await.unwrap_err();

        let Error::Remote { url, status, body } = &err else {
            panic!("expected a remote error, got {err:?}");
        };
        assert_eq!(*status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "process crashed");
        assert!(url.ends_with("/dry-run?process-id=proc-1"));
    }

    #[tokio::test]
    async fn dryrun__not_json__is_malformed() {
        let server = StubServer::respond(200, "<html>").await;
        let client = client_for(&server);

        let err = client.dryrun(&Action::GetLeaderboard).await.unwrap_err();

        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn message__posts_signed_item_and_returns_receipt_id() {
        // given
        let server = StubServer::respond(200, r#"{"id":"msg-42"}"#).await;
        let client = client_for(&server);
        let action = Action::JoinGame {
            address: "addr-1".to_string(),
        };

        // when
        let id = client.message(&action, &FakeSigner).await.unwrap();

        // then
        assert_eq!(id, MessageId("msg-42".to_string()));
        let request = server.request().await;
        assert!(request.starts_with("POST / HTTP/1.1"));
        assert!(request.to_lowercase().contains("content-type: application/octet-stream"));
        assert!(request.contains(r#""target":"proc-1""#));
    }

    #[tokio::test]
    async fn message__rejected_by_messenger_unit__is_remote_error() {
        let server = StubServer::respond(400, "bad data item").await;
        let client = client_for(&server);
        let action = Action::JoinGame {
            address: "addr-1".to_string(),
        };

        let err = client.message(&action, &FakeSigner).await.unwrap_err();

        let Error::Remote { status, body, .. } = &err else {
            panic!("expected a remote error, got {err:?}");
        };
        assert_eq!(*status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "bad data item");
    }
}
