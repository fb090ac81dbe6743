use crate::{
    Error,
    Result,
    ao::ProcessMessenger,
    controller::ViewController,
    protocol::{
        Action,
        DryRunResult,
        MessageId,
        ResultMessage,
        Tag,
    },
    view::NotificationKind,
    wallets::{
        DataItem,
        DataItemSigner,
        Permission,
        Wallet,
    },
};
use reqwest::StatusCode;
use serde_json::Value;
use std::{
    cell::RefCell,
    collections::HashMap,
};

pub const TEST_ADDRESS: &str = "abcdefgh12345678";
pub const OPPONENT_ADDRESS: &str = "zyxwvuts87654321";

/// In-memory wallet that records what the controller asked of it.
#[derive(Clone, Debug)]
pub struct FakeWallet {
    address: String,
    available: bool,
    deny_connect: bool,
    signer_available: bool,
    fail_disconnect: bool,
    connected: bool,
    granted: Vec<Permission>,
    disconnect_calls: usize,
}

impl FakeWallet {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            available: true,
            deny_connect: false,
            signer_available: true,
            fail_disconnect: false,
            connected: false,
            granted: Vec::new(),
            disconnect_calls: 0,
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn denying_permissions(mut self) -> Self {
        self.deny_connect = true;
        self
    }

    pub fn without_signer(mut self) -> Self {
        self.signer_available = false;
        self
    }

    pub fn failing_disconnect(mut self) -> Self {
        self.fail_disconnect = true;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn granted(&self) -> &[Permission] {
        &self.granted
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls
    }
}

impl Default for FakeWallet {
    fn default() -> Self {
        Self::new(TEST_ADDRESS)
    }
}

impl Wallet for FakeWallet {
    type Signer = FakeSigner;

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn connect(&mut self, permissions: &[Permission]) -> Result<()> {
        if !self.available {
            return Err(Error::WalletUnavailable);
        }
        if self.deny_connect {
            return Err(Error::CapabilityDenied(String::from(
                "permission request rejected by user",
            )));
        }
        self.granted = permissions.to_vec();
        self.connected = true;
        Ok(())
    }

    async fn active_address(&self) -> Result<String> {
        Ok(self.address.clone())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.disconnect_calls += 1;
        if self.fail_disconnect {
            return Err(Error::Remote {
                url: String::from("fake://wallet/disconnect"),
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: String::from("disconnect refused"),
            });
        }
        self.connected = false;
        Ok(())
    }

    fn signer(&self) -> Result<FakeSigner> {
        if !self.signer_available {
            return Err(Error::SignerUnavailable);
        }
        Ok(FakeSigner)
    }
}

/// "Signs" by serializing the data item as JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct FakeSigner;

impl DataItemSigner for FakeSigner {
    async fn sign(&self, item: &DataItem) -> Result<Vec<u8>> {
        serde_json::to_vec(item).map_err(|e| Error::MalformedResponse(e.to_string()))
    }
}

/// Canned dry-run replies keyed by action name. Anything without a reply
/// fails the way an unreachable compute unit would.
#[derive(Debug, Default)]
pub struct FakeMessenger {
    replies: HashMap<&'static str, DryRunResult>,
    fail_commits: bool,
    dry_runs: RefCell<Vec<Action>>,
    messages: RefCell<Vec<(Action, DataItem)>>,
}

impl FakeMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(mut self, action: &'static str, result: DryRunResult) -> Self {
        self.replies.insert(action, result);
        self
    }

    /// Replies with `data` as the first and only message.
    pub fn with_reply(self, action: &'static str, data: Value) -> Self {
        let result = DryRunResult {
            messages: vec![message(data, Vec::new())],
            ..DryRunResult::default()
        };
        self.with_result(action, result)
    }

    /// Replies with an unrelated notice followed by `data` tagged as `response`.
    pub fn with_tagged_reply(
        self,
        action: &'static str,
        response: &str,
        data: Value,
    ) -> Self {
        let result = DryRunResult {
            messages: vec![
                message(
                    Value::String(String::from("debit")),
                    vec![Tag::new("Action", "Debit-Notice")],
                ),
                message(data, vec![Tag::new("Action", response)]),
            ],
            ..DryRunResult::default()
        };
        self.with_result(action, result)
    }

    pub fn failing_commits(mut self) -> Self {
        self.fail_commits = true;
        self
    }

    pub fn dry_runs(&self) -> Vec<Action> {
        self.dry_runs.borrow().clone()
    }

    pub fn dry_run_names(&self) -> Vec<&'static str> {
        self.dry_runs.borrow().iter().map(Action::name).collect()
    }

    pub fn messages(&self) -> Vec<Action> {
        self.messages
            .borrow()
            .iter()
            .map(|(action, _)| action.clone())
            .collect()
    }

    /// Data items as they were handed to the signer.
    pub fn signed_items(&self) -> Vec<DataItem> {
        self.messages
            .borrow()
            .iter()
            .map(|(_, item)| item.clone())
            .collect()
    }

    pub fn forget_calls(&self) {
        self.dry_runs.borrow_mut().clear();
        self.messages.borrow_mut().clear();
    }
}

fn message(data: Value, tags: Vec<Tag>) -> ResultMessage {
    let data = match data {
        Value::String(text) => text,
        other => other.to_string(),
    };
    ResultMessage {
        data: Some(data),
        tags,
    }
}

impl ProcessMessenger for FakeMessenger {
    async fn dryrun(&self, action: &Action) -> Result<DryRunResult> {
        self.dry_runs.borrow_mut().push(action.clone());
        self.replies
            .get(action.name())
            .cloned()
            .ok_or_else(|| Error::Remote {
                url: String::from("fake://cu/dry-run"),
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: format!("no reply for {}", action.name()),
            })
    }

    async fn message<S: DataItemSigner>(
        &self,
        action: &Action,
        signer: &S,
    ) -> Result<MessageId> {
        if self.fail_commits {
            return Err(Error::Remote {
                url: String::from("fake://mu/"),
                status: StatusCode::BAD_GATEWAY,
                body: String::from("messenger unit down"),
            });
        }
        let item = DataItem {
            target: String::from("fake-process"),
            anchor: String::from("0"),
            tags: action.tags(),
            data: String::new(),
        };
        signer.sign(&item).await?;
        let mut messages = self.messages.borrow_mut();
        messages.push((action.clone(), item));
        Ok(MessageId(format!("msg-{}", messages.len())))
    }
}

/// A controller that has already connected [`TEST_ADDRESS`], with the
/// messenger's call log cleared so tests only see their own traffic.
pub async fn connected_controller(
    messenger: FakeMessenger,
) -> ViewController<FakeWallet, FakeMessenger> {
    let mut controller = ViewController::new(FakeWallet::default(), messenger);
    controller.connect_wallet().await;
    controller.messenger().forget_calls();
    controller
}

pub fn notification_texts<W, M>(controller: &ViewController<W, M>) -> Vec<String> {
    controller
        .notifications()
        .history()
        .iter()
        .map(|n| n.text.clone())
        .collect()
}

pub fn latest_notification<W, M>(
    controller: &ViewController<W, M>,
) -> Option<(NotificationKind, String)> {
    controller
        .notification()
        .map(|n| (n.kind, n.text.clone()))
}
