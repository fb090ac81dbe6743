//! The view controller: takes UI events, talks to the wallet and the arena
//! process, and keeps [`ViewState`] in step with what the process reports.
//!
//! Every state-changing action is dry-run first. The commit is only sent when
//! the dry run comes back successful, and it reuses the exact same tags.
//! Failures never escape an operation; they are logged and turned into a
//! notification.

use crate::{
    Error,
    Result,
    ao::ProcessMessenger,
    display::{
        self,
        NONE_TEXT,
        PlayerSlot,
        ZERO_TEXT,
    },
    protocol::{
        self,
        Action,
        COORDINATE_ROOM_RESPONSE,
        CreateRoomReply,
        DryRunResult,
        InputError,
        JoinRoomReply,
        LeaderboardReply,
        MatchStateReply,
        MessageId,
        Reply,
        TurnReply,
        TurnSelection,
    },
    session::Session,
    view::{
        AppSnapshot,
        Inputs,
        LeaderboardPanel,
        Notification,
        NotificationKind,
        Notifications,
        View,
        ViewState,
    },
    wallets::{
        REQUIRED_PERMISSIONS,
        Wallet,
    },
};
use serde::de::DeserializeOwned;
use std::time::Instant;
use tracing::{
    debug,
    error,
    info,
    warn,
};

pub const WALLET_UNAVAILABLE_STATUS: &str = "Wallet not available";
const WALLET_UNAVAILABLE_HINT: &str = "Please install or start the wallet extension.";
const UNEXPECTED_RESPONSE: &str = "Unexpected response";
const INVALID_MATCH_STATE: &str = "Invalid match state";
const INVALID_RESPONSE_FORMAT: &str = "Invalid response format";

pub struct ViewController<W, M> {
    wallet: W,
    messenger: M,
    session: Session,
    view: ViewState,
    inputs: Inputs,
    notifications: Notifications,
    busy: Option<String>,
}

impl<W, M> ViewController<W, M> {
    pub fn new(wallet: W, messenger: M) -> Self {
        Self {
            wallet,
            messenger,
            session: Session::default(),
            view: ViewState::default(),
            inputs: Inputs::default(),
            notifications: Notifications::default(),
            busy: None,
        }
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut Inputs {
        &mut self.inputs
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notifications.latest()
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn set_busy(&mut self, label: Option<String>) {
        self.busy = label;
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            view: self.view.clone(),
            inputs: self.inputs.clone(),
            notification: self.notifications.visible_at(Instant::now()).cloned(),
            history: self.notifications.history().to_vec(),
            busy: self.busy.clone(),
        }
    }

    fn notify_success(&mut self, text: impl Into<String>) {
        self.notifications
            .push(Notification::new(NotificationKind::Success, text));
    }

    fn notify_error(&mut self, text: impl Into<String>) {
        self.notifications
            .push(Notification::new(NotificationKind::Error, text));
    }

    /// Input problems are shown as-is; everything else gets the action's prefix.
    fn report(&mut self, context: &str, err: &Error) {
        match err {
            Error::Input(input) => {
                warn!(reason = %input, "{context}");
                self.notify_error(input.to_string());
            }
            other => {
                error!(error = %other, "{context}");
                self.notify_error(format!("{context}: {other}"));
            }
        }
    }
}

impl<W: Wallet, M: ProcessMessenger> ViewController<W, M> {
    pub async fn connect_wallet(&mut self) {
        if !self.wallet.is_available().await {
            error!("wallet is not available");
            self.view.status_text = WALLET_UNAVAILABLE_STATUS.to_owned();
            self.notify_error(WALLET_UNAVAILABLE_HINT);
            return;
        }
        if let Err(err) = self.try_connect_wallet().await {
            self.report("Error connecting wallet", &err);
        }
    }

    async fn try_connect_wallet(&mut self) -> Result<()> {
        self.wallet.connect(&REQUIRED_PERMISSIONS).await?;
        let address = self.wallet.active_address().await?;
        let signer = self.wallet.signer()?;

        self.session.connect(address.clone());
        self.view.status_text = display::connected_status(&address);
        self.view.active = View::MatchOptions;
        self.notify_success("Wallet connected successfully!");
        info!(%address, "wallet connected");

        let id = self
            .commit(&Action::JoinGame { address }, &signer)
            .await?;
        debug!(message_id = %id, "registered player");
        self.notify_success("Joined game successfully!");
        self.load_leaderboard().await;
        Ok(())
    }

    /// Local state is cleared even if the wallet refuses to disconnect.
    pub async fn disconnect_wallet(&mut self) {
        let wallet_result = if self.wallet.is_available().await {
            self.wallet.disconnect().await
        } else {
            Ok(())
        };

        self.session.reset();
        self.view = ViewState::default();
        self.inputs = Inputs::default();

        match wallet_result {
            Ok(()) => {
                info!("wallet disconnected");
                self.notify_success("Wallet disconnected successfully!");
            }
            Err(err) => self.report("Error disconnecting wallet", &err),
        }
    }

    pub async fn create_match(&mut self) {
        if let Err(err) = self.try_create_match().await {
            self.report("Error creating room", &err);
        }
    }

    async fn try_create_match(&mut self) -> Result<()> {
        let address = self.session.require_address()?.to_owned();
        let wager = protocol::parse_wager(&self.inputs.wager)?;
        let signer = self.wallet.signer()?;
        let action = Action::CreateRoom { address, wager };

        let room: CreateRoomReply = self
            .dry_run_tagged(&action, COORDINATE_ROOM_RESPONSE)
            .await?
            .into_result(UNEXPECTED_RESPONSE)?;
        let match_id = room.match_id.as_deref().unwrap_or(NONE_TEXT).to_owned();
        let room_code = room.room_code.as_deref().unwrap_or(NONE_TEXT).to_owned();
        self.session.set_match_id(room.match_id.clone());
        self.inputs.room_code = room.room_code.clone().unwrap_or_default();
        self.view.match_id = match_id.clone();
        self.view.room_code = room_code.clone();
        self.notify_success(format!(
            "Room created! Code: {}, Wager: {}, Match ID: {}",
            room_code,
            room.wager.as_deref().unwrap_or(NONE_TEXT),
            match_id
        ));

        self.commit(&action, &signer).await?;
        let tokens = room.tokens_remaining.as_deref().unwrap_or(NONE_TEXT);
        self.notify_success(format!(
            "Room created! Code: {room_code}, Tokens: {tokens}, Match ID: {match_id}"
        ));
        info!(%match_id, %room_code, "room created");
        self.inputs.wager.clear();
        self.fetch_match_state().await;
        self.view.active = View::Match;
        Ok(())
    }

    pub async fn join_match(&mut self) {
        if let Err(err) = self.try_join_match().await {
            self.report("Error joining match", &err);
        }
    }

    async fn try_join_match(&mut self) -> Result<()> {
        let address = self.session.require_address()?.to_owned();
        let room_code = protocol::parse_room_code(&self.inputs.room_code)?;
        let signer = self.wallet.signer()?;
        let action = Action::JoinRoom { address, room_code };

        let joined: JoinRoomReply = self
            .dry_run_tagged(&action, COORDINATE_ROOM_RESPONSE)
            .await?
            .into_result(INVALID_RESPONSE_FORMAT)?;
        self.session.set_match_id(Some(joined.match_id.clone()));
        let wager = joined.wager.as_deref().unwrap_or(ZERO_TEXT);
        self.notify_success(format!(
            "Joined match! Opponent: {}, Wager: {}, Match ID: {}",
            display::shorten(&joined.opponent),
            wager,
            joined.match_id
        ));

        self.commit(&action, &signer).await?;
        let turn = display::shorten(&display::strip_player_marker(&joined.current_turn));
        self.notify_success(format!(
            "Match started! Your turn: {}, Match ID: {}",
            turn, joined.match_id
        ));
        info!(match_id = %joined.match_id, "joined match");
        self.fetch_match_state().await;
        self.view.active = View::Match;
        Ok(())
    }

    pub async fn play_turn(&mut self) {
        if let Err(err) = self.try_play_turn().await {
            self.report("Error playing turn", &err);
        }
    }

    async fn try_play_turn(&mut self) -> Result<()> {
        let address = self.session.require_address()?.to_owned();
        let turn = TurnSelection::parse(
            &self.inputs.card,
            &self.inputs.move_type,
            &self.inputs.target,
            &self.inputs.room_code,
        )?;
        let signer = self.wallet.signer()?;
        let action = Action::ProcessTurn { address, turn };

        let played: TurnReply = self
            .dry_run_first(&action)
            .await?
            .into_result(UNEXPECTED_RESPONSE)?;
        let or_none = |value: &Option<String>| value.as_deref().unwrap_or(NONE_TEXT).to_owned();
        self.notify_success(format!(
            "Turn played! {} ({}) dealt {} to {}",
            or_none(&played.card),
            or_none(&played.move_type),
            or_none(&played.damage),
            or_none(&played.target)
        ));

        self.commit(&action, &signer).await?;
        let next = played
            .next_turn
            .as_deref()
            .map(display::shorten)
            .unwrap_or_else(|| NONE_TEXT.to_owned());
        self.notify_success(format!("Turn processed! Next: {next}"));
        self.inputs.clear_turn_selection();
        self.fetch_match_state().await;
        self.load_leaderboard().await;
        Ok(())
    }

    pub async fn fetch_match_state(&mut self) {
        if let Err(err) = self.try_fetch_match_state().await {
            self.fail_match_state(&err);
        }
    }

    /// Same as [`Self::fetch_match_state`], but needs a wallet and confirms success.
    pub async fn refresh_match_state(&mut self) {
        if !self.session.is_connected() {
            self.report(
                "Error fetching match state",
                &Error::from(InputError::WalletNotConnected),
            );
            return;
        }
        match self.try_fetch_match_state().await {
            Ok(()) => self.notify_success("Match state refreshed"),
            Err(err) => self.fail_match_state(&err),
        }
    }

    async fn try_fetch_match_state(&mut self) -> Result<()> {
        let address = self.session.wallet_address().unwrap_or_default().to_owned();
        let room_code = self.inputs.room_code.trim().to_owned();
        let action = Action::GetMatchState {
            address: address.clone(),
            room_code,
        };

        let state: MatchStateReply = self
            .dry_run_first(&action)
            .await?
            .into_result(INVALID_MATCH_STATE)?;
        self.session.set_match_id(state.match_id.clone());
        self.render_match_state(&state);

        let balance = self.dry_run(&Action::JoinGame { address }).await?;
        let tokens = protocol::tokens_from_payload(balance.first_data())?
            .unwrap_or_else(|| ZERO_TEXT.to_owned());
        self.view.tokens_percent = display::token_percent(&tokens);
        self.view.tokens = tokens;
        Ok(())
    }

    fn render_match_state(&mut self, state: &MatchStateReply) {
        let or_none = |value: &Option<String>| {
            value.clone().unwrap_or_else(|| NONE_TEXT.to_owned())
        };
        self.view.match_id = or_none(&state.match_id);
        self.view.room_code = or_none(&state.room_code);
        self.view.wager = state
            .wager
            .clone()
            .unwrap_or_else(|| ZERO_TEXT.to_owned());
        self.view.turn = state
            .turn
            .as_deref()
            .map(display::shorten)
            .unwrap_or_else(|| NONE_TEXT.to_owned());

        let mine = display::player_slot(
            self.session.wallet_address(),
            state.player_a.as_deref(),
            state.player_b.as_deref(),
        );
        let theirs = mine.map(PlayerSlot::opponent);
        let cards_for = |slot: Option<PlayerSlot>| {
            display::cards_text(slot.and_then(|s| state.cards.get(s.key())))
        };
        self.view.your_cards = cards_for(mine);
        self.view.opponent_cards = cards_for(theirs);
    }

    fn fail_match_state(&mut self, err: &Error) {
        self.view.reset_match();
        self.report("Error fetching match state", err);
    }

    pub async fn load_leaderboard(&mut self) {
        self.render_leaderboard().await;
    }

    pub async fn refresh_leaderboard(&mut self) {
        if self.render_leaderboard().await {
            self.notify_success("Leaderboard refreshed");
        }
    }

    /// Returns whether rows were rendered. An empty board counts as a failure.
    async fn render_leaderboard(&mut self) -> bool {
        let outcome = self
            .dry_run_first::<LeaderboardReply>(&Action::GetLeaderboard)
            .await
            .and_then(|reply| reply.into_result(UNEXPECTED_RESPONSE))
            .and_then(|board| {
                board.leaderboard.ok_or_else(|| Error::Rejected {
                    message: UNEXPECTED_RESPONSE.to_owned(),
                })
            });

        match outcome {
            Ok(entries) if entries.is_empty() => {
                self.view.leaderboard = LeaderboardPanel::NoData;
                self.notify_error("Leaderboard empty");
                false
            }
            Ok(entries) => {
                let rows = display::leaderboard_rows(&entries);
                debug!(rows = rows.len(), "leaderboard loaded");
                self.view.leaderboard = LeaderboardPanel::Rows(rows);
                true
            }
            Err(err) => {
                self.view.leaderboard = LeaderboardPanel::Error;
                self.report("Error fetching leaderboard", &err);
                false
            }
        }
    }

    async fn dry_run(&self, action: &Action) -> Result<DryRunResult> {
        debug!(action = action.name(), "dry run");
        self.messenger.dryrun(action).await
    }

    async fn dry_run_first<T: DeserializeOwned>(&self, action: &Action) -> Result<Reply<T>> {
        let result = self.dry_run(action).await?;
        Reply::parse(result.first_data())
    }

    async fn dry_run_tagged<T: DeserializeOwned>(
        &self,
        action: &Action,
        response_action: &str,
    ) -> Result<Reply<T>> {
        let result = self.dry_run(action).await?;
        let message = result
            .tagged(response_action)
            .ok_or_else(|| Error::MissingResponse {
                tag: response_action.to_owned(),
            })?;
        Reply::parse(message.data())
    }

    async fn commit(&self, action: &Action, signer: &W::Signer) -> Result<MessageId> {
        info!(action = action.name(), "committing message");
        self.messenger.message(action, signer).await
    }
}
