use crate::ui;
use chronoclash::{
    ao::AoClient,
    controller::ViewController,
    wallets::BridgeWallet,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use std::time::Duration;
use tokio::time;
use tracing::info;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

pub const DEFAULT_LOG_DIR: &str = "~/.chronoclash/logs";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const LOG_FILE_PREFIX: &str = "chronoclash.log";
// Fast enough that a notification disappears close to its deadline.
const REDRAW_INTERVAL: Duration = Duration::from_millis(250);

type Controller = ViewController<BridgeWallet, AoClient>;

#[derive(Clone, Debug)]
pub enum NetworkTarget {
    Testnet { cu_url: String, mu_url: String },
    Local { cu_url: String, mu_url: String },
}

impl NetworkTarget {
    fn label(&self) -> &'static str {
        match self {
            NetworkTarget::Testnet { .. } => "testnet",
            NetworkTarget::Local { .. } => "local",
        }
    }

    fn units(&self) -> (&str, &str) {
        match self {
            NetworkTarget::Testnet { cu_url, mu_url }
            | NetworkTarget::Local { cu_url, mu_url } => (cu_url, mu_url),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub network: NetworkTarget,
    pub process_id: String,
    pub wallet_url: String,
    pub log_dir: String,
    pub timeout_secs: u64,
}

/// Logs go to a daily file; the terminal belongs to the UI.
pub fn init_tracing(log_dir: &str) -> Result<WorkerGuard> {
    let dir = shellexpand::tilde(log_dir).into_owned();
    std::fs::create_dir_all(&dir)
        .wrap_err_with(|| format!("failed to create log directory {dir}"))?;
    let (writer, guard) =
        tracing_appender::non_blocking(rolling::daily(&dir, LOG_FILE_PREFIX));
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| eyre!("failed to install log subscriber: {e}"))?;
    Ok(guard)
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let (cu_url, mu_url) = config.network.units();
    info!(
        network = config.network.label(),
        cu_url,
        mu_url,
        process = %config.process_id,
        wallet = %config.wallet_url,
        "configured arena client"
    );
    let messenger = AoClient::new(&config.process_id, cu_url, mu_url, timeout)
        .wrap_err("failed to build process client")?;
    let wallet = BridgeWallet::new(&config.wallet_url, timeout)
        .wrap_err("failed to build wallet bridge client")?;
    let mut controller = ViewController::new(wallet, messenger);
    let mut ui_state = ui::UiState::default();
    let mut input_events = ui::input_event_stream();

    // UI bootstrap
    ui::terminal_enter(&mut ui_state)?;
    info!("UI ready");
    let res = run_loop(&mut controller, &mut ui_state, &mut input_events).await;
    ui::terminal_exit()?;
    res
}

async fn run_loop(
    controller: &mut Controller,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEvents,
) -> Result<()> {
    let mut ticker = time::interval(REDRAW_INTERVAL);
    ui::draw(ui_state, &controller.snapshot()).wrap_err("initial draw failed")?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => { break; }
            _ = ticker.tick() => {
                ui::draw(ui_state, &controller.snapshot()).wrap_err("redraw failed")?;
            }
            raw_ev = ui::next_raw_event(input_events) => {
                let event = raw_ev?;
                let Some(ev) = ui::interpret_event(ui_state, controller.inputs_mut(), event) else {
                    continue;
                };
                match ev {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::Redraw => {}
                    action => dispatch(controller, ui_state, action).await?,
                }
                ui::draw(ui_state, &controller.snapshot()).wrap_err("draw after input failed")?;
            }
        }
    }
    info!("shutting down");
    Ok(())
}

/// Runs one action to completion. Input is not read again until it returns,
/// so actions never overlap.
async fn dispatch(
    controller: &mut Controller,
    ui_state: &mut ui::UiState,
    event: ui::UserEvent,
) -> Result<()> {
    if let Some(label) = processing_label(&event) {
        show_processing_status(controller, ui_state, label)?;
    }
    match event {
        ui::UserEvent::ConnectWallet => controller.connect_wallet().await,
        ui::UserEvent::DisconnectWallet => controller.disconnect_wallet().await,
        ui::UserEvent::CreateMatch => controller.create_match().await,
        ui::UserEvent::JoinMatch => controller.join_match().await,
        ui::UserEvent::PlayTurn => controller.play_turn().await,
        ui::UserEvent::RefreshState => controller.refresh_match_state().await,
        ui::UserEvent::RefreshLeaderboard => controller.refresh_leaderboard().await,
        ui::UserEvent::Quit | ui::UserEvent::Redraw => {}
    }
    controller.set_busy(None);
    Ok(())
}

fn processing_label(event: &ui::UserEvent) -> Option<&'static str> {
    Some(match event {
        ui::UserEvent::ConnectWallet => "Connecting wallet...",
        ui::UserEvent::DisconnectWallet => "Disconnecting wallet...",
        ui::UserEvent::CreateMatch => "Creating room...",
        ui::UserEvent::JoinMatch => "Joining match...",
        ui::UserEvent::PlayTurn => "Playing turn...",
        ui::UserEvent::RefreshState => "Refreshing match state...",
        ui::UserEvent::RefreshLeaderboard => "Refreshing leaderboard...",
        ui::UserEvent::Quit | ui::UserEvent::Redraw => return None,
    })
}

fn show_processing_status(
    controller: &mut Controller,
    ui_state: &mut ui::UiState,
    label: &str,
) -> Result<()> {
    controller.set_busy(Some(label.to_owned()));
    ui::draw(ui_state, &controller.snapshot()).wrap_err("draw while processing failed")
}
