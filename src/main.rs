use chronoclash::{
    ao,
    wallets,
};
use clap::{
    ArgGroup,
    Parser,
};
use color_eyre::eyre::Result;

mod client;
mod ui;

#[derive(Debug, Parser)]
#[command(
    name = "chronoclash",
    about = "Terminal client for the ChronoClash card arena",
    group(ArgGroup::new("network").args(["testnet", "local"]))
)]
struct Cli {
    /// Talk to the ao testnet units (default)
    #[arg(long)]
    testnet: bool,
    /// Talk to compute and messenger units running on localhost
    #[arg(long)]
    local: bool,
    /// Override the compute unit URL for the selected network
    #[arg(long, value_name = "URL")]
    cu_url: Option<String>,
    /// Override the messenger unit URL for the selected network
    #[arg(long, value_name = "URL")]
    mu_url: Option<String>,
    /// Arena process id
    #[arg(long, value_name = "ID", default_value = ao::DEFAULT_PROCESS_ID)]
    process: String,
    /// Wallet bridge URL
    #[arg(long, value_name = "URL", default_value = wallets::DEFAULT_BRIDGE_URL)]
    wallet_url: String,
    /// Where log files are written
    #[arg(long, value_name = "PATH", default_value = client::DEFAULT_LOG_DIR)]
    log_dir: String,
    /// Per-request HTTP timeout
    #[arg(long, value_name = "SECS", default_value_t = client::DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

impl Cli {
    fn into_config(self) -> client::AppConfig {
        let network = if self.local {
            client::NetworkTarget::Local {
                cu_url: self
                    .cu_url
                    .unwrap_or_else(|| ao::DEFAULT_LOCAL_CU_URL.to_string()),
                mu_url: self
                    .mu_url
                    .unwrap_or_else(|| ao::DEFAULT_LOCAL_MU_URL.to_string()),
            }
        } else {
            client::NetworkTarget::Testnet {
                cu_url: self
                    .cu_url
                    .unwrap_or_else(|| ao::DEFAULT_TESTNET_CU_URL.to_string()),
                mu_url: self
                    .mu_url
                    .unwrap_or_else(|| ao::DEFAULT_TESTNET_MU_URL.to_string()),
            }
        };
        client::AppConfig {
            network,
            process_id: self.process,
            wallet_url: self.wallet_url,
            log_dir: self.log_dir,
            timeout_secs: self.timeout_secs,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let config = Cli::parse().into_config();
    let _log_guard = client::init_tracing(&config.log_dir)?;
    tracing::info!("starting chronoclash client");
    client::run_app(config).await
}
