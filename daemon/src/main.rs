//! Voters daemon: entry point for running a delegate voters node.

use anyhow::Context;
use clap::Parser;
use dpos_node::{NodeConfig, ShutdownController, VotersNode};
use dpos_utils::{init_logging, LogFormat};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dpos-daemon", about = "Delegate voters index daemon")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "DPOS_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the LMDB environment.
    #[arg(long, env = "DPOS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Interface the HTTP server binds to.
    #[arg(long, env = "DPOS_RPC_BIND")]
    rpc_bind: Option<String>,

    /// HTTP server port.
    #[arg(long, env = "DPOS_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Largest `limit` a voters query may request.
    #[arg(long, env = "DPOS_MAX_LIMIT")]
    max_limit: Option<u64>,

    /// Answer "No data returned" for accounts that are not delegates.
    #[arg(long, env = "DPOS_REQUIRE_DELEGATE")]
    require_delegate: bool,

    /// Genesis JSON applied when the store is empty.
    #[arg(long, env = "DPOS_GENESIS")]
    genesis: Option<PathBuf>,

    /// Log level filter, e.g. "info" or "warn,dpos_rpc=debug".
    #[arg(long, env = "DPOS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "DPOS_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Node commands.
    #[command(name = "node")]
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
}

#[derive(clap::Subcommand, Debug, PartialEq, Eq)]
enum NodeAction {
    /// Run the node until SIGINT/SIGTERM.
    Run,
    /// Print the effective configuration as TOML.
    Config,
}

impl Cli {
    /// Load the config file, if any, and apply CLI overrides on top.
    fn resolve_config(&self) -> anyhow::Result<NodeConfig> {
        let base = match &self.config {
            Some(path) => NodeConfig::from_toml_file(path)
                .with_context(|| format!("loading config file {}", path.display()))?,
            None => NodeConfig::default(),
        };
        let config = self.apply_overrides(base);
        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    fn apply_overrides(&self, base: NodeConfig) -> NodeConfig {
        NodeConfig {
            data_dir: self.data_dir.clone().unwrap_or(base.data_dir),
            rpc_bind: self.rpc_bind.clone().unwrap_or(base.rpc_bind),
            rpc_port: self.rpc_port.unwrap_or(base.rpc_port),
            max_limit: self.max_limit.unwrap_or(base.max_limit),
            require_delegate: self.require_delegate || base.require_delegate,
            log_format: self.log_format.unwrap_or(base.log_format),
            log_level: self.log_level.clone().unwrap_or(base.log_level),
            lmdb_map_size: base.lmdb_map_size,
            genesis_file: self.genesis.clone().or(base.genesis_file),
        }
    }
}

async fn run(config: NodeConfig) -> anyhow::Result<()> {
    init_logging(config.log_format, &config.log_level)?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        rpc = %format!("{}:{}", config.rpc_bind, config.rpc_port),
        max_limit = config.max_limit,
        require_delegate = config.require_delegate,
        "starting voters node"
    );

    // Opening LMDB and replaying the edge log block.
    let node = tokio::task::spawn_blocking(move || VotersNode::open(config))
        .await
        .context("node startup task failed")??;

    let shutdown = ShutdownController::new();
    let signals = shutdown.clone();
    tokio::spawn(async move { signals.wait_for_signal().await });

    node.run(&shutdown).await?;
    tracing::info!("voters daemon exited cleanly");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    match cli.command {
        Command::Node { action } => match action {
            NodeAction::Run => run(config).await,
            NodeAction::Config => {
                print!("{}", config.to_toml_string()?);
                Ok(())
            }
        },
    }
}
