use clap::{Parser, ValueEnum};
use lib::protocol::{ResponseMode, DEFAULT_HISTORY_LIMIT};
use lib::run::RunOptions;

#[derive(Parser)]
#[command(name = "atypica-inbound")]
#[command(about = "Atypica inbound test client", long_about = None, version)]
struct Cli {
    /// Message to send; words are joined with spaces (default: a short greeting).
    #[arg(value_name = "MESSAGE")]
    message: Vec<String>,

    /// Response mode (default: ATYPICA_RESPONSE_MODE or sync).
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Do not query the message history after sending.
    #[arg(long)]
    no_history: bool,

    /// Number of history entries to request.
    #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    limit: u32,

    /// Settings file path (default: ATYPICA_CONFIG_PATH or ~/.atypica/inbound.json)
    #[arg(long, short, value_name = "PATH")]
    config: Option<std::path::PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Async,
    Sync,
}

impl From<ModeArg> for ResponseMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Async => ResponseMode::Async,
            ModeArg::Sync => ResponseMode::Sync,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run_client(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            log::error!("inbound client failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run_client(cli: Cli) -> anyhow::Result<bool> {
    let settings = lib::config::load_settings(cli.config)?;
    let client = lib::client::InboundClient::from_settings(&settings);
    let options = RunOptions {
        words: cli.message,
        mode: cli.mode.map(ResponseMode::from),
        no_history: cli.no_history,
        history_limit: cli.limit,
        ..RunOptions::default()
    };
    let mut stdout = std::io::stdout();
    Ok(lib::run::run(&client, &settings, &options, &mut stdout).await)
}
