use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::{Builder, Env, Target};
use log::{debug, error, info};
use serde_json::Value;
use std::{io::Write, path::PathBuf, time::Duration};
use tp2bmc_console::{
    config::{AppConfig, DeviceConfig},
    dispatcher::{Dispatcher, FetchOutcome},
    notification::LogToaster,
    render::{FeatureTag, LogAlert, Renderer},
    session::FileSessionStore,
};

/// Every invocation is one page load: a pending save notification from the
/// previous invocation is shown first, then the command runs.
#[derive(Parser)]
#[command(name = "tp2bmc-console", version, about = "Drive the tp2bmc web console API")]
struct Cli {
    #[arg(long, help = "Base URL for relative request paths")]
    base_url: Option<String>,
    #[arg(long, help = "Request timeout in milliseconds")]
    timeout_ms: Option<u64>,
    #[arg(long, help = "Directory holding session state")]
    session_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a page and print the payload routed to its renderer
    Get {
        url: String,
        #[arg(long, default_value = "other", help = "usb|sdcard|other|power|nodeinfo")]
        tag: String,
    },
    /// Save settings; the result is shown on the next invocation
    Set {
        url: String,
        #[arg(long, conflicts_with = "json", help = "Raw request body")]
        body: Option<String>,
        #[arg(long, help = "JSON request body")]
        json: Option<String>,
    },
    /// Only show and clear the pending save notification
    Notify,
}

/// Prints payloads of one page to stdout.
struct PrintRenderer(FeatureTag);

impl Renderer for PrintRenderer {
    fn render(&self, payload: &Value) {
        match serde_json::to_string_pretty(payload) {
            Ok(json) => println!("{json}"),
            Err(e) => error!("failed to print {} payload: {e}", self.0),
        }
    }
}

fn main() {
    if let Err(e) = run() {
        error!("application error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    initialize();

    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;

    let device = DeviceConfig::new(
        cli.base_url.unwrap_or(config.device.base_url),
        cli.timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(config.device.timeout),
    )?;
    let session_dir = cli.session_dir.unwrap_or(config.session.dir);
    let session = FileSessionStore::open(session_dir)?;

    let dispatcher = FeatureTag::BUILTIN
        .into_iter()
        .fold(Dispatcher::new(device, session, LogAlert)?, |d, tag| {
            d.with_renderer(tag.clone(), PrintRenderer(tag))
        });

    let shown = dispatcher.notifications().consume_and_clear(&LogToaster);
    debug!("pending notification: {shown:?}");

    match cli.command {
        Command::Get { url, tag } => {
            let tag = FeatureTag::from(tag.as_str());
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to build async runtime")?;

            match runtime.block_on(dispatcher.fetch(&url, &tag))? {
                FetchOutcome::Rendered => {}
                FetchOutcome::Dropped => info!("no page renders {tag}"),
                FetchOutcome::TransportFailed => anyhow::bail!("failed to load {url}"),
            }
        }
        Command::Set { url, body, json } => {
            let outcome = match json {
                Some(json) => {
                    let json: Value =
                        serde_json::from_str(&json).context("failed to parse --json body")?;
                    dispatcher.submit_json(&url, &json)
                }
                None => dispatcher.submit(&url, body),
            };
            info!("save {outcome}, shown on next page load");
        }
        Command::Notify => {}
    }

    Ok(())
}

fn initialize() {
    log_panics::init();

    let mut builder = if cfg!(debug_assertions) {
        Builder::from_env(Env::default().default_filter_or("debug"))
    } else {
        Builder::from_env(Env::default().default_filter_or("info"))
    };

    builder.format(|f, record| match record.level() {
        log::Level::Error => {
            eprintln!("{}", record.args());
            Ok(())
        }
        _ => {
            writeln!(f, "{}", record.args())
        }
    });

    builder.target(Target::Stdout).init();

    info!("module version: {}", env!("CARGO_PKG_VERSION"));
}
