mod app_state;
mod tui;
mod ui;

use anyhow::Context;
use chatline_sdk::{
    polling, socket, ClientConfig, CookieJar, HttpChannel, MalformedPolicy, Poller, SocketSession,
    ViewEvent,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{error, info};

use crate::app_state::{AppController, Variant};
use crate::tui::{EventHandler, Tui};
use crate::ui::chat::ChatApp;

const TICK_RATE: Duration = Duration::from_millis(250);

#[derive(Parser, Debug)]
#[command(name = "chatline")]
#[command(about = "Terminal chat client")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Chat server base URL (overrides CHAT_URL)
    #[arg(long)]
    pub url: Option<String>,

    /// WebSocket endpoint (overrides CHAT_SOCKET_URL; derived from the URL otherwise)
    #[arg(long)]
    pub socket_url: Option<String>,

    /// Initial cookie string, e.g. "user=ada" (overrides CHAT_COOKIE)
    #[arg(long)]
    pub cookie: Option<String>,

    /// Write logs to this file; nothing is logged otherwise
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chat over a single WebSocket
    Socket,
    /// Chat over HTTP long-polling
    Poll {
        /// Stop polling on a reply without a message list instead of retrying
        #[arg(long)]
        halt_on_malformed: bool,
    },
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        if let Some(url) = &self.url {
            config = config.with_base_url(url);
        }
        if let Some(url) = &self.socket_url {
            config.socket_url.clone_from(url);
        }
        if let Some(cookie) = &self.cookie {
            config.cookie.clone_from(cookie);
        }
        if let Commands::Poll { halt_on_malformed: true } = self.command {
            config.on_malformed = MalformedPolicy::Halt;
        }
        config
    }
}

fn init_logging(path: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run_socket(
    config: ClientConfig,
    jar: CookieJar,
    view: UnboundedSender<ViewEvent>,
    submissions: UnboundedReceiver<String>,
) {
    let mut session = SocketSession::new(view, jar.clone());
    match socket::connect(&config, &jar).await {
        Ok((sink, stream)) => socket::run(&mut session, sink, stream, submissions).await,
        Err(e) => session.failed(&e),
    }
}

fn spawn_polling(
    config: &ClientConfig,
    channel: HttpChannel,
    view: UnboundedSender<ViewEvent>,
    mut submissions: UnboundedReceiver<String>,
) {
    let http = Arc::new(channel);

    let mut poller = Poller::new(http.clone(), view.clone(), config);
    tokio::spawn(async move {
        let exit = poller.run().await;
        info!(reason = %exit, "poll loop finished");
    });

    tokio::spawn(async move {
        let mut view = view;
        while let Some(text) = submissions.recv().await {
            polling::post_message(http.as_ref(), &mut view, &text).await;
        }
    });
}

async fn run_app(terminal: &mut Tui, app: &mut ChatApp, events: &mut EventHandler) -> anyhow::Result<()> {
    while !app.should_quit() {
        terminal.draw(|f| app.render(f))?;
        match events.next_async().await {
            Some(action) => app.update(action),
            None => break,
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let config = cli.client_config();
    info!(url = %config.base_url, command = ?cli.command, "starting");

    let channel = HttpChannel::bootstrap(&config, config.cookie_jar())
        .await
        .context("cannot build HTTP client")?;

    let mut events = EventHandler::new(TICK_RATE);
    let view = events.view_sender();
    let (submit_tx, submit_rx) = mpsc::unbounded_channel::<String>();

    let variant = match cli.command {
        Commands::Socket => {
            tokio::spawn(run_socket(config.clone(), channel.jar().clone(), view, submit_rx));
            Variant::Socket
        }
        Commands::Poll { .. } => {
            spawn_polling(&config, channel, view, submit_rx);
            Variant::Polling
        }
    };

    let mut app = ChatApp::new(variant, submit_tx);
    let mut terminal = tui::init()?;
    let result = run_app(&mut terminal, &mut app, &mut events).await;
    tui::restore()?;

    if let Err(e) = &result {
        error!(error = %e, "terminal UI failed");
    }
    result
}
