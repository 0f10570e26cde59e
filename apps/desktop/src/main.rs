use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{spawn_poll, Backend, NativeBackend, SettingsStore};
use shared::{domain::ChannelId, settings::Theme};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use desktop::{
    backend_bridge,
    config::{load_startup_config, AppPaths, CONFIG_FILE},
    controller::{
        events::UiEvents, ChatListPage, ChatPage, LoginPage, Page, PageContext, RegisterPage,
    },
    ui::spawn_renderer,
};

#[derive(Parser, Debug)]
#[command(name = "dumb-chat", about = "Desktop chat client")]
struct Cli {
    /// Startup configuration file.
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,
    /// Directory holding settings and session state.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the session token.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: Option<String>,
        /// Two-factor code, if the account needs one.
        #[arg(long)]
        code: Option<String>,
    },
    /// Create an account on the configured server.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session.
    Logout,
    /// List channels, optionally filtered by a search query.
    Channels {
        #[arg(long)]
        search: Option<String>,
    },
    /// Create a channel and show the refreshed list.
    CreateChannel { name: String },
    /// Open a channel's chat; lines typed on stdin are sent as messages.
    Chat {
        /// Channel to open; defaults to the last opened one.
        #[arg(long)]
        channel: Option<String>,
    },
    /// Show or change persisted settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Check whether the server answers.
    Ping {
        #[arg(long)]
        server: Option<String>,
    },
    /// Keep reporting server reachability until interrupted.
    Monitor {
        #[arg(long)]
        server: Option<String>,
    },
    /// Send one raw bridge command, e.g. '{"cmd":"get_settings"}'.
    Invoke { command: String },
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    Show,
    Set {
        #[arg(long)]
        server_url: Option<String>,
        #[arg(long, value_enum)]
        theme: Option<ThemeArg>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(value: ThemeArg) -> Self {
        match value {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut startup = load_startup_config(&cli.config)?;
    if let Some(dir) = cli.data_dir.clone() {
        startup.data_dir = Some(dir);
    }
    init_tracing(&startup.log_filter);

    let paths = AppPaths::from_startup(&startup)?;
    tracing::debug!(data_root = %paths.data_root.display(), "resolved app paths");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build backend runtime")?;

    let (ui_tx, ui_rx) = crossbeam_channel::bounded(2048);
    let renderer = spawn_renderer(ui_rx, startup.color);

    let backend: Arc<dyn Backend> = Arc::new(NativeBackend::new(SettingsStore::new(
        &paths.settings_path,
    )));
    let ctx = PageContext::new(backend, paths.session_path.clone(), UiEvents::new(ui_tx))
        .with_poll_interval(startup.poll_interval());

    let result = runtime.block_on(run(cli.command, ctx));

    // Dropping the runtime drops every task still holding an event sender,
    // which lets the renderer drain and exit.
    drop(runtime);
    if renderer.join().is_err() {
        tracing::warn!("renderer thread panicked");
    }
    result
}

async fn run(command: Command, ctx: PageContext) -> Result<()> {
    match command {
        Command::Login {
            username,
            password,
            code,
        } => login(ctx, username, password, code).await,
        Command::Register { username, password } => register(ctx, username, password).await,
        Command::Logout => {
            ctx.logout();
            Ok(())
        }
        Command::Channels { search } => {
            let mut page = ChatListPage::open(ctx).await.map_err(redirected)?;
            if let Some(query) = search {
                page.search(&query).await;
            }
            Ok(())
        }
        Command::CreateChannel { name } => {
            let mut page = ChatListPage::open(ctx).await.map_err(redirected)?;
            if !page.create_channel(&name).await {
                bail!("channel was not created");
            }
            Ok(())
        }
        Command::Chat { channel } => chat(ctx, channel.map(ChannelId::new)).await,
        Command::Settings { action } => settings(ctx, action).await,
        Command::Ping { server } => {
            let server = resolve_server(&ctx, server).await;
            if !ctx.check_server(&server).await {
                bail!("server {server} is unavailable");
            }
            Ok(())
        }
        Command::Monitor { server } => {
            let server = resolve_server(&ctx, server).await;
            ctx.check_server(&server).await;
            let poll_ctx = ctx.clone();
            let _monitor = spawn_poll(ctx.poll_interval, move || {
                let ctx = poll_ctx.clone();
                let server = server.clone();
                async move {
                    ctx.check_server(&server).await;
                }
            });
            tokio::signal::ctrl_c()
                .await
                .context("failed to wait for ctrl-c")?;
            Ok(())
        }
        Command::Invoke { command } => {
            let command = backend_bridge::parse_command(&command)
                .map_err(|err| anyhow!("{}", err.message))?;
            match backend_bridge::invoke(ctx.backend.as_ref(), command).await {
                Ok(reply) => {
                    println!("{}", serde_json::to_string_pretty(&reply)?);
                    Ok(())
                }
                Err(err) => {
                    println!("{}", serde_json::to_string_pretty(&err)?);
                    bail!("backend command failed: {}", err.message)
                }
            }
        }
    }
}

fn redirected(page: Page) -> anyhow::Error {
    match page {
        Page::Login => anyhow!("not signed in; run `dumb-chat login` first"),
        other => anyhow!("page unavailable; redirected to {other:?}"),
    }
}

async fn resolve_server(ctx: &PageContext, server: Option<String>) -> String {
    match server {
        Some(server) => server,
        None => ctx.load_settings().await.server_or_default().to_string(),
    }
}

async fn prompt(label: &str) -> Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(label.as_bytes()).await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn login(
    ctx: PageContext,
    username: String,
    password: Option<String>,
    code: Option<String>,
) -> Result<()> {
    let mut page = LoginPage::open(ctx).await;
    page.form.username = username;
    page.form.password = match password {
        Some(password) => password,
        None => prompt("password: ").await?,
    };

    let mut next = page.submit().await;
    if next.is_none() && page.two_factor_visible() {
        page.form.two_factor = match code {
            Some(code) => code,
            None => prompt("two-factor code: ").await?,
        };
        next = page.submit().await;
    }

    match next {
        Some(_) => Ok(()),
        None => bail!("login failed"),
    }
}

async fn register(ctx: PageContext, username: String, password: Option<String>) -> Result<()> {
    let mut page = RegisterPage::open(ctx).await;
    page.form.username = username;
    match password {
        Some(password) => {
            page.form.confirm_password = password.clone();
            page.form.password = password;
        }
        None => {
            page.form.password = prompt("password: ").await?;
            page.form.confirm_password = prompt("confirm password: ").await?;
        }
    }

    match page.submit().await {
        Some(_) => Ok(()),
        None => bail!("registration failed"),
    }
}

async fn settings(ctx: PageContext, action: SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Show => {
            let settings = ctx
                .backend
                .get_settings()
                .await
                .context("failed to load settings")?;
            println!("server_url = {}", settings.server_or_default());
            println!("theme = {:?}", settings.theme);
            Ok(())
        }
        SettingsAction::Set { server_url, theme } => {
            let current = ctx.load_settings().await;
            let server_url = server_url.unwrap_or(current.server_url);
            let theme = theme.map(Theme::from).unwrap_or(current.theme);
            if ctx.save_settings(&server_url, theme).await.is_none() {
                bail!("settings were not saved");
            }
            Ok(())
        }
    }
}

async fn chat(ctx: PageContext, channel: Option<ChannelId>) -> Result<()> {
    let mut page = ChatPage::open(ctx, channel).await.map_err(redirected)?;
    println!(
        "chat {}: type a message and press enter; /refresh reloads, /back leaves",
        page.channel_id()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read from stdin")? else {
                    break;
                };
                match line.trim() {
                    "/back" => break,
                    "/refresh" => {
                        page.refresh().await;
                    }
                    _ => {
                        page.draft = line;
                        page.send().await;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    page.back();
    Ok(())
}
