use clap::{Parser, Subcommand};
use slack_notify::channels::{ChannelVisibility, ChatGateway, SlackGateway};
use slack_notify::config::{self, Config, ConfigUpdate};
use slack_notify::diagnostics::DiagnosticLog;
use slack_notify::hook::{AskHook, HookResponse, ASK_USER_QUESTION};
use std::io::{Read, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "slack-notify")]
#[command(about = "Answer agent questions from Slack", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// PreToolUse hook: read {"tool_name", "tool_input"} JSON on stdin, write the hook response JSON on stdout.
    Hook {
        /// Config file path (default: SLACK_NOTIFY_CONFIG or ~/.claude/slack-notify.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Ask a single question through Slack and print the hook response.
    Ask {
        /// Question text
        question: String,

        /// Option label (repeatable). Without options the question asks for a free-text reply.
        #[arg(long = "option", value_name = "LABEL")]
        options: Vec<String>,

        /// Config file path (default: SLACK_NOTIFY_CONFIG or ~/.claude/slack-notify.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Create or update the config file (written owner-readable only).
    Init {
        /// Config file path (default: SLACK_NOTIFY_CONFIG or ~/.claude/slack-notify.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Bot token (xoxb-...)
        #[arg(long, value_name = "TOKEN")]
        bot_token: Option<String>,

        /// Channel id questions are posted to
        #[arg(long, value_name = "ID")]
        channel: Option<String>,

        /// Seconds between thread polls
        #[arg(long, value_name = "SECONDS")]
        poll_interval: Option<u64>,

        /// Minutes to wait for an answer
        #[arg(long, value_name = "MINUTES")]
        timeout: Option<i64>,

        /// Redact paths and tokens from question text
        #[arg(long)]
        sanitize: Option<bool>,

        /// Enable or disable the redirect
        #[arg(long)]
        enabled: Option<bool>,
    },

    /// Check the bot token (auth.test).
    Verify {
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// List channels visible to the bot.
    Channels {
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Post a test message to the configured channel.
    Test {
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            init_logging(None);
            println!("slack-notify {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Hook { config }) => {
            let response = run_hook(config).await;
            print_response(&response);
        }
        Some(Commands::Ask {
            question,
            options,
            config,
        }) => {
            let response = run_ask(config, question, options).await;
            print_response(&response);
        }
        Some(Commands::Init {
            config,
            bot_token,
            channel,
            poll_interval,
            timeout,
            sanitize,
            enabled,
        }) => {
            init_logging(None);
            let update = ConfigUpdate {
                enabled,
                bot_token,
                channel_id: channel,
                poll_interval_seconds: poll_interval,
                timeout_minutes: timeout,
                sanitize_messages: sanitize,
            };
            if let Err(e) = run_init(config, update) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Verify { config }) => {
            init_logging(None);
            if let Err(e) = run_verify(config).await {
                log::error!("verify failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Channels { config }) => {
            init_logging(None);
            if let Err(e) = run_channels(config).await {
                log::error!("listing channels failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Test { config }) => {
            init_logging(None);
            if let Err(e) = run_test(config).await {
                log::error!("connection test failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

/// Logs go to stderr; RUST_LOG wins over the config's logLevel.
fn init_logging(config: Option<&Config>) {
    let default_level = config.map(|c| c.log_level.as_str()).unwrap_or("warn");
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .try_init();
}

/// Load config for the hook path. A broken config file is recorded and treated as absent.
fn load_hook_config(path: Option<PathBuf>, diagnostics: &DiagnosticLog) -> Option<Config> {
    match config::load_config(path) {
        Ok((config, _)) => {
            init_logging(config.as_ref());
            config
        }
        Err(e) => {
            init_logging(None);
            log::error!("error reading config: {:#}", e);
            diagnostics.record(&e);
            None
        }
    }
}

async fn run_hook(config_path: Option<PathBuf>) -> HookResponse {
    let diagnostics = DiagnosticLog::default_location();
    let config = load_hook_config(config_path, &diagnostics);
    let hook = AskHook::new(config, diagnostics);

    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        return hook.fall_back(anyhow::Error::new(e).context("reading hook input"));
    }
    hook.handle_input(&input).await
}

async fn run_ask(
    config_path: Option<PathBuf>,
    question: String,
    options: Vec<String>,
) -> HookResponse {
    let diagnostics = DiagnosticLog::default_location();
    let config = load_hook_config(config_path, &diagnostics);
    let options: Vec<serde_json::Value> = options
        .into_iter()
        .map(|label| serde_json::json!({ "label": label }))
        .collect();
    let params = serde_json::json!({
        "questions": [{
            "question": question,
            "options": options,
            "multiSelect": false
        }]
    });
    AskHook::new(config, diagnostics)
        .handle(ASK_USER_QUESTION, params)
        .await
}

fn print_response(response: &HookResponse) {
    let body = serde_json::to_string(response).unwrap_or_else(|_| r#"{"allow":true}"#.to_string());
    let mut stdout = std::io::stdout();
    let _ = writeln!(stdout, "{}", body);
    let _ = stdout.flush();
}

fn run_init(config_path: Option<PathBuf>, update: ConfigUpdate) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(config::default_config_path);
    let config = config::update_config(&path, update)?;
    println!("wrote configuration to {}", path.display());
    if config.slack_settings().is_none() {
        println!("note: botToken and channelId are both required before questions are redirected");
    }
    Ok(())
}

/// Load config for setup commands; these require a usable bot token.
fn setup_settings(config_path: Option<PathBuf>) -> anyhow::Result<slack_notify::config::SlackSettings> {
    let (config, path) = config::load_config(config_path)?;
    config
        .and_then(|c| c.slack_settings())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "slack not configured; run `slack-notify init --bot-token ... --channel ...` (config: {})",
                path.display()
            )
        })
}

async fn run_verify(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let settings = setup_settings(config_path)?;
    let identity = SlackGateway::new(settings.bot_token)
        .verify_identity()
        .await?;
    println!(
        "token valid: team {} ({}), bot {}, user {}",
        identity.team.as_deref().unwrap_or("?"),
        identity.team_id.as_deref().unwrap_or("?"),
        identity.bot_id.as_deref().unwrap_or("?"),
        identity.user_id.as_deref().unwrap_or("?"),
    );
    Ok(())
}

async fn run_channels(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let settings = setup_settings(config_path)?;
    let channels = SlackGateway::new(settings.bot_token).list_channels().await?;
    for c in channels {
        let visibility = match c.visibility {
            ChannelVisibility::Public => "public",
            ChannelVisibility::Private => "private",
        };
        println!("{}\t#{}\t{}", c.id, c.name, visibility);
    }
    Ok(())
}

async fn run_test(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let settings = setup_settings(config_path)?;
    let ts = SlackGateway::new(settings.bot_token)
        .test_connection(&settings.channel_id)
        .await?;
    println!("posted test message to {} (msg_id: {})", settings.channel_id, ts);
    Ok(())
}
