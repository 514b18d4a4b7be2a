//! agrigpt CLI: terminal client for the AgriGPT advisory chat

use agrigpt_engine::{
    AttachmentFile, Config, ConversationPage, HttpBackend, MemoryPreviewStore, StaticIdentity,
    Topic,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "agrigpt=info";

/// Agricultural advisory chat in the terminal
#[derive(Debug, Parser)]
#[command(name = "agrigpt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.agrigpt/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Sign in as this email for the session
    #[arg(long, global = true)]
    email: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Open the TUI (default when no command specified)
    Tui,

    /// Ask one question and print the answer
    Ask {
        /// Topic: citrus or schemes (default from config)
        #[arg(long)]
        topic: Option<Topic>,

        /// Photo of the affected plant
        #[arg(long)]
        image: Option<PathBuf>,

        /// Question text
        text: Vec<String>,
    },

    /// Print the effective configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Where log output goes.
enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = with_email(
        Config::load_or_default(&config_path)?.apply_env(),
        cli.email.clone(),
    );

    match cli.command {
        None | Some(Commands::Tui) => {
            init_logging(&LogTarget::File(&config.log_path()))?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(agrigpt_tui::run_tui(config))
        }
        Some(Commands::Ask { topic, image, text }) => {
            init_logging(&LogTarget::Stderr)?;
            let rt = tokio::runtime::Runtime::new()?;
            let reply = rt.block_on(cmd_ask(&config, topic, image.as_deref(), &text.join(" ")))?;
            println!("{reply}");
            Ok(())
        }
        Some(Commands::Config { init, json }) => cmd_config(&config_path, &config, init, json),
    }
}

/// `--email` wins over the file and the environment.
fn with_email(mut config: Config, email: Option<String>) -> Config {
    if let Some(email) = email.filter(|e| !e.trim().is_empty()) {
        config.user_email = Some(email);
    }
    config
}

fn init_logging(target: &LogTarget<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init().map_err(|e| e as Box<dyn std::error::Error>)?,
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init().map_err(|e| e as Box<dyn std::error::Error>)?;
        }
    }
    Ok(())
}

async fn cmd_ask(
    config: &Config,
    topic: Option<Topic>,
    image: Option<&Path>,
    text: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let attachment = image.map(AttachmentFile::from_path).transpose()?;
    let backend = HttpBackend::from_config(config)?;

    let mut page = ConversationPage::new(
        topic.unwrap_or(config.default_topic),
        Arc::new(StaticIdentity::new(config.user_email.clone())),
        Arc::new(MemoryPreviewStore::new()),
    );
    page.submit(&backend, text, attachment).await?;

    if let Some(chat_id) = page.chat_id() {
        tracing::info!(chat_id, "Answer received");
    }
    let reply = page
        .messages()
        .last()
        .map(|m| m.text.clone())
        .unwrap_or_default();
    Ok(reply)
}

fn cmd_config(
    path: &Path,
    config: &Config,
    init: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if init {
        if path.exists() {
            println!("Config already exists at {}", path.display());
        } else {
            Config::default().save(path)?;
            println!("Wrote default config to {}", path.display());
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        print!("{}", describe_config(path, config));
    }
    Ok(())
}

fn describe_config(path: &Path, config: &Config) -> String {
    let speech = config
        .speech_command
        .as_ref()
        .map_or_else(|| "(unsupported)".to_string(), |argv| argv.join(" "));

    let mut out = String::new();
    out.push_str(&format!("Config file:  {}\n", path.display()));
    out.push_str(&format!("Backend:      {}\n", config.base_url()));
    out.push_str(&format!(
        "Email:        {}\n",
        config.user_email.as_deref().unwrap_or("(not signed in)")
    ));
    out.push_str(&format!("Language:     {}\n", config.language));
    out.push_str(&format!("Topic:        {}\n", config.default_topic));
    out.push_str(&format!("Timeout:      {}s\n", config.request_timeout_seconds));
    out.push_str(&format!("Speech:       {speech}\n"));
    out.push_str(&format!("Log file:     {}\n", config.log_path().display()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_tui() {
        let cli = Cli::try_parse_from(["agrigpt"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_ask_arguments() {
        let cli = Cli::try_parse_from([
            "agrigpt",
            "--email",
            "grower@example.com",
            "ask",
            "--topic",
            "schemes",
            "PM-KISAN",
            "eligibility",
        ])
        .unwrap();
        assert_eq!(cli.email.as_deref(), Some("grower@example.com"));
        match cli.command {
            Some(Commands::Ask { topic, image, text }) => {
                assert_eq!(topic, Some(Topic::GovernmentSchemes));
                assert!(image.is_none());
                assert_eq!(text.join(" "), "PM-KISAN eligibility");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_topic_rejected() {
        assert!(Cli::try_parse_from(["agrigpt", "ask", "--topic", "wheat", "hi"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["agrigpt", "config", "--json", "--config", "/tmp/a.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/a.json")));
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                init: false,
                json: true
            })
        ));
    }

    #[test]
    fn test_config_precedence() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let saved = Config {
            user_email: Some("file@example.com".into()),
            ..Config::default()
        };
        saved.save(&path).unwrap();

        let from_file = with_email(Config::load_or_default(&path).unwrap(), None);
        assert_eq!(from_file.user_email.as_deref(), Some("file@example.com"));

        let env = |key: &str| {
            (key == agrigpt_engine::config::ENV_USER_EMAIL).then(|| "env@example.com".to_string())
        };
        let from_env = Config::load_or_default(&path).unwrap().apply_overrides(env);
        assert_eq!(from_env.user_email.as_deref(), Some("env@example.com"));

        let from_flag = with_email(from_env, Some("flag@example.com".into()));
        assert_eq!(from_flag.user_email.as_deref(), Some("flag@example.com"));
    }

    #[test]
    fn test_blank_email_flag_is_ignored() {
        let config = Config {
            user_email: Some("file@example.com".into()),
            ..Config::default()
        };
        let config = with_email(config, Some("  ".into()));
        assert_eq!(config.user_email.as_deref(), Some("file@example.com"));
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load_or_default(&dir.path().join("none.json")).unwrap();
        assert_eq!(config.default_topic, Topic::CitrusCrop);
        assert!(config.user_email.is_none());
    }

    #[test]
    fn test_describe_config() {
        let config = Config::default();
        let text = describe_config(Path::new("/tmp/config.json"), &config);
        assert!(text.contains("Config file:  /tmp/config.json"));
        assert!(text.contains("(not signed in)"));
        assert!(text.contains("(unsupported)"));
        assert!(text.contains("Citrus Crop"));
    }
}
