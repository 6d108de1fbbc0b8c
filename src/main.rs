use anyhow::Result;
use autumnus::{FormatterOption, Options, highlight, themes};
use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use iocraft::prelude::*;
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};
use url::Url;

use crate::client::DashboardClient;
use crate::ui::{ConfigHeader, ErrorMessage, InputPrompt, SuccessMessage};

mod client;
mod config;
mod rest_types;
mod ui;

const SEND_SUCCESS: &str = "Message sent successfully!";
const SEND_ERROR: &str = "Error sending message.";
const UPLOAD_SUCCESS: &str = "Media uploaded successfully!";
const UPLOAD_ERROR: &str = "Error uploading media.";

#[derive(Parser)]
#[command(name = "wadash")]
#[command(version)]
#[command(about = "A tool for sending WhatsApp messages and media through the dashboard bot API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure wadash interactively
    Config,
    /// Check dashboard API and bot health
    Health,
    /// Send a text message
    Send {
        /// Recipient phone number
        #[arg(short, long)]
        recipient: Option<String>,
        /// Message text to send
        message: String,
    },
    /// Store your API key in the OS keyring
    SetApiKey { api_key: String },
    /// Upload a media file and send it to a recipient
    Upload {
        /// Path to the media file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Recipient phone number
        #[arg(short, long)]
        recipient: Option<String>,
        /// Caption to attach to the media
        #[arg(short, long, default_value = "")]
        caption: String,
    },
    /// Print CLI documentation as Markdown
    #[command(hide = true)]
    MarkdownHelp,
}

fn main() -> Result<()> {
    pretty_env_logger::init_timed();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let _rt_guard = rt.enter();
    clap_complete::CompleteEnv::with_factory(Cli::command).complete();
    let cli = Cli::parse();

    rt.block_on(async {
        match cli.command {
            Commands::Config => interactive_config(),
            Commands::SetApiKey { api_key } => config::set_api_key_keyring(api_key),
            Commands::MarkdownHelp => {
                clap_markdown::print_help_markdown::<Cli>();
                Ok(())
            }
            requires_api_key => {
                let config = config::read_config()?;
                let client = DashboardClient::new(
                    config.dashboard_base_url.clone(),
                    config.dashboard_api_key.clone(),
                    config.request_timeout,
                )?;
                let default_recipient = config.default_recipient.clone();

                let load_recipient = |maybe_recipient: Option<String>| {
                    maybe_recipient.or(default_recipient.clone()).expect(
                        "A recipient must be specified via the --recipient argument or a default recipient configured",
                    )
                };

                match requires_api_key {
                    Commands::Send { recipient, message } => {
                        send_message(&client, &load_recipient(recipient), &message).await
                    }
                    Commands::Upload {
                        file,
                        recipient,
                        caption,
                    } => {
                        upload_media(
                            &client,
                            &file,
                            &load_recipient(recipient),
                            &caption,
                            config.max_upload_bytes,
                        )
                        .await
                    }
                    Commands::Health => health(&client).await,
                    Commands::Config | Commands::SetApiKey { .. } | Commands::MarkdownHelp => {
                        panic!("This state should be unreachable")
                    }
                }
            }
        }
    })
}

async fn send_message(client: &DashboardClient, recipient: &str, message: &str) -> Result<()> {
    let outcome = client.send_message(message, recipient).await;
    ui::notify(&ui::settle(outcome, SEND_SUCCESS, SEND_ERROR));
    Ok(())
}

async fn upload_media(
    client: &DashboardClient,
    file: &Path,
    recipient: &str,
    caption: &str,
    max_upload_bytes: u64,
) -> Result<()> {
    client::check_media_file(file, max_upload_bytes)?;

    let outcome = client.upload_media(file, recipient, caption).await;
    ui::notify(&ui::settle(outcome, UPLOAD_SUCCESS, UPLOAD_ERROR));
    Ok(())
}

async fn health(client: &DashboardClient) -> Result<()> {
    let health = client.health().await?;
    let output = highlight(
        &serde_json::to_string_pretty(&health)?,
        Options {
            formatter: FormatterOption::Terminal {
                theme: Some(themes::get("ayu_light").expect("Syntax highlighting theme not found")),
            },
            lang_or_file: Some("json"),
        },
    );
    println!("{}", output);
    Ok(())
}

fn read_input(prompt: &str, default: Option<&str>, description: Option<&str>) -> Result<String> {
    element! {
        InputPrompt(
            prompt: prompt.to_string(),
            default: default.map(|s| s.to_string()),
            description: description.map(|s| s.to_string())
        )
    }
    .print();

    print!("> ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim().to_string();

    if input.is_empty() {
        if let Some(def) = default {
            Ok(def.to_string())
        } else {
            Ok(input)
        }
    } else {
        Ok(input)
    }
}

fn interactive_config() -> Result<()> {
    element!(ConfigHeader()).print();

    let dashboard_base_url = loop {
        let base_url_str = read_input(
            "Dashboard Base URL",
            Some(config::DEFAULT_DASHBOARD_BASE_URL),
            Some("The base URL of the dashboard bot API"),
        )?;

        match Url::parse(&base_url_str) {
            Ok(url) => break url,
            Err(e) => {
                element!(ErrorMessage(message: format!("Invalid URL: {}", e))).print();
                println!();
            }
        }
    };

    let dashboard_api_key = loop {
        let api_key = read_input(
            "API Key",
            None,
            Some("Your dashboard API key (stored securely in OS keyring)"),
        )?;

        if api_key.is_empty() {
            element!(ErrorMessage(message: "API key cannot be empty".to_string())).print();
            println!();
        } else {
            break api_key;
        }
    };

    let default_recipient_str = read_input(
        "Default Recipient",
        None,
        Some("Optional: Set a default recipient to avoid specifying --recipient every time"),
    )?;
    let default_recipient = if default_recipient_str.is_empty() {
        None
    } else {
        Some(default_recipient_str)
    };

    config::set_api_key_keyring(dashboard_api_key)?;

    let config_file = config::ConfigFile {
        default_recipient,
        dashboard_base_url: Some(dashboard_base_url),
        max_upload_bytes: None,
        request_timeout: None,
    };

    config::write_config(config_file)?;

    element!(SuccessMessage(message: "Configuration complete!".to_string())).print();

    Ok(())
}
