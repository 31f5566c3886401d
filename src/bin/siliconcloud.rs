//! SiliconCloud command line client
//!
//! ```text
//! siliconcloud embed <text>...
//! siliconcloud chat [--system <prompt>] [--json] <prompt>...
//! ```
//!
//! Configuration is read from `CONFIG_PATH` (default `siliconcloud.toml`) with
//! `SILICONCLOUD__*` overrides. Without a config file the defaults are used and
//! the key comes from `SILICONCLOUD_API_KEY`.

use anyhow::{bail, Context};
use siliconcloud_llm::{
    config::Config,
    embedding::EmbeddingClient,
    llm::{ChatClient, CompletionOptions, LlmProvider},
    observability::init_observability,
    usage::TokenTracker,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

const USAGE: &str = "usage: siliconcloud embed <text>... | siliconcloud chat [--system <prompt>] [--json] <prompt>...";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "siliconcloud.toml".to_string());
    let config = if Path::new(&config_path).exists() {
        Config::from_file_with_env(&config_path)
            .with_context(|| format!("loading configuration from {}", config_path))?
    } else {
        let config = Config::default_config();
        config.validate()?;
        config
    };

    init_observability(&config.logging.level, &config.logging.format);
    info!("Configuration loaded (path={}, exists={})", config_path, Path::new(&config_path).exists());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        bail!(USAGE);
    };

    match command.as_str() {
        "embed" => {
            if rest.is_empty() {
                bail!(USAGE);
            }
            let client = EmbeddingClient::new(config.embedding)?;
            let vectors = client.embed(rest).await?;
            println!("{}", serde_json::to_string(&vectors)?);
        }
        "chat" => {
            let mut system_prompt = None;
            let mut keyword_extraction = false;
            let mut words = Vec::new();
            let mut iter = rest.iter();

            while let Some(arg) = iter.next() {
                match arg.as_str() {
                    "--system" => {
                        system_prompt = Some(iter.next().context("--system needs a value")?.clone());
                    }
                    "--json" => keyword_extraction = true,
                    _ => words.push(arg.as_str()),
                }
            }

            if words.is_empty() {
                bail!(USAGE);
            }

            let tracker = Arc::new(TokenTracker::new());
            let options = CompletionOptions::new()
                .with_token_tracker(tracker.clone())
                .with_keyword_extraction(keyword_extraction);

            let client = ChatClient::new(config.chat)?;
            let reply = client
                .complete(&words.join(" "), system_prompt.as_deref(), &[], options)
                .await?;

            println!("{}", reply);
            info!("Token usage: {:?}", tracker.summary());
        }
        other => bail!("unknown command '{}'\n{}", other, USAGE),
    }

    Ok(())
}
