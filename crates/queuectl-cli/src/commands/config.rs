//! Config command handlers

use anyhow::Result;
use clap::Subcommand;

use crate::context::Context;
use crate::output;

/// Config subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Set a config value
    Set {
        /// max_retries or backoff_base (hyphens accepted)
        key: String,
        /// Non-negative integer
        value: String,
    },
    /// Show the effective settings
    List,
}

pub async fn handle_config_command(command: ConfigCommands, ctx: &Context) -> Result<()> {
    let queue = ctx.job_queue().await?;

    match command {
        ConfigCommands::Set { key, value } => {
            let (key, value) = queue.set_config(&key, &value).await?;
            if ctx.json {
                return output::print_json(&serde_json::json!({ key.as_str(): value }));
            }
            println!("Set {key} = {value}");
            Ok(())
        }
        ConfigCommands::List => {
            let settings = queue.config_values().await?;
            if ctx.json {
                return output::print_json(&settings);
            }
            output::print_settings(&settings);
            Ok(())
        }
    }
}
