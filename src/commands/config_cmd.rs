use clap::{Args, Subcommand};
use std::fmt::Write;

use super::OutputFormat;
use crate::config::{Config, ConfigSource};

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective settings and where each one came from
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the database file path
    DbPath,
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
                OutputFormat::Text => print!("{}", render_settings(config)),
            },
            ConfigSubcommand::DbPath => {
                println!("{}", config.database_path.value.display());
            }
        }
        Ok(())
    }
}

fn settings(config: &Config) -> [(&'static str, String, &ConfigSource); 3] {
    [
        (
            "database_path",
            config.database_path.value.display().to_string(),
            &config.database_path.source,
        ),
        (
            "expiring_soon_days",
            config.expiring_soon_days.value.to_string(),
            &config.expiring_soon_days.source,
        ),
        (
            "low_stock_threshold",
            config.low_stock_threshold.value.to_string(),
            &config.low_stock_threshold.source,
        ),
    ]
}

/// One line per setting, key column padded to the longest key.
fn render_settings(config: &Config) -> String {
    let mut out = String::new();
    let file = match &config.config_file {
        Some(path) => path.display().to_string(),
        None => format!("{} (not found)", Config::default_config_path().display()),
    };
    let _ = writeln!(out, "Settings from {}", file);

    let rows = settings(config);
    let width = rows.iter().map(|(key, _, _)| key.len()).max().unwrap_or(0);
    for (key, value, source) in rows {
        let _ = writeln!(out, "  {:<width$}  {}  [{}]", key, value, source, width = width);
    }
    out
}
