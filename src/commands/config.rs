//! Saved-configuration subcommands. These run without a GCP client.

use anyhow::{bail, Result};
use clap::Subcommand;

use crate::config::Config;
use crate::gcp::auth::validate_project_id;
use crate::output::OutputFormat;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the saved configuration
    Show,
    /// Set a configuration value (project, output, poll-timeout-secs)
    Set { key: String, value: String },
    /// Clear a configuration value
    Unset { key: String },
}

pub fn run(command: ConfigCommand, config: &mut Config) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            println!("project: {}", config.project_id.as_deref().unwrap_or("-"));
            println!(
                "output: {}",
                match config.output {
                    Some(OutputFormat::Json) => "json",
                    Some(OutputFormat::Table) => "table",
                    None => "-",
                }
            );
            match config.poll_timeout_secs {
                Some(secs) => println!("poll-timeout-secs: {secs}"),
                None => println!("poll-timeout-secs: -"),
            }
        }
        ConfigCommand::Set { key, value } => {
            apply(config, &key, Some(&value))?;
            config.save()?;
        }
        ConfigCommand::Unset { key } => {
            apply(config, &key, None)?;
            config.save()?;
        }
    }

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: Option<&str>) -> Result<()> {
    match key {
        "project" => {
            if let Some(project) = value {
                if !validate_project_id(project) {
                    bail!("'{project}' is not a valid GCP project ID");
                }
            }
            config.project_id = value.map(str::to_string);
        }
        "output" => {
            config.output = match value {
                None => None,
                Some("table") => Some(OutputFormat::Table),
                Some("json") => Some(OutputFormat::Json),
                Some(other) => bail!("unknown output format '{other}' (expected table or json)"),
            };
        }
        "poll-timeout-secs" => {
            config.poll_timeout_secs = match value {
                None => None,
                Some(raw) => Some(
                    raw.parse()
                        .map_err(|_| anyhow::anyhow!("'{raw}' is not a number of seconds"))?,
                ),
            };
        }
        other => bail!("unknown configuration key '{other}'"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_unset_project() {
        let mut config = Config::default();
        apply(&mut config, "project", Some("my-project")).unwrap();
        assert_eq!(config.project_id.as_deref(), Some("my-project"));
        apply(&mut config, "project", None).unwrap();
        assert!(config.project_id.is_none());
    }

    #[test]
    fn invalid_project_id_is_rejected() {
        let mut config = Config::default();
        assert!(apply(&mut config, "project", Some("NOPE")).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut config = Config::default();
        assert!(apply(&mut config, "zone", Some("us-central1-a")).is_err());
    }

    #[test]
    fn output_accepts_known_formats_only() {
        let mut config = Config::default();
        apply(&mut config, "output", Some("json")).unwrap();
        assert_eq!(config.output, Some(OutputFormat::Json));
        assert!(apply(&mut config, "output", Some("yaml")).is_err());
    }
}
