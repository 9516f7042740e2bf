//! Config command - inspect and edit the tally configuration file.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;
use serde_json::Value as Json;

use tally_core::TallyConfig;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Write the built-in defaults to a configuration file
    Init {
        /// Destination (default: the configuration file path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print one value, addressed by a dotted key such as `store.dir`
    Get { key: String },

    /// Change one value; VALUE is parsed as JSON, or taken as a string
    Set { key: String, value: String },

    /// Print where the configuration file lives
    Path,
}

/// The configuration file a command operates on.
struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    fn locate(config_path: Option<&str>) -> Self {
        let path = config_path
            .map(PathBuf::from)
            .unwrap_or_else(default_config_path);
        Self { path }
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> anyhow::Result<TallyConfig> {
        if self.exists() {
            Ok(TallyConfig::from_file(&self.path)?)
        } else {
            Ok(TallyConfig::default())
        }
    }

    fn store(&self, config: &TallyConfig) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        config.save(&self.path)?;
        Ok(())
    }
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let file = ConfigFile::locate(config_path);

    match args.command {
        ConfigCommand::Show => {
            if !file.exists() {
                eprintln!("{} {} not found, showing defaults.", style("ℹ").blue(), file.path.display());
            }
            println!("{}", serde_json::to_string_pretty(&file.load()?)?);
        }
        ConfigCommand::Init { output, force } => {
            let target = ConfigFile {
                path: output.unwrap_or(file.path),
            };
            if target.exists() && !force {
                anyhow::bail!(
                    "{} already exists (pass --force to replace it)",
                    target.path.display()
                );
            }
            target.store(&TallyConfig::default())?;
            println!("{} Wrote defaults to {}", style("✓").green(), target.path.display());
        }
        ConfigCommand::Get { key } => {
            let json = serde_json::to_value(file.load()?)?;
            let value = json
                .pointer(&pointer(&key))
                .ok_or_else(|| anyhow::anyhow!("No configuration key {}", key))?;
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        ConfigCommand::Set { key, value } => {
            let value = serde_json::from_str(&value).unwrap_or(Json::String(value));
            let mut json = serde_json::to_value(file.load()?)?;
            assign(&mut json, &key, value.clone())?;
            let config: TallyConfig = serde_json::from_value(json)
                .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;
            file.store(&config)?;
            println!("{} {} = {}", style("✓").green(), key, value);
        }
        ConfigCommand::Path => {
            println!("{}", file.path.display());
            if file.exists() {
                eprintln!("{}", style("exists").green());
            } else {
                eprintln!(
                    "{} (run `tally config init` to create it)",
                    style("not created").yellow()
                );
            }
        }
    }

    Ok(())
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tally")
        .join("config.json")
}

/// JSON pointer for a dotted key: `accounts.loan.color` -> `/accounts/loan/color`.
fn pointer(key: &str) -> String {
    key.split('.')
        .map(|part| format!("/{}", part.replace('~', "~0").replace('/', "~1")))
        .collect()
}

/// Set `key` in `json`, creating the last segment inside an existing object.
fn assign(json: &mut Json, key: &str, value: Json) -> anyhow::Result<()> {
    let (parent, last) = match key.rsplit_once('.') {
        Some((parent, last)) => (pointer(parent), last),
        None => (String::new(), key),
    };
    match json.pointer_mut(&parent).and_then(Json::as_object_mut) {
        Some(object) => {
            object.insert(last.to_string(), value);
            Ok(())
        }
        None => anyhow::bail!("No configuration section for {}", key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pointer() {
        assert_eq!(pointer("store.dir"), "/store/dir");
        assert_eq!(pointer("accounts.a/b"), "/accounts/a~1b");
    }

    #[test]
    fn test_assign() {
        let mut config = json!({"store": {"dir": "confs"}, "accounts": {}});
        assign(&mut config, "store.dir", json!("statements")).unwrap();
        assign(&mut config, "accounts.pension", json!({"color": "navy"})).unwrap();

        assert_eq!(config["store"]["dir"], "statements");
        assert_eq!(config["accounts"]["pension"]["color"], "navy");
        assert!(assign(&mut config, "missing.key", json!(1)).is_err());
        assert!(assign(&mut config, "store.dir.deeper", json!(1)).is_err());
    }
}
