//! Config inspection command.

use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;
use tabled::{Table, Tabled, settings::Style};

use super::OutputFormat;
use crate::config::Config;

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration (secrets masked)
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Print the path of the user config file
    Path,
}

#[derive(Debug, Serialize, Tabled)]
struct SettingDisplay {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Handle config commands.
pub fn handle_config(
    action: &ConfigAction,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show { output } => {
            let tree = serde_json::to_value(config.masked())?;
            match *output {
                OutputFormat::Table => {
                    let mut table = Table::new(flatten(&tree));
                    table.with(Style::rounded());
                    println!("{}", table);
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tree)?),
            }
        }
        ConfigAction::Path => match Config::default_config_path() {
            Some(path) => println!("{}", path.display()),
            None => return Err("could not determine config directory".into()),
        },
    }
    Ok(())
}

/// Dotted key/value rows for every leaf of `tree`.
fn flatten(tree: &Value) -> Vec<SettingDisplay> {
    let mut rows = Vec::new();
    flatten_into(tree, String::new(), &mut rows);
    rows
}

fn flatten_into(value: &Value, key: String, rows: &mut Vec<SettingDisplay>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (name, child) in map {
                let child_key = if key.is_empty() {
                    name.clone()
                } else {
                    format!("{key}.{name}")
                };
                flatten_into(child, child_key, rows);
            }
        }
        Value::String(s) => rows.push(SettingDisplay {
            key,
            value: s.clone(),
        }),
        other => rows.push(SettingDisplay {
            key,
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_produces_dotted_keys_with_masked_token() {
        let mut config = Config::default();
        config.integrations.azure.api_token = "0123456789abcdef".to_string();
        config.aliases.insert("up".into(), "sync".into());
        let tree = serde_json::to_value(config.masked()).unwrap();

        let rows = flatten(&tree);
        let get = |key: &str| {
            rows.iter()
                .find(|r| r.key == key)
                .map(|r| r.value.as_str())
        };

        assert_eq!(get("concurrency"), Some("10"));
        assert_eq!(get("integrations.azure.enabled"), Some("false"));
        assert_eq!(get("integrations.azure.api_token"), Some("********cdef"));
        assert_eq!(get("aliases.up"), Some("sync"));
        assert!(rows.iter().all(|r| !r.value.contains("0123456789")));
    }

    #[test]
    fn empty_tables_show_as_a_single_row() {
        let tree = serde_json::json!({ "aliases": {} });

        let rows = flatten(&tree);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "aliases");
        assert_eq!(rows[0].value, "{}");
    }
}
