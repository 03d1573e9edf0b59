use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;
use std::str::FromStr;

use crate::commands::{
    ItemChanges, ListOptions, cmd_add, cmd_config_get, cmd_config_set, cmd_config_show, cmd_edit,
    cmd_ls, cmd_rm, cmd_shell, cmd_show,
};
use crate::config::{CONFIG_KEYS, Config};
use crate::error::Result;
use crate::query::{SortField, SortOrder};
use crate::remote::{HttpGateway, InMemoryGateway, InventoryGateway};
use crate::types::{InventoryItem, ItemId};

#[derive(Parser)]
#[command(name = "inventory")]
#[command(about = "Browse and edit a remote inventory")]
#[command(version)]
pub struct Cli {
    /// Work against a built-in sample catalogue instead of the configured API
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format shared by every command
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List one page of items
    #[command(visible_alias = "l")]
    Ls {
        /// Match item names or SKUs
        #[arg(short, long)]
        search: Option<String>,

        /// Filter by category (case-insensitive substring)
        #[arg(short, long)]
        category: Option<String>,

        /// Sort column: name, sku, quantity, price, category
        #[arg(long, value_parser = parse_sort_field)]
        sort: Option<SortField>,

        /// Sort direction: asc, desc
        #[arg(long, value_parser = parse_sort_order)]
        order: Option<SortOrder>,

        /// Page to show (1-based)
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        /// Items per page (default: list.page_size)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        size: Option<u32>,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Display a single item
    #[command(visible_alias = "s")]
    Show {
        /// Item ID
        #[arg(value_parser = parse_item_id)]
        id: ItemId,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Create a new item
    Add {
        /// Item name
        #[arg(short, long)]
        name: String,

        /// Stock keeping unit
        #[arg(long)]
        sku: String,

        /// Units in stock
        #[arg(short, long, default_value_t = 0)]
        quantity: u32,

        /// Unit price
        #[arg(short, long)]
        price: f64,

        /// Category, e.g. Books, Clothing, Electronics, Appliances, Furniture
        #[arg(short, long)]
        category: String,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Change fields of an existing item
    Edit {
        /// Item ID
        #[arg(value_parser = parse_item_id)]
        id: ItemId,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New SKU
        #[arg(long)]
        sku: Option<String>,

        /// New quantity
        #[arg(short, long)]
        quantity: Option<u32>,

        /// New price
        #[arg(short, long)]
        price: Option<f64>,

        /// New category
        #[arg(short, long)]
        category: Option<String>,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Delete one or more items
    #[command(visible_alias = "delete")]
    Rm {
        /// Item IDs
        #[arg(required = true, value_parser = parse_item_id)]
        ids: Vec<ItemId>,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Interactive list session (type `help` once started)
    Shell,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for [possible values: bash, zsh, fish, powershell, elvish]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        #[command(flatten)]
        output: OutputOptions,
    },
    /// Set a configuration value
    Set {
        /// Configuration key (api.base_url, api.token, api.timeout_secs, list.page_size, list.debounce_ms, list.sort)
        #[arg(value_parser = parse_config_key)]
        key: String,
        /// Value to set
        value: String,
        #[command(flatten)]
        output: OutputOptions,
    },
    /// Get a configuration value
    Get {
        /// Configuration key (api.base_url, api.token, api.timeout_secs, list.page_size, list.debounce_ms, list.sort)
        #[arg(value_parser = parse_config_key)]
        key: String,
        #[command(flatten)]
        output: OutputOptions,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let offline = self.offline;
        match self.command {
            Commands::Config { action } => match action {
                ConfigAction::Show { output } => cmd_config_show(output),
                ConfigAction::Set { key, value, output } => cmd_config_set(&key, &value, output),
                ConfigAction::Get { key, output } => cmd_config_get(&key, output),
            },

            Commands::Completions { shell } => {
                generate_completions(shell);
                Ok(())
            }

            command => {
                let config = Config::load()?;
                if offline {
                    tracing::debug!("using the offline sample catalogue");
                    command.run_against(InMemoryGateway::sample(), &config).await
                } else {
                    let gateway = HttpGateway::from_config(&config)?;
                    tracing::debug!("using {}", gateway.collection_url());
                    command.run_against(gateway, &config).await
                }
            }
        }
    }
}

impl Commands {
    async fn run_against<G: InventoryGateway>(self, gateway: G, config: &Config) -> Result<()> {
        match self {
            Commands::Ls {
                search,
                category,
                sort,
                order,
                page,
                size,
                output,
            } => {
                let opts = ListOptions {
                    search,
                    category,
                    sort,
                    order,
                    page_index: page - 1,
                    page_size: size,
                    output,
                };
                cmd_ls(gateway, config, opts).await
            }

            Commands::Show { id, output } => cmd_show(&gateway, id, output).await,

            Commands::Add {
                name,
                sku,
                quantity,
                price,
                category,
                output,
            } => {
                let item = InventoryItem::new(name, sku, quantity, price, category);
                cmd_add(gateway, item, output).await
            }

            Commands::Edit {
                id,
                name,
                sku,
                quantity,
                price,
                category,
                output,
            } => {
                let changes = ItemChanges {
                    name,
                    sku,
                    quantity,
                    price,
                    category,
                };
                cmd_edit(gateway, id, changes, output).await
            }

            Commands::Rm { ids, output } => cmd_rm(gateway, &ids, output).await,

            Commands::Shell => cmd_shell(gateway, config).await,

            Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
        }
    }
}

/// Generic validation helper for parsing values with a standard error message format.
fn parse_with_validation<T, F>(
    s: &str,
    parser: F,
    field_name: &str,
    valid_values: &[&str],
) -> std::result::Result<T, String>
where
    F: FnOnce(&str) -> std::result::Result<T, String>,
{
    parser(s).map_err(|_| {
        format!(
            "Invalid {}. Must be one of: {}",
            field_name,
            valid_values.join(", ")
        )
    })
}

fn parse_sort_field(s: &str) -> std::result::Result<SortField, String> {
    parse_with_validation(
        s,
        |v| SortField::from_str(v).map_err(|_| String::new()),
        "sort field",
        SortField::ALL_STRINGS,
    )
}

fn parse_sort_order(s: &str) -> std::result::Result<SortOrder, String> {
    parse_with_validation(
        s,
        |v| SortOrder::from_str(v).map_err(|_| String::new()),
        "sort order",
        SortOrder::ALL_STRINGS,
    )
}

fn parse_config_key(s: &str) -> std::result::Result<String, String> {
    parse_with_validation(
        s,
        |v| {
            CONFIG_KEYS
                .contains(&v)
                .then(|| v.to_string())
                .ok_or_else(String::new)
        },
        "config key",
        CONFIG_KEYS,
    )
}

fn parse_item_id(s: &str) -> std::result::Result<ItemId, String> {
    let id = ItemId::from_str(s).map_err(|e| e.to_string())?;
    if id.get() <= 0 {
        return Err(format!("Item ID must be positive, got {id}"));
    }
    Ok(id)
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "inventory", &mut io::stdout());
}
