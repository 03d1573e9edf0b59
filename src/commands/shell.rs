//! Interactive list session.
//!
//! Each input line becomes one controller intent. A background task prints
//! the list whenever it settles, so rapid query edits coalesce into a single
//! fetch exactly as they would behind a search box.

use owo_colors::OwoColorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{InventoryError, Result};
use crate::query::{SortField, SortOrder};
use crate::remote::InventoryGateway;
use crate::sync::{InventoryController, RenderState};
use crate::types::{InventoryItem, ItemId};

use super::{ItemChanges, controller_for, render_text};

const HELP: &str = "\
Commands:
  search [text]        filter by name or SKU (no text clears)
  category [text]      filter by category (no text clears)
  sort <field>         sort by name, sku, quantity, price or category; repeat to flip
  order <asc|desc>     set the sort direction
  page <n> | next | prev
  size <n>             items per page
  add name=.. sku=.. price=.. category=.. [quantity=..]
  edit <id> field=value ...
  rm <id>
  refresh              fetch now
  help | quit";

#[derive(Debug, Clone, PartialEq)]
enum ShellCommand {
    Search(String),
    Category(String),
    Sort(SortField),
    Order(SortOrder),
    Page(u32),
    NextPage,
    PrevPage,
    Size(u32),
    Add(InventoryItem),
    Edit(ItemId, ItemFields),
    Remove(ItemId),
    Refresh,
    Help,
    Quit,
}

/// `key=value` pairs from an add/edit line
#[derive(Debug, Clone, Default, PartialEq)]
struct ItemFields {
    name: Option<String>,
    sku: Option<String>,
    quantity: Option<u32>,
    price: Option<f64>,
    category: Option<String>,
}

impl From<ItemFields> for ItemChanges {
    fn from(fields: ItemFields) -> Self {
        ItemChanges {
            name: fields.name,
            sku: fields.sku,
            quantity: fields.quantity,
            price: fields.price,
            category: fields.category,
        }
    }
}

fn usage(message: impl Into<String>) -> InventoryError {
    InventoryError::Other(message.into())
}

/// Split `name=Desk Lamp price=9.5` into pairs; values may contain spaces.
fn parse_fields(input: &str) -> Result<ItemFields> {
    const KEYS: &[&str] = &["name", "sku", "quantity", "price", "category"];

    let mut pairs: Vec<(String, String)> = Vec::new();
    for token in input.split_whitespace() {
        match token.split_once('=') {
            Some((key, value)) if KEYS.contains(&key) => {
                pairs.push((key.to_string(), value.to_string()));
            }
            _ => match pairs.last_mut() {
                Some((_, value)) => {
                    value.push(' ');
                    value.push_str(token);
                }
                None => {
                    return Err(usage(format!(
                        "expected field=value, got '{token}' (fields: {})",
                        KEYS.join(", ")
                    )));
                }
            },
        }
    }

    let mut fields = ItemFields::default();
    for (key, value) in pairs {
        match key.as_str() {
            "name" => fields.name = Some(value),
            "sku" => fields.sku = Some(value),
            "category" => fields.category = Some(value),
            "quantity" => {
                fields.quantity = Some(
                    value
                        .parse()
                        .map_err(|_| usage(format!("invalid quantity '{value}'")))?,
                )
            }
            "price" => {
                fields.price = Some(
                    value
                        .parse()
                        .map_err(|_| usage(format!("invalid price '{value}'")))?,
                )
            }
            _ => {}
        }
    }
    Ok(fields)
}

fn parse_number<T: std::str::FromStr>(arg: &str, what: &str) -> Result<T> {
    arg.trim()
        .parse()
        .map_err(|_| usage(format!("{what} must be a number, got '{arg}'")))
}

impl ShellCommand {
    fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let command = match verb.to_lowercase().as_str() {
            "search" | "s" => ShellCommand::Search(rest.to_string()),
            "category" | "c" => ShellCommand::Category(rest.to_string()),
            "sort" => ShellCommand::Sort(rest.parse()?),
            "order" => ShellCommand::Order(rest.parse()?),
            "page" | "p" => {
                let page: u32 = parse_number(rest, "page")?;
                if page == 0 {
                    return Err(usage("pages start at 1"));
                }
                ShellCommand::Page(page - 1)
            }
            "next" | "n" => ShellCommand::NextPage,
            "prev" => ShellCommand::PrevPage,
            "size" => ShellCommand::Size(parse_number(rest, "size")?),
            "add" => {
                let fields = parse_fields(rest)?;
                let (Some(name), Some(sku), Some(price), Some(category)) =
                    (fields.name, fields.sku, fields.price, fields.category)
                else {
                    return Err(usage("add needs name=, sku=, price= and category="));
                };
                ShellCommand::Add(InventoryItem::new(
                    name,
                    sku,
                    fields.quantity.unwrap_or(0),
                    price,
                    category,
                ))
            }
            "edit" => {
                let (id, fields) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                let fields = parse_fields(fields)?;
                if fields == ItemFields::default() {
                    return Err(usage("edit needs at least one field=value"));
                }
                ShellCommand::Edit(id.parse()?, fields)
            }
            "rm" | "delete" => ShellCommand::Remove(rest.parse()?),
            "refresh" | "r" => ShellCommand::Refresh,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            other => return Err(usage(format!("unknown command '{other}', try 'help'"))),
        };
        Ok(Some(command))
    }
}

/// Print the list each time it settles on a new state
fn spawn_renderer<G: InventoryGateway>(controller: &InventoryController<G>) -> JoinHandle<()> {
    let mut render = controller.subscribe();
    tokio::spawn(async move {
        let mut last: Option<RenderState> = None;
        while render.changed().await.is_ok() {
            let state = render.borrow_and_update().clone();
            if state.loading || state.refresh_pending || last.as_ref() == Some(&state) {
                continue;
            }
            println!("{}", render_text(&state));
            last = Some(state);
        }
    })
}

/// Run a mutation in the background so the prompt stays responsive
fn spawn_mutation<G: InventoryGateway>(controller: &InventoryController<G>, command: ShellCommand) {
    let controller = controller.clone();
    tokio::spawn(async move {
        let outcome = match command {
            ShellCommand::Add(item) => controller
                .submit_create(item)
                .await
                .map(|created| format!("Created item {}", display_id(created.id))),
            ShellCommand::Edit(id, fields) => edit_item(&controller, id, fields).await,
            ShellCommand::Remove(id) => controller
                .submit_delete(id)
                .await
                .map(|()| format!("Deleted item {id}")),
            _ => return,
        };
        match outcome {
            Ok(message) => println!("{}", message.green()),
            Err(err) => eprintln!("{}", err.user_message().red()),
        }
    });
}

fn display_id(id: Option<ItemId>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}

async fn edit_item<G: InventoryGateway>(
    controller: &InventoryController<G>,
    id: ItemId,
    fields: ItemFields,
) -> Result<String> {
    let current = controller
        .snapshot()
        .items()
        .iter()
        .find(|item| item.id == Some(id))
        .cloned();
    let mut item = match current {
        Some(item) => item,
        None => controller.gateway().get(id).await?,
    };
    ItemChanges::from(fields).apply(&mut item);
    controller.submit_update(id, item).await?;
    Ok(format!("Saved item {id}"))
}

/// Interactive session against the configured gateway
pub async fn cmd_shell<G: InventoryGateway>(gateway: G, config: &Config) -> Result<()> {
    let controller = controller_for(gateway, config, config.initial_query()?);
    let renderer = spawn_renderer(&controller);

    println!("{}", "Inventory shell - type 'help' for commands".cyan().bold());
    controller.refresh().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match ShellCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("{}", err.to_string().red());
                continue;
            }
        };

        match command {
            ShellCommand::Search(text) => {
                controller.set_search_text(text);
            }
            ShellCommand::Category(text) => {
                controller.set_category(text);
            }
            ShellCommand::Sort(field) => {
                controller.toggle_or_set_sort_order(field);
            }
            ShellCommand::Order(order) => {
                controller.set_sort_order(order);
            }
            ShellCommand::Page(index) => {
                controller.set_page_index(index);
            }
            ShellCommand::NextPage => {
                let index = controller.query().page_index();
                controller.set_page_index(index + 1);
            }
            ShellCommand::PrevPage => {
                let index = controller.query().page_index();
                controller.set_page_index(index.saturating_sub(1));
            }
            ShellCommand::Size(size) => {
                controller.set_page_size(size);
            }
            ShellCommand::Refresh => {
                controller.refresh().await;
            }
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => break,
            mutation => spawn_mutation(&controller, mutation),
        }
    }

    controller.wait_idle().await;
    renderer.abort();
    Ok(())
}
