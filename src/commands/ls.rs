use crate::cli::OutputOptions;
use crate::config::Config;
use crate::error::{InventoryError, Result};
use crate::query::{SortField, SortOrder};
use crate::remote::InventoryGateway;
use crate::sync::FetchOutcome;

use super::{CommandOutput, controller_for, render_json, render_text};

/// Options for the ls command
#[derive(Debug, Default)]
pub struct ListOptions {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: Option<SortField>,
    pub order: Option<SortOrder>,
    /// Zero-based page
    pub page_index: u32,
    pub page_size: Option<u32>,
    pub output: OutputOptions,
}

/// Fetch and print one page of items
pub async fn cmd_ls<G: InventoryGateway>(
    gateway: G,
    config: &Config,
    opts: ListOptions,
) -> Result<()> {
    let mut query = config.initial_query()?;
    if let Some(size) = opts.page_size {
        query.set_page_size(size);
    }
    if let Some(search) = opts.search {
        query.set_search_text(search);
    }
    if let Some(category) = opts.category {
        query.set_category(category);
    }
    if let Some(field) = opts.sort {
        query.set_sort_field(field);
    }
    if let Some(order) = opts.order {
        query.set_sort_order(order);
    }
    // Every other edit resets the page, so it goes last
    query.set_page_index(opts.page_index);

    let controller = controller_for(gateway, config, query);
    if let FetchOutcome::Failed(message) = controller.refresh().await {
        return Err(InventoryError::Other(message));
    }

    let render = controller.snapshot();
    CommandOutput::new(render_json(&render))
        .with_text(render_text(&render))
        .print(opts.output)
}
