//! Item command handlers.

use std::fmt::Write as _;
use std::sync::Arc;

use tabled::Tabled;
use tracing::warn;

use sweetsync_core::{
    CreateItemRequest, InventorySession, Item, ItemFilter, ItemId, SearchFilter,
    UpdateItemRequest, validate_restock_quantity,
};

use crate::cli::{GlobalOpts, ItemsArgs, ItemsCommand, SearchArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct ItemRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Qty")]
    quantity: u32,
}

impl From<&Item> for ItemRow {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            category: item.category.clone(),
            price: format!("{:.2}", item.price),
            quantity: item.quantity,
        }
    }
}

fn detail(item: &Item) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ID:        {}", item.id);
    let _ = writeln!(out, "Name:      {}", item.name);
    let _ = writeln!(out, "Category:  {}", item.category);
    let _ = writeln!(out, "Price:     {:.2}", item.price);
    let _ = write!(out, "Quantity:  {}", item.quantity);
    out
}

pub(crate) fn render_items(global: &GlobalOpts, items: &[Arc<Item>]) -> Result<String, CliError> {
    output::render_list(
        global.output,
        items,
        |item| ItemRow::from(item.as_ref()),
        |item| item.id.to_string(),
    )
}

fn print_item(global: &GlobalOpts, item: &Item) -> Result<(), CliError> {
    let out = output::render_single(global.output, item, detail, |i| i.id.to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

impl From<SearchArgs> for SearchFilter {
    fn from(args: SearchArgs) -> Self {
        Self {
            name: args.name,
            category: args.category,
            min_price: args.min_price,
            max_price: args.max_price,
        }
    }
}

/// Local filter for `items list`.
fn list_filter(in_stock: bool, category: Option<String>) -> ItemFilter {
    match (in_stock, category) {
        (false, None) => ItemFilter::All,
        (true, None) => ItemFilter::InStock,
        (false, Some(category)) => ItemFilter::ByCategory(category),
        (true, Some(category)) => {
            ItemFilter::Custom(Box::new(move |item| item.in_stock() && item.category == category))
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &InventorySession,
    args: ItemsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ItemsCommand::List { in_stock, category } => {
            session.set_filter(list_filter(in_stock, category));
            let out = render_items(global, &session.displayed())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ItemsCommand::Search(search) => {
            let found: Vec<Arc<Item>> = session
                .search(SearchFilter::from(search))
                .await?
                .into_iter()
                .map(Arc::new)
                .collect();
            let out = render_items(global, &found)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ItemsCommand::Get { id } => {
            let item = util::find_item(session, &ItemId::from(id))?;
            print_item(global, &item)
        }

        ItemsCommand::Create {
            name,
            category,
            price,
            quantity,
        } => {
            let req = CreateItemRequest {
                name,
                category,
                price,
                quantity,
            };
            req.validate()?;
            let item = session.create_item(req).await?;
            print_item(global, &item)
        }

        ItemsCommand::Update {
            id,
            name,
            category,
            price,
            quantity,
        } => {
            let update = UpdateItemRequest {
                name,
                category,
                price,
                quantity,
            };
            update.validate()?;
            let item = session.update_item(ItemId::from(id), update).await?;
            print_item(global, &item)
        }

        ItemsCommand::Delete { id } => {
            let id = ItemId::from(id);
            let label = session
                .get(&id)
                .map_or_else(|| id.to_string(), |item| format!("{} ({id})", item.name));
            if !util::confirm(&format!("Delete {label}? This cannot be undone."), global.yes)? {
                return Ok(());
            }
            session.delete_item(id).await?;
            if !global.quiet {
                eprintln!("Item deleted");
            }
            Ok(())
        }

        ItemsCommand::Purchase { id } => {
            let id = ItemId::from(id);
            if !session.can_purchase(&id) {
                warn!(%id, "item looks out of stock locally, asking the service anyway");
            }
            let item = session.purchase(id).await?;
            print_item(global, &item)
        }

        ItemsCommand::Restock { id, quantity } => {
            validate_restock_quantity(quantity)?;
            let item = session.restock(ItemId::from(id), quantity).await?;
            print_item(global, &item)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(category: &str, quantity: u32) -> Item {
        Item {
            id: ItemId::Numeric(1),
            name: "Fudge".into(),
            category: category.into(),
            price: 2.5,
            quantity,
        }
    }

    #[test]
    fn list_filter_combines_flags() {
        let filter = list_filter(true, Some("Candy".into()));
        assert!(filter.matches(&item("Candy", 3)));
        assert!(!filter.matches(&item("Candy", 0)));
        assert!(!filter.matches(&item("Drink", 3)));

        assert!(list_filter(false, None).is_all());
    }

    #[test]
    fn detail_view_lists_every_field() {
        let text = detail(&item("Candy", 4));
        assert!(text.contains("Fudge"));
        assert!(text.contains("2.50"));
        assert!(text.ends_with("Quantity:  4"));
    }
}
