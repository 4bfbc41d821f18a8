//! `watch`: follow the displayed projection live until Ctrl-C.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Local;
use tokio::sync::watch;

use sweetsync_core::{ChannelState, InventorySession, Item, ItemFilter, ItemId, SearchFilter};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output::{self, Tone, paint};

use super::items::render_items;
use super::util;

fn watch_filter(args: WatchArgs) -> ItemFilter {
    let search = SearchFilter::from(args.search);
    match (args.in_stock, search.is_empty()) {
        (false, true) => ItemFilter::All,
        (true, true) => ItemFilter::InStock,
        (false, false) => ItemFilter::Search(search),
        (true, false) => {
            ItemFilter::Custom(Box::new(move |item| item.in_stock() && search.matches(item)))
        }
    }
}

pub async fn handle(
    session: &InventorySession,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let full = args.full;
    session.set_filter(watch_filter(args));

    let color = output::should_color(global.color);
    let mut displayed = session.subscribe_displayed();
    let mut state = session
        .channel_state()
        .ok_or_else(|| CliError::Internal("push channel was not started".into()))?;

    let mut previous = Arc::clone(displayed.current());
    output::print_output(&render_items(global, &previous)?, global.quiet);

    let spinner = waiting_spinner(&state, global.quiet);
    report_state(*state.borrow_and_update(), color, global.quiet);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            biased;
            _ = &mut ctrl_c => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                if current.is_open() {
                    spinner.finish_and_clear();
                }
                report_state(current, color, global.quiet);
            }
            snap = displayed.changed() => {
                let Some(snap) = snap else { break };
                if full || !human_format(global.output) {
                    output::print_output(&render_items(global, &snap)?, global.quiet);
                } else {
                    for line in describe_changes(&previous, &snap) {
                        output::print_output(&format!("{} {line}", timestamp(color)), global.quiet);
                    }
                }
                previous = snap;
            }
        }
    }

    spinner.finish_and_clear();
    Ok(())
}

fn human_format(format: OutputFormat) -> bool {
    matches!(format, OutputFormat::Table | OutputFormat::Plain)
}

fn waiting_spinner(state: &watch::Receiver<ChannelState>, quiet: bool) -> indicatif::ProgressBar {
    if state.borrow().is_open() {
        return indicatif::ProgressBar::hidden();
    }
    util::spinner("waiting for live updates", quiet)
}

fn report_state(state: ChannelState, color: bool, quiet: bool) {
    if quiet {
        return;
    }
    let label = match state {
        ChannelState::Connecting => paint("connecting", Tone::Muted, color),
        ChannelState::Open => paint("live", Tone::Good, color),
        ChannelState::Closed {
            retry_pending: true,
        } => paint("disconnected, retrying", Tone::Warn, color),
        ChannelState::Closed {
            retry_pending: false,
        } => paint("closed", Tone::Bad, color),
    };
    eprintln!("{} push channel {label}", timestamp(color));
}

fn timestamp(color: bool) -> String {
    paint(&Local::now().format("%H:%M:%S").to_string(), Tone::Muted, color)
}

/// One line per item that appeared, disappeared, or changed between two
/// projections.
fn describe_changes(before: &[Arc<Item>], after: &[Arc<Item>]) -> Vec<String> {
    let old: BTreeMap<&ItemId, &Item> = before.iter().map(|i| (&i.id, i.as_ref())).collect();
    let new: BTreeMap<&ItemId, &Item> = after.iter().map(|i| (&i.id, i.as_ref())).collect();
    let mut lines = Vec::new();

    for (id, item) in &new {
        match old.get(id) {
            None => lines.push(format!(
                "+ {} [{id}] {} at {:.2}, qty {}",
                item.name, item.category, item.price, item.quantity
            )),
            Some(prev) if prev != item => lines.push(format!("~ {} [{id}] {}", item.name, field_diff(prev, item))),
            Some(_) => {}
        }
    }
    for (id, item) in &old {
        if !new.contains_key(id) {
            lines.push(format!("- {} [{id}]", item.name));
        }
    }
    lines
}

fn field_diff(prev: &Item, next: &Item) -> String {
    let mut parts = Vec::new();
    if prev.name != next.name {
        parts.push(format!("name {} → {}", prev.name, next.name));
    }
    if prev.category != next.category {
        parts.push(format!("category {} → {}", prev.category, next.category));
    }
    if (prev.price - next.price).abs() > f64::EPSILON {
        parts.push(format!("price {:.2} → {:.2}", prev.price, next.price));
    }
    if prev.quantity != next.quantity {
        parts.push(format!("qty {} → {}", prev.quantity, next.quantity));
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SearchArgs;

    fn item(id: i64, name: &str, quantity: u32) -> Arc<Item> {
        Arc::new(Item {
            id: ItemId::Numeric(id),
            name: name.into(),
            category: "Candy".into(),
            price: 2.5,
            quantity,
        })
    }

    #[test]
    fn changes_cover_add_update_remove() {
        let before = vec![item(1, "Fudge", 5), item(2, "Toffee", 1)];
        let after = vec![item(1, "Fudge", 4), item(3, "Nougat", 9)];

        let lines = describe_changes(&before, &after);

        assert_eq!(
            lines,
            vec![
                "~ Fudge [1] qty 5 → 4".to_string(),
                "+ Nougat [3] Candy at 2.50, qty 9".to_string(),
                "- Toffee [2]".to_string(),
            ]
        );
    }

    #[test]
    fn identical_snapshots_produce_nothing() {
        let snap = vec![item(1, "Fudge", 5)];
        assert!(describe_changes(&snap, &snap).is_empty());
    }

    #[test]
    fn in_stock_and_search_combine() {
        let filter = watch_filter(WatchArgs {
            search: SearchArgs {
                name: Some("fud".into()),
                ..SearchArgs::default()
            },
            in_stock: true,
            full: false,
        });

        assert!(filter.matches(&item(1, "Fudge", 1)));
        assert!(!filter.matches(&item(1, "Fudge", 0)));
        assert!(!filter.matches(&item(2, "Toffee", 3)));
    }
}
