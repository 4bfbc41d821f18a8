// ── Reactive data store ──

mod collection;
mod inventory_store;
mod refresh;

pub use inventory_store::InventoryStore;
