//! Domain models for the inventory API.
//!
//! - [`store`] / [`item`] - persisted resources, their validated write
//!   forms and the raw commands decoded from request bodies
//! - [`session`] - identity data carried in the session

pub mod item;
pub mod session;
pub mod store;

pub use item::{CreateItem, Item, ItemChanges, ItemPatch, NewItem};
pub use session::{CurrentMerchant, keys as session_keys};
pub use store::{CreateStore, NewStore, Store, StoreChanges, StorePatch, StoreView};
