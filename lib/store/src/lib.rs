//! Storage for customers, catalog items and orders.
//!
//! The [`Repository`] trait is the only storage surface the server sees.
//! Two implementations satisfy the same contract:
//! - [`PgStore`]: durable PostgreSQL storage via `sqlx`
//! - [`MemoryStore`]: process-local storage for tests and local development
//!
//! Ids are assigned by the store on create. Every operation is atomic on its
//! own; no multi-entity transactions are exposed.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod repository;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use model::{Item, NewItem, NewOrder, NewUser, Order, User};
pub use postgres::PgStore;
pub use repository::Repository;
