//! Persistence for accounts, medicines, and redeemed login links.

pub mod memory;
pub mod postgres;
pub mod storage;

pub use memory::InMemoryStorage;
pub use postgres::PgStorage;
pub use storage::{Storage, StoreError};

#[cfg(test)]
pub use storage::MockStorage;
