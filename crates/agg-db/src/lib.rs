pub mod dedup_repo;
pub mod schema;

pub use crate::dedup_repo::SqliteDedupStore;
pub use crate::schema::Durability;
