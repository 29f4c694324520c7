pub mod connection;
pub mod entity;
pub mod repository;

pub use connection::{connect_in_memory, establish_connection, StorageConfig};
