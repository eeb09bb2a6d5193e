// FICHIER : sqldoc/src/json_db/mod.rs

pub mod collections;
pub mod connection;
pub mod identity;
pub mod query;
pub mod records;
pub mod storage;
pub mod values;

pub use connection::DbConnection;
