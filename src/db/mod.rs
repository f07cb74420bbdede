/// SQLite-backed host graph.
mod connection;
mod queries;

pub use connection::Database;
