mod config;
mod migrations;
mod rows;
mod store;

pub use config::PostgresConfig;
pub use migrations::run_migrations;
pub use store::PostgresStore;
