//! MongoDB connection management

mod config;
mod connector;
mod convert;
mod health;

pub use config::MongoConfig;
pub use connector::{connect_from_config, connect_from_config_with_retry, is_duplicate_key_error};
pub use convert::{from_bson_datetime, to_bson_datetime};
pub use health::check_health;

pub use mongodb::{Client, Collection, Database};
