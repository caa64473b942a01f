//! Configuration and the query-intent gateway.

pub mod config;
pub mod error;
pub mod gateway;

pub use config::Config;
pub use error::GatewayError;
pub use gateway::{GatewayReply, GatewayStats, QueryAnswer, QueryGateway, QueryOptions};
