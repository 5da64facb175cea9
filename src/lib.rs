pub mod clients;
pub mod configuration;
pub mod domain;
pub mod notification_dispatcher;
pub mod telemetry;
pub mod utils;
