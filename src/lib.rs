pub mod config;
pub mod db;
pub mod dispatcher;
pub mod error;
pub mod models;
pub mod modes;
pub mod poller;
pub mod quiz;
pub mod replies;
pub mod retry;
pub mod router;
pub mod server;
pub mod store;
pub mod telegram;
pub mod translator;
pub mod user_config;

#[cfg(test)]
mod testing;
