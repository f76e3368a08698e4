pub mod chat;
pub mod config_cmd;
pub mod panel;
pub mod scrape;
pub mod serve;
