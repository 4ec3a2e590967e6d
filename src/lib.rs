pub mod config;
pub mod errors;
pub mod gateway;
pub mod kanban;
pub mod logging;
pub mod poller;
pub mod store;
pub mod validation;
