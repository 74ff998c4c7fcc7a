// Library root for the PuppetDB v3 -> v4 translation proxy

pub mod api;
pub mod config;
pub mod core;
pub mod engine;
pub mod proxy;
pub mod schema;
