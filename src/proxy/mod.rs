// Outbound side: the PuppetDB backend

pub mod client;

pub use client::PuppetDbClient;
