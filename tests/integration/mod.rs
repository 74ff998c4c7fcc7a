// Integration tests against a mock PuppetDB over HTTP

#[path = "../common/mod.rs"]
mod common;

mod test_client;
