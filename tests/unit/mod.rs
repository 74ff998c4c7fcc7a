#[path = "../common/mod.rs"]
mod common;

mod test_commands;
mod test_translation;
