// Translation and dispatch engine

pub mod dispatcher;
pub mod forwarder;
pub mod remapper;
pub mod report_expander;
