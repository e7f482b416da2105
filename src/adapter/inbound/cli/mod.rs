//! CLI module graph.

pub mod account;
pub mod command;
pub mod config;
pub mod context;
pub mod ledger;
pub mod output;
pub mod rtp;
pub mod run;
