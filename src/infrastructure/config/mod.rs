//! Infrastructure configuration modules.

pub mod casino;
pub mod ledger;
pub mod logging;
pub mod settings;
