//! Account records: schema, normalization, password hashing on write and
//! password verification on read.

pub mod accounts;
pub mod config;
pub mod state;
pub mod telemetry;

pub use accounts::{Account, AccountError, AccountModel, Address, LoadedAccount, NewAccount};
pub use state::AppState;
