pub mod error;
pub mod hooks;
pub mod memory;
pub mod password;
pub mod record;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use error::AccountError;
pub use record::{LoadedAccount, NewAccount};
pub use repo_types::{Account, Address};
pub use services::AccountModel;
