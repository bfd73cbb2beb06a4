pub mod accounts;
pub mod app_config;
pub mod ledger_file;

pub use accounts::{Account, AccountError, AccountRole, AccountStore};
pub use app_config::Config;
pub use ledger_file::JsonlLedgerSink;
