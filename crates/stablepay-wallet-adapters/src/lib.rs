pub mod config;
pub mod custody;
pub mod poller;

pub use config::{ConfigError, CustodyAdapterConfig, CustodyEndpoints, RuntimeProfile};
pub use custody::CustodyServiceAdapter;
pub use poller::{BalancePoller, BalanceUpdate};
