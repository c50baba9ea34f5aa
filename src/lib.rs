pub mod cli;
pub mod config;
pub mod console;
pub mod executor;
pub mod hostlist;
pub mod session;
pub mod utils;

pub use cli::Cli;
pub use config::{Config, RunConfig};
pub use executor::{run_group, ExecutionGroup, RunSummary};
pub use hostlist::HostList;
