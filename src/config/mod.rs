//! Configuration module
//!
//! Two layers, leaves first:
//!
//! - **store**: loads the engine property file once and serves keyed
//!   lookups merged with environment variables
//! - **resolver**: applies the three-tier precedence (explicit override >
//!   environment > file) per logical setting and renders the final
//!   connection string

pub mod resolver;
pub mod store;

pub use resolver::{ConfigResolver, Overrides};
pub use store::{ConfigStore, DEFAULT_CONFIG_PATH, ENV_PREFIX};
