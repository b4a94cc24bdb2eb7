//! camctl library crate.
//!
//! The binary is a thin shell around these modules; they are public so
//! integration tests can drive the whole option pipeline against the
//! in-memory driver.

pub mod actions;
pub mod config;
pub mod context;
pub mod device;
pub mod error;
pub mod foreach;
pub mod interrupt;
pub mod options;
pub mod output;
pub mod range;
pub mod session;
pub mod settings;
pub mod target;
pub mod terminal;

pub use error::CliError;
pub use options::{default_table, Flow};
pub use session::{Session, SessionState};
