//! Handlers behind the option table.
//!
//! - [`setup`] - flags that only change session settings
//! - [`info`] - catalog, port and version output that needs no camera
//! - [`files`] - listing, fetching, deleting and uploading remote files
//! - [`capture`] - captures and the driver's text reports

pub mod capture;
pub mod files;
pub mod info;
pub mod setup;

use crate::error::CliError;

/// The argument of an argument-taking flag.
///
/// The dispatch engine always supplies one after verification; this only
/// fails when a handler is invoked directly.
fn required<'a>(arg: Option<&'a str>, flag: &str) -> Result<&'a str, CliError> {
    arg.ok_or_else(|| CliError::Usage(format!("Option '--{}' requires an argument", flag)))
}
