//! The option table and the engine that runs it.
//!
//! Every command-line flag is an [`OptionDescriptor`]: its short and long
//! spelling, an optional argument name, a help line and the [`Handler`]
//! that runs when the flag is seen. Handlers run in the order the flags
//! appear on the command line, not in table order.

mod dispatch;
mod table;

pub use dispatch::{is_flag, report_failure, OptionTable};
pub use table::default_table;

use crate::error::CliError;
use crate::session::Session;

/// Whether the pipeline goes on after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Stop successfully without running the remaining flags.
    Exit,
}

/// Code run for one occurrence of a flag.
pub trait Handler {
    /// `arg` is `Some` exactly when the option takes an argument.
    fn run(&self, session: &mut Session, arg: Option<&str>) -> Result<Flow, CliError>;
}

impl<F> Handler for F
where
    F: Fn(&mut Session, Option<&str>) -> Result<Flow, CliError>,
{
    fn run(&self, session: &mut Session, arg: Option<&str>) -> Result<Flow, CliError> {
        self(session, arg)
    }
}

/// One row of the option table.
pub struct OptionDescriptor {
    pub short: Option<char>,
    pub long: &'static str,
    /// Placeholder name of the argument; `None` for switches
    pub arg: Option<&'static str>,
    pub description: &'static str,
    /// Must appear on every command line
    pub required: bool,
    pub handler: Box<dyn Handler>,
}

impl OptionDescriptor {
    /// A flag without an argument.
    pub fn switch(
        short: Option<char>,
        long: &'static str,
        description: &'static str,
        handler: impl Handler + 'static,
    ) -> Self {
        Self {
            short,
            long,
            arg: None,
            description,
            required: false,
            handler: Box::new(handler),
        }
    }

    /// A flag followed by exactly one argument.
    pub fn with_arg(
        short: Option<char>,
        long: &'static str,
        arg: &'static str,
        description: &'static str,
        handler: impl Handler + 'static,
    ) -> Self {
        Self {
            short,
            long,
            arg: Some(arg),
            description,
            required: false,
            handler: Box::new(handler),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn takes_arg(&self) -> bool {
        self.arg.is_some()
    }

    /// Whether `token` (`-x` or `--name`) spells this option.
    pub fn matches(&self, token: &str) -> bool {
        if let Some(long) = token.strip_prefix("--") {
            return long == self.long;
        }
        match (token.strip_prefix('-'), self.short) {
            (Some(rest), Some(short)) => {
                let mut chars = rest.chars();
                chars.next() == Some(short) && chars.next().is_none()
            }
            _ => false,
        }
    }

    /// Whether `name` is this option's short or long name.
    pub fn is_named(&self, name: &str) -> bool {
        if name == self.long {
            return true;
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => self.short == Some(c),
            _ => false,
        }
    }
}

impl std::fmt::Debug for OptionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionDescriptor")
            .field("short", &self.short)
            .field("long", &self.long)
            .field("arg", &self.arg)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}
