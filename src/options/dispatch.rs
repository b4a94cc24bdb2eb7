//! Verification and execution of an argument vector against a table.

use std::collections::HashSet;
use std::io::Write;

use clap::{Arg, ArgAction, Command};

use super::{Flow, OptionDescriptor};
use crate::error::CliError;
use crate::session::Session;

/// Whether `token` is in flag position: starts with `-` and is not `-` alone.
pub fn is_flag(token: &str) -> bool {
    token.starts_with('-') && token.len() > 1
}

/// Ordered option registry.
#[derive(Debug)]
pub struct OptionTable {
    options: Vec<OptionDescriptor>,
}

impl OptionTable {
    pub fn new(options: Vec<OptionDescriptor>) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &[OptionDescriptor] {
        &self.options
    }

    /// Descriptor spelled by `token`.
    pub fn find(&self, token: &str) -> Option<&OptionDescriptor> {
        self.options.iter().find(|o| o.matches(token))
    }

    /// Check the whole vector before anything runs.
    ///
    /// Every token must be a known flag, every argument-taking flag must be
    /// followed by a non-flag token, and every required option must appear.
    pub fn verify<S: AsRef<str>>(&self, args: &[S]) -> Result<(), CliError> {
        if args.is_empty() {
            return Err(CliError::Usage("No options given".to_string()));
        }

        let mut seen = HashSet::new();
        self.walk(args, |option, _| {
            seen.insert(option.long);
            Ok(())
        })?;

        if let Some(missing) = self
            .options
            .iter()
            .find(|o| o.required && !seen.contains(o.long))
        {
            return Err(CliError::Usage(format!("Option '--{}' is required", missing.long)));
        }
        Ok(())
    }

    /// Whether the option named `name` (short or long name, without dashes)
    /// appears anywhere in `args`.
    ///
    /// Works on unverified input.
    pub fn is_present<S: AsRef<str>>(&self, name: &str, args: &[S]) -> bool {
        match self.options.iter().find(|o| o.is_named(name)) {
            Some(option) => args.iter().any(|a| option.matches(a.as_ref())),
            None => args.iter().any(|a| {
                let a = a.as_ref();
                a.strip_prefix("--") == Some(name) || a.strip_prefix('-') == Some(name)
            }),
        }
    }

    /// Run the handler of every flag in `args`, left to right.
    ///
    /// Stops at the first failing handler or at a handler asking to exit.
    pub fn execute<S: AsRef<str>>(&self, session: &mut Session, args: &[S]) -> Result<Flow, CliError> {
        let mut flow = Flow::Continue;
        self.walk(args, |option, arg| {
            if flow == Flow::Exit {
                return Ok(());
            }
            log::debug!("Running --{}{}", option.long, arg.map(|a| format!(" {}", a)).unwrap_or_default());
            flow = option.handler.run(session, arg)?;
            Ok(())
        })?;
        Ok(flow)
    }

    /// Help text generated from the table, in table order.
    pub fn usage(&self) -> String {
        self.command().render_help().to_string()
    }

    /// The table as a clap command, used for rendering help.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new("camctl")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Command line interface to digital cameras")
            .override_usage("camctl [OPTION...]")
            .disable_help_flag(true)
            .disable_version_flag(true);

        for option in &self.options {
            let mut arg = Arg::new(option.long)
                .long(option.long)
                .help(option.description)
                .required(option.required);
            if let Some(short) = option.short {
                arg = arg.short(short);
            }
            arg = match option.arg {
                Some(name) => arg.value_name(name).action(ArgAction::Set),
                None => arg.action(ArgAction::SetTrue),
            };
            cmd = cmd.arg(arg);
        }
        cmd
    }

    /// Flags spelled more than once in the table.
    pub fn duplicates(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut dupes = Vec::new();
        for option in &self.options {
            let mut spellings = vec![format!("--{}", option.long)];
            if let Some(short) = option.short {
                spellings.push(format!("-{}", short));
            }
            for spelling in spellings {
                if !seen.insert(spelling.clone()) {
                    dupes.push(spelling);
                }
            }
        }
        dupes
    }

    fn walk<S, F>(&self, args: &[S], mut visit: F) -> Result<(), CliError>
    where
        S: AsRef<str>,
        F: FnMut(&OptionDescriptor, Option<&str>) -> Result<(), CliError>,
    {
        let mut i = 0;
        while i < args.len() {
            let token = args[i].as_ref();
            if !is_flag(token) {
                return Err(CliError::Usage(format!("Unexpected argument '{}'", token)));
            }
            let option = self
                .find(token)
                .ok_or_else(|| CliError::Usage(format!("Unknown option '{}'", token)))?;

            let arg = if option.takes_arg() {
                match args.get(i + 1).map(|a| a.as_ref()) {
                    Some(next) if !is_flag(next) => {
                        i += 1;
                        Some(next)
                    }
                    _ => {
                        return Err(CliError::Usage(format!(
                            "Option '{}' requires an argument",
                            token
                        )))
                    }
                }
            } else {
                None
            };

            visit(option, arg)?;
            i += 1;
        }
        Ok(())
    }
}

/// Print the final error of a failed run.
///
/// Cancellation gets a one-line notice on `out`. Anything else is reported
/// on `err` and, unless debugging is already on, followed by the command
/// line to re-run with `--debug`.
pub fn report_failure<S: AsRef<str>>(
    error: &CliError,
    args: &[S],
    debug: bool,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> std::io::Result<()> {
    if error.is_cancelled() {
        writeln!(out, "Operation cancelled.")?;
        return out.flush();
    }

    writeln!(err, "*** Error ('{}') ***       \n", error)?;
    err.flush()?;

    if !debug {
        write!(
            out,
            "For debugging messages, please use the --debug option.\n\
             Debugging messages may help finding a solution to your problem.\n\
             If you report a problem, please include the output of:\n\n"
        )?;
        write!(out, "    env LANG=C camctl --debug")?;
        for arg in args {
            write!(out, " {}", arg.as_ref())?;
        }
        write!(out, "\n\n")?;
    }
    out.flush()
}
