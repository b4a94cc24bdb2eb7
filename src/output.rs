//! Where fetched files end up on the local disk.
//!
//! Names come from the remote file or from the `--filename` template with
//! its running counter, prefixed by the kind of data fetched. Existing
//! files trigger an interactive prompt unless quiet mode is on.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::device::{CameraFile, FileKind};
use crate::error::CliError;
use crate::session::SessionState;
use crate::terminal::Terminal;

/// Widest padding accepted in a `%Nd` placeholder.
const MAX_COUNTER_WIDTH: usize = 32;

/// Local destination of one saved file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    /// Directory part including its trailing `/`, or empty for the working directory
    pub folder: String,
    /// Final filename with the kind prefix applied
    pub filename: String,
}

impl OutputTarget {
    pub fn path(&self) -> String {
        format!("{}{}", self.folder, self.filename)
    }
}

/// What happened to one file handed to the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    /// The user declined both overwriting and renaming.
    Skipped,
    /// Written to standard output; carries the byte count.
    Streamed(usize),
}

/// Substitute `n` for the `%d` / `%i` placeholders in `template`.
///
/// Placeholders take an optional zero flag and width (`%03d`); `%%` is a
/// literal percent sign. Anything else after a `%` is copied verbatim.
/// Widths above 32 are clamped.
pub fn format_counter(template: &str, n: u32) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut spec = String::new();
        while let Some(&d) = chars.peek() {
            if d.is_ascii_digit() {
                spec.push(d);
                chars.next();
            } else {
                break;
            }
        }

        match chars.peek() {
            Some('%') if spec.is_empty() => {
                chars.next();
                out.push('%');
            }
            Some('d') | Some('i') => {
                chars.next();
                let zero = spec.starts_with('0');
                // Only digits were collected: an error means empty or overflowing.
                let width = match spec.parse::<usize>() {
                    Ok(width) => width.min(MAX_COUNTER_WIDTH),
                    Err(_) if spec.is_empty() => 0,
                    Err(_) => MAX_COUNTER_WIDTH,
                };
                if zero {
                    out.push_str(&format!("{:0width$}", n, width = width));
                } else {
                    out.push_str(&format!("{:width$}", n, width = width));
                }
            }
            _ => {
                out.push('%');
                out.push_str(&spec);
            }
        }
    }
    out
}

/// Compute the destination for a fetched file.
///
/// With a filename override the session counter is consumed, so every
/// call yields the next number.
pub fn resolve_target(state: &mut SessionState, remote_name: &str, kind: FileKind) -> OutputTarget {
    let (folder, filename) = if state.filename_override {
        let counter = state.counter;
        state.counter += 1;
        match state.filename.rsplit_once('/') {
            Some((dir, template)) => (format!("{}/", dir), format_counter(template, counter)),
            None => (String::new(), format_counter(&state.filename, counter)),
        }
    } else {
        log::debug!("Using filename '{}'...", remote_name);
        (String::new(), remote_name.to_string())
    };

    OutputTarget {
        folder,
        filename: format!("{}{}", kind.prefix(), filename),
    }
}

/// Write `data` to `target`, asking what to do if the file exists.
///
/// In quiet mode existing files are overwritten without asking.
pub fn save_file(
    terminal: &mut Terminal,
    quiet: bool,
    target: &OutputTarget,
    data: &[u8],
) -> Result<SaveOutcome, CliError> {
    let mut path = target.path();

    if !quiet {
        while Path::new(&path).exists() {
            if terminal.ask_yes_no(&format!("File {} exists. Overwrite? [y|n] ", path))? {
                break;
            }
            if !terminal.ask_yes_no("Specify new filename? [y|n] ")? {
                return Ok(SaveOutcome::Skipped);
            }
            match terminal.read_line("Enter new filename: ")? {
                Some(name) if !name.is_empty() => path = name,
                _ => return Ok(SaveOutcome::Skipped),
            }
        }
        writeln!(terminal.out(), "Saving file as {}", path)?;
    }

    std::fs::write(&path, data).map_err(|source| CliError::Save {
        path: path.clone(),
        source,
    })?;
    Ok(SaveOutcome::Saved(PathBuf::from(path)))
}

/// Save a file fetched from the camera, or stream it to stdout when the
/// session asks for that.
pub fn save_remote_file(
    terminal: &mut Terminal,
    state: &mut SessionState,
    file: &CameraFile,
    kind: FileKind,
) -> Result<SaveOutcome, CliError> {
    if state.stdout {
        let out = terminal.out();
        if state.stdout_size {
            writeln!(out, "{}", file.size())?;
        }
        out.write_all(&file.data)?;
        out.flush()?;
        return Ok(SaveOutcome::Streamed(file.size()));
    }

    let target = resolve_target(state, &file.name, kind);
    save_file(terminal, state.quiet, &target, &file.data)
}
