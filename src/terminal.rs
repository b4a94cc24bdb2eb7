//! Terminal I/O for command output and interactive prompts.
//!
//! Handlers never write to `std::io::stdout` directly; they go through a
//! [`Terminal`] so tests can capture output and script prompt answers.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};

/// Output stream plus the input stream prompts read from.
pub struct Terminal {
    out: Box<dyn Write>,
    input: Box<dyn BufRead>,
}

impl Terminal {
    /// Terminal bound to the process's standard output and input.
    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::BufReader::new(io::stdin())))
    }

    pub fn new(out: Box<dyn Write>, input: Box<dyn BufRead>) -> Self {
        Self { out, input }
    }

    /// Output stream for command results.
    pub fn out(&mut self) -> &mut dyn Write {
        self.out.as_mut()
    }

    /// Ask a yes/no question until the answer starts with `y` or `n`.
    ///
    /// End of input counts as "no".
    pub fn ask_yes_no(&mut self, question: &str) -> io::Result<bool> {
        loop {
            match self.read_line(question)? {
                None => return Ok(false),
                Some(answer) => match answer.chars().next() {
                    Some('y') | Some('Y') => return Ok(true),
                    Some('n') | Some('N') => return Ok(false),
                    _ => continue,
                },
            }
        }
    }

    /// Print `prompt` and read one line without its trailing newline.
    ///
    /// Returns `None` at end of input.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.out, "{}", prompt)?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']);
        Ok(Some(trimmed.to_string()))
    }
}

/// Cloneable in-memory writer, used by tests to capture terminal and
/// diagnostic output.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes()).into_owned()
    }

    /// Raw copy of everything written so far.
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.lock().map(|b| b.clone()).unwrap_or_default()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self
            .bytes
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "buffer poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
