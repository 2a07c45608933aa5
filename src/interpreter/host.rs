use std::collections::VecDeque;
use std::fs;
use std::io::{self, BufRead, Write};

use rustc_hash::FxHashMap;

/// The side effects a running program can have.
pub trait Host {
    /// Reads one line, including its terminator. Returns an empty string at
    /// end of input.
    fn read_line(&mut self) -> io::Result<String>;
    fn read_file(&mut self, path: &str) -> io::Result<Vec<u8>>;
    fn write(&mut self, text: &str) -> io::Result<()>;
}

/// Process stdin and stdout plus the real filesystem.
#[derive(Debug, Default)]
pub struct StdHost;

impl Host for StdHost {
    fn read_line(&mut self) -> io::Result<String> {
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line)
    }

    fn read_file(&mut self, path: &str) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&mut self, text: &str) -> io::Result<()> {
        io::stdout().lock().write_all(text.as_bytes())
    }
}

/// Scripted input, in-memory files and captured output.
#[derive(Debug, Default)]
pub struct BufferedHost {
    input: VecDeque<String>,
    files: FxHashMap<String, Vec<u8>>,
    output: String,
}

impl BufferedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits `text` into the lines later returned by `read_line`.
    pub fn with_input(mut self, text: &str) -> Self {
        self.input
            .extend(text.split_inclusive('\n').map(str::to_string));
        self
    }

    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }
}

impl Host for BufferedHost {
    fn read_line(&mut self) -> io::Result<String> {
        Ok(self.input.pop_front().unwrap_or_default())
    }

    fn read_file(&mut self, path: &str) -> io::Result<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{path} does not exist"))
        })
    }

    fn write(&mut self, text: &str) -> io::Result<()> {
        self.output.push_str(text);
        Ok(())
    }
}
