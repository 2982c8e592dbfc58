//! Best-effort notifications after each successful mutation.
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::net::text;
use crate::net::{Marking, NetDefinition};

/// State handed to observers, borrowed from the simulation.
#[derive(Debug, Clone, Copy)]
pub struct StateEvent<'a> {
    pub label: &'a str,
    pub net: &'a NetDefinition,
    pub marking: &'a Marking,
}

impl StateEvent<'_> {
    /// The state in the text format.
    pub fn render(&self) -> String {
        text::format(self.net, self.marking)
    }
}

/// Receives a snapshot after every step and every wholesale replacement.
///
/// Errors are logged by the caller and otherwise ignored; they never fail
/// the operation that triggered the notification.
pub trait StateObserver {
    fn notify(&mut self, event: &StateEvent<'_>) -> io::Result<()>;
}

impl<F> StateObserver for F
where
    F: FnMut(&StateEvent<'_>) -> io::Result<()>,
{
    fn notify(&mut self, event: &StateEvent<'_>) -> io::Result<()> {
        self(event)
    }
}

/// Forwards snapshots to the `log` facade.
#[derive(Debug, Clone, Copy)]
pub struct LogObserver {
    level: log::Level,
}

impl LogObserver {
    pub fn new(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new(log::Level::Info)
    }
}

impl StateObserver for LogObserver {
    fn notify(&mut self, event: &StateEvent<'_>) -> io::Result<()> {
        log::log!(self.level, "{}\n{}", event.label, event.render());
        Ok(())
    }
}

/// Appends labelled snapshots to a file. The file is truncated when the
/// observer is created.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    file: File,
}

impl FileObserver {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::create(&path)?;
        writeln!(file, "petri-sim session started")?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateObserver for FileObserver {
    fn notify(&mut self, event: &StateEvent<'_>) -> io::Result<()> {
        writeln!(self.file, "{}", event.label)?;
        write!(self.file, "{}", event.render())?;
        writeln!(self.file)?;
        self.file.flush()
    }
}
