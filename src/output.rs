use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ClearResult, ProgressEvent, ProgressSink, SearchOutcome};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_search(result: &SearchOutcome) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_clear(result: &ClearResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

pub struct AlertOutput;

impl ProgressSink for AlertOutput {
    fn event(&self, event: ProgressEvent) {
        if let Some(message) = event.message.strip_prefix("alert: ") {
            eprintln!("\x1b[31m! {message}\x1b[0m");
        }
    }
}
