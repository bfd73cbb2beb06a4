use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use pitchside_shared::models::events::{BookingEvent, LedgerSink};

/// Append-only JSON Lines sink for booking events, one event per line.
///
/// Writes happen synchronously inside the recording call, which is why
/// `LedgerSink::record` is a blocking interface. Each line is flushed so a
/// crash loses at most the event being written.
pub struct JsonlLedgerSink {
    file: Mutex<File>,
}

impl JsonlLedgerSink {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        tracing::info!("Ledger file opened at {}", path.as_ref().display());
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl LedgerSink for JsonlLedgerSink {
    fn record(&self, event: &BookingEvent) -> std::io::Result<()> {
        let line = serde_json::to_string(event)?;
        let mut file = self.file.lock().unwrap();
        writeln!(file, "{}", line)?;
        file.flush()
    }
}
