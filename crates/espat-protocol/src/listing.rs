//! Comma/CRLF listing parser.
//!
//! `AT+CWLIF` answers with one line per station attached to the soft-AP:
//!
//! ```text
//! 192.168.4.2,bc:dd:c2:11:22:33\r\n
//! 192.168.4.3,bc:dd:c2:44:55:66\r\n
//! \r\nOK\r\n
//! ```
//!
//! The parser keeps the first field of each line. It alternates two reads:
//! up to the `,` (the record), then up to the `\r\n` (rest of the line,
//! discarded). The list ends on the first read that does not stop at the
//! `,`, which is normally the closing `OK`.

use crate::builder::AtCommand;
use crate::session::AtSession;
use espat_core::constants::{LINE_ENDING, TAG_FIELD_SEPARATOR};
use espat_core::Result;
use espat_hardware::Transport;
use tracing::{debug, warn};

/// Fixed-capacity, ordered table of short text records.
///
/// Rebuilt from scratch by every listing. Records past the capacity are
/// counted in [`dropped`](ClientTable::dropped) instead of stored. Fields
/// that outgrew the reply buffer lost their leading bytes; they are counted
/// in [`overlong`](ClientTable::overlong) and not stored either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTable {
    records: Vec<String>,
    capacity: usize,
    width: usize,
    dropped: usize,
    overlong: usize,
}

impl ClientTable {
    pub fn new(capacity: usize, width: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
            width,
            dropped: 0,
            overlong: 0,
        }
    }

    /// Store a record, cut to the table's width.
    ///
    /// Returns `false` if the table is full and the record was dropped.
    pub fn push(&mut self, record: &[u8]) -> bool {
        if self.records.len() >= self.capacity {
            self.dropped += 1;
            return false;
        }
        let record = &record[..record.len().min(self.width)];
        self.records.push(String::from_utf8_lossy(record).into_owned());
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.records.get(index).map(String::as_str)
    }

    pub fn records(&self) -> &[String] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(String::as_str)
    }

    /// Records that did not fit.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn is_overflowed(&self) -> bool {
        self.dropped > 0
    }

    /// Count a field whose head was lost to the reply buffer.
    pub fn mark_overlong(&mut self) {
        self.overlong += 1;
    }

    /// Fields skipped because they outgrew the reply buffer.
    pub fn overlong(&self) -> usize {
        self.overlong
    }
}

impl<T: Transport> AtSession<T> {
    /// Send `cmd` and collect the first field of every reply line.
    ///
    /// # Errors
    ///
    /// Returns `AtError::CommandTooLong` or a transport error. Table
    /// overflow is reported through [`ClientTable::dropped`] and fields
    /// longer than the ring through [`ClientTable::overlong`].
    pub fn list_records(&mut self, cmd: &AtCommand) -> Result<ClientTable> {
        let (timeout, capacity, width) = {
            let c = self.config();
            (c.listing_timeout_ms, c.max_clients, c.record_width)
        };
        let mut table = ClientTable::new(capacity, width);

        self.write_command(cmd)?;
        let end = loop {
            let outcome = self.read_until(timeout, Some(TAG_FIELD_SEPARATOR), true)?;
            if !outcome.is_tag() {
                break outcome;
            }

            if self.last_read_overflowed() {
                warn!(
                    "{} field exceeds {} byte buffer, skipping it",
                    cmd.name(),
                    self.buffer().capacity()
                );
                table.mark_overlong();
            } else {
                let field_len = self.buffer().used() - TAG_FIELD_SEPARATOR.len();
                let keep = field_len.min(width);
                let record = self.buffer().peek_many(keep)?;
                if !table.push(&record) {
                    warn!(
                        "{} listing exceeds {} records, dropping {:?}",
                        cmd.name(),
                        capacity,
                        String::from_utf8_lossy(&record)
                    );
                }
            }

            let outcome = self.read_until(timeout, Some(LINE_ENDING), false)?;
            if !outcome.is_tag() {
                break outcome;
            }
        };

        debug!("{} -> {} records ({})", cmd.name(), table.len(), end);
        Ok(table)
    }

    /// Addresses of the stations attached to the soft-AP (`AT+CWLIF`).
    pub fn connected_clients(&mut self) -> Result<ClientTable> {
        self.list_records(&AtCommand::new("AT+CWLIF"))
    }
}
