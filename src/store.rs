// Record Store - append-only CSV file of registrations
//
// The file is the single source of truth. Rows are appended, never rewritten,
// and lookups are a linear scan in file order.
//
// Not safe for concurrent writers from several processes: there is no file
// lock, so two processes appending at once can allocate the same identifier.

use crate::error::{Error, Result};
use crate::record::{Registration, FIELD_NAMES};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    /// Handle to the store at `path`. Nothing is read or created until used.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn reader(&self) -> Result<Option<csv::Reader<File>>> {
        match File::open(&self.path) {
            Ok(file) => Ok(Some(csv::Reader::from_reader(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Append one record, writing the header first when the file is new
    ///
    /// Header and row are encoded up front and handed to a single write, so a
    /// failure while encoding leaves the file untouched.
    pub fn append(&self, record: &Registration) -> Result<()> {
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)?;

        let len = file.metadata()?.len();
        let with_header = len == 0;
        let missing_newline = len > 0 && !ends_with_newline(&mut file)?;

        let mut buf = Vec::new();
        if missing_newline {
            buf.extend_from_slice(b"\r\n");
        }
        buf.extend(encode_row(record, with_header)?);

        file.write_all(&buf)?;
        file.sync_data()?;

        info!(id = %record.id, path = %self.path.display(), "appended registration");
        Ok(())
    }

    /// First record whose identifier or mobile number equals `key`
    pub fn find(&self, key: &str) -> Result<Option<Registration>> {
        let Some(mut rdr) = self.reader()? else {
            debug!(key, "store absent, nothing to find");
            return Ok(None);
        };

        for result in rdr.deserialize() {
            let record: Registration = result?;
            if record.matches_key(key) {
                debug!(key, id = %record.id, "found registration");
                return Ok(Some(record));
            }
        }

        debug!(key, "no registration matched");
        Ok(None)
    }

    /// Every record in file order
    pub fn all(&self) -> Result<Vec<Registration>> {
        let Some(mut rdr) = self.reader()? else {
            return Ok(Vec::new());
        };

        let mut records: Vec<Registration> = Vec::new();
        for result in rdr.deserialize() {
            records.push(result?);
        }
        Ok(records)
    }

    pub fn count(&self) -> Result<usize> {
        let Some(mut rdr) = self.reader()? else {
            return Ok(0);
        };

        let mut count = 0;
        for result in rdr.records() {
            result?;
            count += 1;
        }
        Ok(count)
    }

    /// Identifier column of the last row, by file position
    ///
    /// Rows may be ragged and only the first column is looked at, so a row
    /// that would not deserialize as a full record still yields its identifier.
    pub fn last_identifier(&self) -> Result<Option<String>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(file);

        let mut last = None;
        for result in rdr.records() {
            last = Some(result?);
        }

        match last {
            None => Ok(None),
            Some(row) => row
                .get(0)
                .map(|id| Some(id.to_string()))
                .ok_or_else(|| Error::format("")),
        }
    }
}

fn ends_with_newline(file: &mut File) -> Result<bool> {
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn encode_row(record: &Registration, with_header: bool) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    if with_header {
        writer.write_record(FIELD_NAMES)?;
    }
    writer.serialize(record)?;

    writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}
