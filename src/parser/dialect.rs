//! Tabular dialect and record model
//!
//! Reads and writes comma-separated records through the `csv` crate.
//! The default dialect matches the common CSV convention: `,` delimiter,
//! `"` quoting with doubled quotes as escapes, CRLF record terminators,
//! no header row, rows of differing length allowed.

use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::HandlerError;

/// Delimiter and quoting rules for tabular files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: u8,
    pub quote: u8,
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect {
            delimiter: b',',
            quote: b'"',
        }
    }
}

impl Dialect {
    fn reader<R: Read>(self, source: R) -> csv::Reader<R> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .quote(self.quote)
            .double_quote(true)
            .from_reader(source)
    }

    fn writer<W: Write>(self, sink: W) -> csv::Writer<W> {
        csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .quote(self.quote)
            .double_quote(true)
            .terminator(csv::Terminator::CRLF)
            .from_writer(sink)
    }

    /// Read every record from `source`, in order
    pub fn read_from<R: Read>(self, source: R) -> Result<Vec<csv::StringRecord>, csv::Error> {
        self.reader(source).records().collect()
    }

    /// Write `records` to `sink`, in order, and flush
    pub fn write_to<W: Write>(self, sink: W, records: &[Record]) -> Result<(), csv::Error> {
        let mut writer = self.writer(sink);
        for record in records {
            writer.write_record(record.fields())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Open `path` and read all of its records
    pub fn read_path(self, path: &Path) -> Result<Vec<csv::StringRecord>, HandlerError> {
        let file = File::open(path).map_err(|e| HandlerError::io(path, e))?;
        self.read_from(file).map_err(|e| HandlerError::csv(path, e))
    }

    /// Create (or truncate) `path` and write `records` into it
    pub fn write_path(self, path: &Path, records: &[Record]) -> Result<(), HandlerError> {
        let file = File::create(path).map_err(|e| HandlerError::io(path, e))?;
        self.write_to(file, records)
            .map_err(|e| HandlerError::csv(path, e))
    }
}

/// One row of string fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record(Vec<String>);

impl Record {
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&csv::StringRecord> for Record {
    fn from(raw: &csv::StringRecord) -> Self {
        Record(raw.iter().map(str::to_string).collect())
    }
}

impl<S: Into<String>> FromIterator<S> for Record {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Record(iter.into_iter().map(Into::into).collect())
    }
}

/// Renders as `[a, b, c]`
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Ordered records of one tabular file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularDataset {
    records: Vec<Record>,
}

impl TabularDataset {
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<Record> for TabularDataset {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        TabularDataset {
            records: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(fields: &[&str]) -> Record {
        fields.iter().copied().collect()
    }

    #[test]
    fn test_read_default_dialect() {
        let raw = Dialect::default()
            .read_from("a,b,c\n1,2,3\n".as_bytes())
            .unwrap();
        let records: Vec<Record> = raw.iter().map(Record::from).collect();
        assert_eq!(records, vec![rec(&["a", "b", "c"]), rec(&["1", "2", "3"])]);
    }

    #[test]
    fn test_header_row_is_data() {
        let raw = Dialect::default()
            .read_from("name,age\nann,3\n".as_bytes())
            .unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(&raw[0][0], "name");
    }

    #[test]
    fn test_ragged_rows_accepted() {
        let raw = Dialect::default()
            .read_from("a,b,c\n1\n".as_bytes())
            .unwrap();
        assert_eq!(raw[0].len(), 3);
        assert_eq!(raw[1].len(), 1);
    }

    #[test]
    fn test_quoted_fields() {
        let raw = Dialect::default()
            .read_from("\"x,y\",\"say \"\"hi\"\"\"\n".as_bytes())
            .unwrap();
        assert_eq!(Record::from(&raw[0]), rec(&["x,y", "say \"hi\""]));
    }

    #[test]
    fn test_write_uses_crlf_and_quotes_when_needed() {
        let mut out = Vec::new();
        Dialect::default()
            .write_to(&mut out, &[rec(&["a", "b,c"]), rec(&["1", "2"])])
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a,\"b,c\"\r\n1,2\r\n");
    }

    #[test]
    fn test_custom_delimiter_round_trip() {
        let dialect = Dialect {
            delimiter: b';',
            ..Dialect::default()
        };
        let records = vec![rec(&["a;1", "b", ""]), rec(&["multi\nline", "\"q\""])];
        let mut out = Vec::new();
        dialect.write_to(&mut out, &records).unwrap();

        let back: Vec<Record> = dialect
            .read_from(out.as_slice())
            .unwrap()
            .iter()
            .map(Record::from)
            .collect();
        assert_eq!(back, records);
    }

    #[test]
    fn test_record_display() {
        assert_eq!(rec(&["a", "b", "c"]).to_string(), "[a, b, c]");
        assert_eq!(Record::default().to_string(), "[]");
    }
}
