//! CSV rendering of diff records.

use std::io::Write;

use crate::core::types::{HgncId, PanelId};

use super::DiffRecord;

/// A key that can be spread over named report columns
pub trait DiffKey {
    fn columns() -> &'static [&'static str];
    fn values(&self) -> Vec<String>;
}

impl DiffKey for PanelId {
    fn columns() -> &'static [&'static str] {
        &["panel_id"]
    }

    fn values(&self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl DiffKey for HgncId {
    fn columns() -> &'static [&'static str] {
        &["hgnc_id"]
    }

    fn values(&self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl DiffKey for (PanelId, HgncId) {
    fn columns() -> &'static [&'static str] {
        &["panel_id", "hgnc_id"]
    }

    fn values(&self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string()]
    }
}

/// Write records as CSV: key columns, then `field, left, right, category`
///
/// # Errors
///
/// Returns `csv::Error` if writing fails.
pub fn write_csv<K: DiffKey, W: Write>(records: &[DiffRecord<K>], writer: W) -> Result<(), csv::Error> {
    write_delimited(records, writer, b',')
}

/// Same as [`write_csv`] with an arbitrary delimiter
///
/// # Errors
///
/// Returns `csv::Error` if writing fails.
pub fn write_delimited<K: DiffKey, W: Write>(
    records: &[DiffRecord<K>],
    writer: W,
    delimiter: u8,
) -> Result<(), csv::Error> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    let mut header: Vec<&str> = K::columns().to_vec();
    header.extend(["field", "left", "right", "category"]);
    out.write_record(&header)?;

    for record in records {
        let mut line = record.key.values();
        line.push(record.field.unwrap_or_default().to_string());
        line.push(record.left_value.as_ref().map(ToString::to_string).unwrap_or_default());
        line.push(record.right_value.as_ref().map(ToString::to_string).unwrap_or_default());
        line.push(record.category.to_string());
        out.write_record(&line)?;
    }
    out.flush()?;
    Ok(())
}
