//! CSV fixture builder.
//!
//! Builds small point-data CSV files in a temp location. The temp file is
//! removed when the fixture drops, so tests never leave uploads behind.

use std::path::Path;
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::error::HarnessResult;

pub struct CsvFixture {
    file: NamedTempFile,
    name: String,
}

impl CsvFixture {
    /// Write a CSV with the given header and rows to a fresh temp file. The
    /// file gets a unique stem so repeated runs never collide on layer names.
    pub fn build(fields: &[&str], rows: &[&[&str]]) -> HarnessResult<Self> {
        let name = format!("probe_{}", Uuid::new_v4().simple());
        let mut file = tempfile::Builder::new()
            .prefix(&format!("{}_", name))
            .suffix(".csv")
            .tempfile()?;

        {
            let mut writer = csv::Writer::from_writer(file.as_file_mut());
            writer.write_record(fields)?;
            for row in rows {
                writer.write_record(*row)?;
            }
            writer.flush()?;
        }

        Ok(Self { file, name })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Stem the portal will derive the layer name from.
    pub fn stem(&self) -> &str {
        self.file
            .path()
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }
}
