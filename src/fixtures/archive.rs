//! Zip packaging for upload fixtures.
//!
//! The wizard accepts a zipped shapefile as a single upload. These helpers
//! pack a shapefile family from the sample-data tree into a temp archive,
//! or build one fully in memory for stub-backed tests.

use bytes::Bytes;
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::{HarnessError, HarnessResult};
use crate::fixtures::dataset;

/// Zip every file sharing the given stem in `dir` into a temp archive named
/// after the stem, so the portal derives the same layer name from it.
pub fn zip_family(dir: &Path, stem: &str) -> HarnessResult<NamedTempFile> {
    let main = dir.join(format!("{}.shp", stem));
    let mut members = dataset::shapefile_family(&main)?;
    if main.is_file() {
        members.insert(0, main);
    }
    if members.is_empty() {
        return Err(HarnessError::Upload(format!(
            "no files matching stem {} in {}",
            stem,
            dir.display()
        )));
    }

    let mut file = tempfile::Builder::new()
        .prefix(&format!("{}_", stem))
        .suffix(".zip")
        .tempfile()?;

    {
        let mut writer = ZipWriter::new(file.as_file_mut());
        let options = SimpleFileOptions::default();
        for member in &members {
            let name = member
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| {
                    HarnessError::Upload(format!("bad archive member {}", member.display()))
                })?;
            writer.start_file(name, options)?;
            writer.write_all(&std::fs::read(member)?)?;
        }
        writer.finish()?;
    }

    Ok(file)
}

/// Build a zip archive in memory from named entries.
pub fn zip_in_memory(entries: &[(&str, &[u8])]) -> HarnessResult<Bytes> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, contents) in entries {
        writer.start_file(*name, options)?;
        writer.write_all(contents)?;
    }
    let cursor = writer.finish()?;
    Ok(Bytes::from(cursor.into_inner()))
}
