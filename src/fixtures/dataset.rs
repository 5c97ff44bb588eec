//! Sample-data tree helpers.
//!
//! The e2e suite runs against a checkout of the well-known geospatial sample
//! data: `good/vector`, `good/raster` and `good/time` layers that import
//! cleanly, a `bad` tree that must not, and an `arc_sample` directory of
//! ASCII grids with their auxiliary files.

use std::path::{Path, PathBuf};

use crate::error::{HarnessError, HarnessResult};

/// Extensions the importer treats as the primary file of an upload.
pub const MAIN_EXTENSIONS: [&str; 4] = ["tif", "shp", "zip", "asc"];

pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn vector_dir(&self) -> PathBuf {
        self.root.join("good").join("vector")
    }

    pub fn vector(&self, name: &str) -> PathBuf {
        self.vector_dir().join(name)
    }

    pub fn raster(&self, name: &str) -> PathBuf {
        self.root.join("good").join("raster").join(name)
    }

    pub fn time(&self, name: &str) -> PathBuf {
        self.root.join("good").join("time").join(name)
    }

    pub fn bad(&self) -> PathBuf {
        self.root.join("bad")
    }

    pub fn arc_sample(&self) -> PathBuf {
        self.root.join("arc_sample")
    }
}

/// Whether a path is a primary upload file rather than a sidecar.
pub fn is_main_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| MAIN_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// All primary upload files in a directory, sorted for a stable upload order.
pub fn main_files(dir: &Path) -> HarnessResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_main_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Every file sharing a stem with the given one, the file itself excluded.
/// For `roads.shp` this picks up `roads.dbf`, `roads.shx`, `roads.prj` and
/// any other sibling the dataset ships.
pub fn shapefile_family(main: &Path) -> HarnessResult<Vec<PathBuf>> {
    let dir = main
        .parent()
        .ok_or_else(|| HarnessError::Upload(format!("no parent dir for {}", main.display())))?;
    let stem = main
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| HarnessError::Upload(format!("no file stem for {}", main.display())))?;

    let mut family = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path == main || !path.is_file() {
            continue;
        }
        if path.file_stem().and_then(|s| s.to_str()) == Some(stem) {
            family.push(path);
        }
    }
    family.sort();
    Ok(family)
}

/// Multipart field name the wizard expects for a shapefile sidecar.
pub fn sidecar_field(extension: &str) -> Option<&'static str> {
    match extension {
        "dbf" => Some("dbf_file"),
        "shx" => Some("shx_file"),
        "prj" => Some("prj_file"),
        "xml" => Some("xml_file"),
        _ => None,
    }
}
