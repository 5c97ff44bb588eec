//! End-to-end verification harness for a geospatial portal's layer upload
//! workflow.
//!
//! The portal and its map server are black boxes reached over HTTP. The
//! harness logs in, drives the multi-step upload wizard (save, time, srs,
//! csv, final), polls import progress, and then verifies the uploaded layer
//! from every angle the deployment exposes: the portal's layer page, the
//! map server's REST catalog and WMS capabilities document, and the
//! portal's upload bookkeeping in its relational store.

pub mod config;
pub mod db;
pub mod error;
pub mod fixtures;
pub mod mapserver;
pub mod portal;
pub mod verify;

pub use self::config::Config;
pub use error::{HarnessError, HarnessResult};
pub use verify::LayerVerifier;
