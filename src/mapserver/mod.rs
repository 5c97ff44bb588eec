pub mod rest;
pub mod wms;

pub use rest::{LayerInfo, MapServerRest};
pub use wms::{WmsCapabilities, WmsClient, WmsLayer};
