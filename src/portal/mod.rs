pub mod progress;
pub mod session;
pub mod upload;

pub use progress::{ProgressReport, ProgressState, wait_for_completion};
pub use session::PortalSession;
pub use upload::{TimeConfig, UploadClient, UploadResponse, UploadStep};
