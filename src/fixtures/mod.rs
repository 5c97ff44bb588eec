pub mod archive;
pub mod csv;
pub mod dataset;

pub use archive::{zip_family, zip_in_memory};
pub use dataset::DataDir;
pub use self::csv::CsvFixture;
