// File I/O operations

pub mod carriers;
pub mod csv;
pub mod error;
pub mod json;
pub mod manifest;
pub mod xlsx;

pub use carriers::{load_carriers, load_carriers_if_exists, save_carriers_json};
pub use error::IoError;
pub use manifest::{load_manifest, LoadOptions, ManifestFormat};
