//! Data module - CSV loading, column mapping, and filtering

mod filter;
mod loader;
pub mod schema;

pub use filter::{FilterCriteria, FilterError, RegionFilter};
pub use loader::{load_frame, unique_values, DataLoader, LoaderError};
pub use schema::{DatasetSchema, MeasureMapping};
