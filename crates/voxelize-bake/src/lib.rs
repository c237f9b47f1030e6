pub mod bake;
pub mod error;
pub mod headless;
pub mod report;

pub use error::BakeError;
