pub mod admin;
pub mod catalog;
pub mod normalize;

pub use admin::{AdminConsole, UploadLimits};
pub use catalog::Catalog;
