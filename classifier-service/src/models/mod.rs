pub mod classification;
pub mod labels;

pub use classification::{ClassificationResponse, ImageUpload};
pub use labels::{LabelSet, DRESS_LABELS};
