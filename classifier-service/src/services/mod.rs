pub mod classifier;
pub mod prompt;
pub mod providers;

pub use classifier::{Classifier, ClassifyError};
pub use prompt::build_classification_prompt;
