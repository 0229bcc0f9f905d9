pub mod error;
pub mod intent;
pub mod models;

pub use error::{ClassifierError, ResolveError};
pub use intent::{
    all_below_threshold, select_confident_intent, select_top_intent, CONFIDENCE_THRESHOLD,
    NOT_FOUND_REPLY,
};
pub use models::*;
