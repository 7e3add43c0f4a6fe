pub mod beam;
pub mod logits;
pub mod params;

pub use beam::beam_search;
pub use logits::{force_token, suppress_bad_words};
pub use params::GenerateOptions;
