//! Synthetic request data: values, parameters, bodies.

pub mod body;
pub mod params;
pub mod value;

pub use body::synthesize_body;
pub use params::{extract_parameters, ExtractedParams};
pub use value::{SynthConfig, Synthesizer};
