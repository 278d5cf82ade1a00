pub mod error;
pub mod gemini;
pub mod mock;
pub mod provider;
pub mod types;

pub use error::InferenceError;
pub use gemini::{GeminiConfig, GeminiProvider};
pub use mock::{MockBehavior, MockProvider};
pub use provider::InferenceProvider;
pub use types::*;
