pub mod generator;
pub mod openai_compatible;

pub use generator::{GenerationError, ResponseGenerator};
pub use openai_compatible::OpenAiCompatibleClient;
