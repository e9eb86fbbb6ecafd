mod assistant;
mod openai;
pub mod prompts;
mod traits;

pub use assistant::{clean_completion, parse_classification, parse_edit_proposals, OpenAiAssistant};
pub use openai::{ChatRequest, OpenAiClient};
pub use traits::*;
