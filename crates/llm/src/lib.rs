pub mod conversation;
pub mod provider;
pub mod providers;

pub use conversation::assemble;
pub use provider::{ChatStreamProvider, Increment, IncrementStream, LlmError, Message, Role};
pub use providers::openai::OpenAiProvider;
