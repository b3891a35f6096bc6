pub mod client;
pub mod error;
pub mod retry;

pub use client::{extract_json_array, ChatClient, ChatClientConfig, ChatMessage};
pub use error::LlmError;
pub use retry::RetryPolicy;
