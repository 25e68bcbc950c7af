//! Request, result and provider types shared by every component

mod provider;
mod request;
mod result;

pub use provider::ProviderKind;
pub use request::{
    ChatMessage, GenerationMode, GenerationOptions, GenerationRequest, MessageRole, RequestInput,
};
pub use result::{GenerationResult, StructuredContent, TokenUsage};
