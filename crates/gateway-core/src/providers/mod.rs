//! Provider adapters
//!
//! Every backend sits behind [`ProviderAdapter`]. The set is closed: a
//! [`ProviderInstance`] is built by [`ProviderInstance::create`] from a
//! [`ProviderKind`](crate::types::ProviderKind), never inferred at runtime.

pub mod adapter;
pub mod anthropic;
pub mod error_utils;
pub mod gemini;
pub mod mock;
pub mod openai_compat;
pub mod sse;
pub mod stream;
pub mod structured;

pub use adapter::{AdapterSettings, ProviderAdapter, ProviderInstance, build_http_client};
pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use stream::{ProviderStream, StreamPiece, collect_stream};
