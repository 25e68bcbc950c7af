//! Streaming chunk reconstructor
//!
//! Turns a provider's raw byte stream into bounded, framed SSE events:
//!
//! ```text
//! ProviderStream ──► frame_stream (reads, idle timeout, cancellation)
//!                        │
//!                        ▼
//!                 ChunkReconstructor (UTF-8 carry, breakpoints, ceilings)
//!                        │
//!                        ▼
//!   connected|fallback, content*, [continuation], complete|error
//! ```

mod breakpoint;
mod driver;
mod frame;
mod limits;
mod reconstructor;
mod utf8;

pub use breakpoint::find_breakpoint;
pub use driver::{FrameStream, FrameStreamOptions, StreamOrigin, UsageSink, frame_stream};
pub use frame::{
    CapReason, CompleteFrame, ConnectedFrame, ContentFrame, ContinuationFrame, ErrorFrame,
    FallbackFrame, StreamFrame,
};
pub use limits::{CHUNK_SIZE_ENV, DEFAULT_CHUNK_SIZE, StreamLimits};
pub use reconstructor::ChunkReconstructor;
pub use utf8::Utf8Carry;
