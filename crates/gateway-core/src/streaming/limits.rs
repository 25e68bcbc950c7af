//! Chunking and ceiling parameters for the stream reconstructor

use crate::config::RuntimeEnvironment;
use serde::{Deserialize, Serialize};

/// Default split threshold in characters
pub const DEFAULT_CHUNK_SIZE: usize = 200;

/// Environment variable tuning the split threshold
pub const CHUNK_SIZE_ENV: &str = "GATEWAY_STREAM_CHUNK_SIZE";

/// Limits applied to a single streamed generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamLimits {
    /// Buffer length (chars) above which a content frame is cut
    pub chunk_size: usize,
    /// Maximum number of content frames before a continuation
    pub max_chunks: usize,
    /// Maximum accumulated length (chars) before a continuation
    pub max_length: usize,
}

impl StreamLimits {
    pub fn for_environment(environment: RuntimeEnvironment) -> Self {
        match environment {
            RuntimeEnvironment::Production => Self {
                chunk_size: DEFAULT_CHUNK_SIZE,
                max_chunks: 2_000,
                max_length: 30_000,
            },
            RuntimeEnvironment::Development => Self {
                chunk_size: DEFAULT_CHUNK_SIZE,
                max_chunks: 4_000,
                max_length: 50_000,
            },
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunkSize must be greater than 0".to_string());
        }
        if self.max_chunks == 0 || self.max_length == 0 {
            return Err("maxChunks and maxLength must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for StreamLimits {
    fn default() -> Self {
        Self::for_environment(RuntimeEnvironment::default())
    }
}
