//! Field extraction delegated to an external generative model.

mod client;
mod prompt;
mod stream;

pub use client::GenerationClient;
pub use prompt::ExtractionPrompt;
pub use stream::{consume_stream, ChunkConsumer};
