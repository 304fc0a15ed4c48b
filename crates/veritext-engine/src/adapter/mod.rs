// crates/veritext-engine/src/adapter/mod.rs

pub mod mock;
pub mod ollama;

pub use mock::{MockAdapter, MockReply};
pub use ollama::OllamaAdapter;
