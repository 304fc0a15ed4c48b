// crates/veritext-engine/src/lib.rs
//
// veritext-engine: model adapters and the proof-carrying generation engine.
//
// ProofEngine drives one ModelAdapter (chosen at construction) through the
// canonicalize -> invoke -> record -> prove -> assemble pipeline. Model
// calls run under a deadline with bounded retry of transient failures.

pub mod adapter;
pub mod config;
pub mod engine;

pub use adapter::{MockAdapter, MockReply, OllamaAdapter};
pub use config::{AdapterConfig, EngineConfig, RetryPolicy};
pub use engine::{GenerateOptions, ProofEngine};
