//! Real-world scenario benchmarks.
//!
//! These model how a host drives the synth: a pool of sounding voices, and
//! the whole handle → queue → render → filter → gain path.

mod pipeline;
mod pool;

pub use pipeline::bench_pipeline;
pub use pool::bench_pool;
