//! Immutable data types: configuration, match patterns, byte ranges, and
//! retrieval targets.

pub mod config;
pub mod pattern;
pub mod range;
pub mod target;

pub use config::{Config, GateConfig, HttpConfig, TimeUnit, default_state_path};
pub use pattern::MatchSpec;
pub use range::{ByteRange, RangeSet};
pub use target::{CompletionCallback, RetrievalTarget, RetrieveOptions};
