//! Partial retrieval of large remote GRIB files through their `.idx` record
//! indexes, paced by a rate gate shared between processes.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and types
//! - [`core`] - Pure transformations (index resolution, pacing arithmetic)
//! - [`effects`] - I/O operations with trait abstraction
//!
//! # Flow
//!
//! [`Retriever`] checks for an existing output, fetches `{url}.idx` through
//! [`PartialFetcher`], turns the requested patterns into byte ranges with
//! [`resolve`], fetches those ranges in one request, and finally calls the
//! completion callback. Every request first passes the [`RateGate`], whose
//! state lives in a file so that unrelated processes share one budget.
//!
//! ```no_run
//! use gribfetch::{Config, MatchSpec, RetrievalTarget, RetrieveOptions, Retriever};
//!
//! # async fn run() -> gribfetch::Result<()> {
//! let retriever = Retriever::from_config(&Config::default())?;
//! let target = RetrievalTarget::new(
//!     "https://nomads.ncep.noaa.gov/pub/data/nccf/com/gfs/prod/gfs.20230101/00/atmos/gfs.t00z.pgrb2.0p25.f000",
//!     "/data/gfs/f000.grb2",
//!     MatchSpec::literal([":TMP:2 m above ground:", ":UGRD:10 m above ground:"]),
//! );
//!
//! let outcome = retriever.retrieve(&target, &RetrieveOptions::default()).await;
//! println!("{} (present: {})", outcome.state, outcome.exists());
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use crate::core::{IndexRecord, Resolution, resolve};
pub use data::{
    ByteRange, CompletionCallback, Config, GateConfig, HttpConfig, MatchSpec, RangeSet,
    RetrievalTarget, RetrieveOptions, TimeUnit,
};
pub use effects::{
    BoxStream, HttpClient, Outcome, PartialFetcher, RateGate, Response, RetrievalState, Retriever,
    subset_file,
};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

pub use error::{Error, Result, Stage};
