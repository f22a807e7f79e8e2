//! Pure transformations: index resolution and pacing arithmetic.
//!
//! Nothing in here touches the network or the filesystem.

mod index;
mod pacing;

pub use index::{IndexRecord, Resolution, resolve};
pub use pacing::{format_instant, next_stamp, pacing_wait, parse_instant};
