//! Filesystem primitives shared by the gribfetch crates.
//!
//! - [`atomic_write`] / [`atomic_read`]: whole-file replacement through a
//!   sibling temp file and rename.
//! - [`LockedFile`]: an exclusive advisory lock on a small shared file that is
//!   read and rewritten in place while held.

mod error;
mod lock;
mod rw;

pub use error::{Error, Result};
pub use lock::LockedFile;
pub use rw::{Options, atomic_read, atomic_write, ensure_parent, staging_path};
