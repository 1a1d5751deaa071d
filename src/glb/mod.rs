//! GLB binary container framing.
//!
//! A GLB file carries the glTF JSON and an optional binary payload in one
//! stream. All integers are little-endian.
//!
//! ## File Structure
//!
//! ```text
//! +------------------+
//! | Magic: "glTF"    |  4 bytes
//! +------------------+
//! | Version: 2       |  4 bytes (u32 LE)
//! +------------------+
//! | Total length     |  4 bytes (u32 LE, header included)
//! +------------------+
//! | JSON chunk       |  length, "JSON", payload padded with spaces
//! +------------------+
//! | BIN chunk        |  optional; length, "BIN\0", payload padded with zeros
//! +------------------+
//! ```

mod format;
mod reader;
mod writer;

pub use format::*;
pub use reader::*;
pub use writer::*;
