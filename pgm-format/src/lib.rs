//! This crate reads and writes grayscale images in the plain PGM format (magic number `P2`). The
//! format is a whitespace-separated list of ASCII integers: a header with the format tag, the
//! width, the height and the maximal intensity, followed by the intensities in row-major order.
//! Comments start with `#` and run until the end of the line.
//!
//! To read an image see [`decode`], and to write one see [`encode`].

mod error;
mod image;
mod reader;
mod writer;

pub use error::PgmError;
pub use image::PgmImage;
pub use reader::decode;
pub use writer::encode;

/// The magic string that identifies the plain PGM format.
pub const FORMAT_CODE: &str = "P2";

/// The largest maximal intensity an image is allowed to declare.
pub const MAX_VALUE_LIMIT: u32 = 1 << 16;
