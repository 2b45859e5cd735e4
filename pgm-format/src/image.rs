/// A grayscale image as it is stored in a PGM file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PgmImage {
    pub width: usize,
    pub height: usize,
    /// The intensity that corresponds to white.
    pub max_value: u32,
    /// The intensities in row-major order.
    pub pixels: Vec<u32>,
}

impl PgmImage {
    pub fn new(width: usize, height: usize, max_value: u32, pixels: Vec<u32>) -> Self {
        PgmImage {
            width,
            height,
            max_value,
            pixels,
        }
    }
}
