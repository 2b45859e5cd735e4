//! # Disparity solver
//! Computes a dense disparity map for a rectified stereo pair of plain PGM images.
//!
//! The heavy lifting happens in [`core`], which is re-exported together with the image codec in
//! [`pgm_format`] so that both can be used through this crate.
pub use disparity_core as core;
pub use pgm_format;

use crate::core::Image;
use crate::core::ImageError;
use crate::pgm_format::PgmImage;

/// Convert a decoded PGM image into the image type of the solver.
pub fn image_from_pgm(image: PgmImage) -> Result<Image, ImageError> {
    Image::new(image.width, image.height, image.max_value, image.pixels)
}

/// Convert an image of the solver into a PGM image which can be encoded.
pub fn image_to_pgm(image: Image) -> PgmImage {
    let (width, height, max_value) = (image.width(), image.height(), image.max_value());
    PgmImage::new(width, height, max_value, image.into_data())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_keeps_the_pixels() {
        let pgm = PgmImage::new(3, 1, 7, vec![0, 3, 7]);

        let image = image_from_pgm(pgm.clone()).expect("pixels match the dimensions");

        assert_eq!(7, image.value(crate::core::Pixel::new(2, 0)));
        assert_eq!(pgm, image_to_pgm(image));
    }

    #[test]
    fn inconsistent_pgm_is_rejected() {
        let pgm = PgmImage::new(2, 2, 7, vec![0, 3, 7]);

        assert!(image_from_pgm(pgm).is_err());
    }
}
