use super::ImageError;
use super::Pixel;

/// An immutable grayscale image; intensities are stored in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    width: usize,
    height: usize,
    max_value: u32,
    data: Vec<u32>,
}

impl Image {
    pub fn new(
        width: usize,
        height: usize,
        max_value: u32,
        data: Vec<u32>,
    ) -> Result<Image, ImageError> {
        if width.checked_mul(height) != Some(data.len()) {
            return Err(ImageError::DimensionMismatch {
                width,
                height,
                len: data.len(),
            });
        }

        Ok(Image {
            width,
            height,
            max_value,
            data,
        })
    }

    /// An image is valid when it is non-empty, declares a positive maximal intensity and no
    /// intensity exceeds it.
    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.max_value > 0
            && self.data.iter().all(|&value| value <= self.max_value)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn max_value(&self) -> u32 {
        self.max_value
    }

    pub fn data(&self) -> &[u32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u32> {
        self.data
    }

    pub fn contains(&self, pixel: Pixel) -> bool {
        pixel.x < self.width && pixel.y < self.height
    }

    pub fn pixel_index(&self, pixel: Pixel) -> usize {
        pixel.y * self.width + pixel.x
    }

    /// # Panics
    /// If `pixel` lies outside of the image.
    pub fn value(&self, pixel: Pixel) -> u32 {
        self.data[self.pixel_index(pixel)]
    }

    /// The pixels of the image in raster order: rows from top to bottom, each row from left to
    /// right.
    pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Pixel::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_row_major() {
        let image = Image::new(3, 2, 5, vec![0, 1, 2, 3, 4, 5]).expect("valid image");

        assert_eq!(2, image.value(Pixel::new(2, 0)));
        assert_eq!(3, image.value(Pixel::new(0, 1)));
        assert_eq!(5, image.value(Pixel::new(2, 1)));
    }

    #[test]
    fn buffer_must_match_dimensions() {
        let result = Image::new(3, 2, 5, vec![0; 5]);

        assert!(matches!(
            result,
            Err(ImageError::DimensionMismatch {
                width: 3,
                height: 2,
                len: 5
            })
        ));
    }

    #[test]
    fn pixels_are_visited_in_raster_order() {
        let image = Image::new(2, 2, 1, vec![0; 4]).expect("valid image");

        let pixels = image.pixels().collect::<Vec<_>>();

        assert_eq!(
            vec![
                Pixel::new(0, 0),
                Pixel::new(1, 0),
                Pixel::new(0, 1),
                Pixel::new(1, 1)
            ],
            pixels
        );
    }

    #[test]
    fn validity() {
        assert!(Image::new(1, 1, 3, vec![3]).expect("valid image").is_valid());
        assert!(!Image::new(1, 1, 3, vec![4]).expect("valid image").is_valid());
        assert!(!Image::new(1, 1, 0, vec![0]).expect("valid image").is_valid());
        assert!(!Image::new(0, 4, 3, vec![]).expect("valid image").is_valid());
    }
}
