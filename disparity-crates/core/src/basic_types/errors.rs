use thiserror::Error;

use super::Pixel;
use crate::backends::DeviceError;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ImageError {
    #[error("an image of {width}x{height} pixels cannot be built from {len} values")]
    DimensionMismatch {
        width: usize,
        height: usize,
        len: usize,
    },
}

/// The reasons a [`DisparityGraph`](crate::DisparityGraph) cannot be built from the provided
/// arguments.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphConstructionError {
    #[error("Left image is invalid.")]
    InvalidLeftImage,
    #[error("Right image is invalid.")]
    InvalidRightImage,
    #[error("Disparity levels should be greater than one. Provided disparity levels is {0}.")]
    TooFewDisparityLevels(usize),
    #[error(
        "Disparity levels should not exceed the width of the left image. Width of the left \
         image is {width}. Provided disparity levels is {levels}."
    )]
    TooManyDisparityLevels { levels: usize, width: usize },
    #[error(
        "Number of columns of the images should be equal. Current left and right images have \
         {left} and {right} columns respectively."
    )]
    WidthMismatch { left: usize, right: usize },
    #[error(
        "Number of rows of the images should be equal. Current left and right images have \
         {left} and {right} rows respectively."
    )]
    HeightMismatch { left: usize, right: usize },
    #[error(
        "Maximal intensity of the images should be the same. Maximal intensity of provided left \
         and right images is {left} and {right} respectively."
    )]
    MaxValueMismatch { left: u32, right: u32 },
    #[error("The {name} weight should be a non-negative number, got {value}.")]
    InvalidWeight { name: &'static str, value: f64 },
    #[error("At least one of the cleanness and smoothness weights should be positive.")]
    NoPositiveWeight,
}

/// Failures while searching for a labeling.
///
/// Apart from device failures, none of these should happen for a graph which was built
/// successfully; they indicate that an internal invariant was broken.
#[derive(Error, Debug)]
pub enum LabelingError {
    #[error("there are no candidate thresholds to search through")]
    NoCandidateThresholds,
    #[error("the constraint graph is inconsistent at the minimal consistent threshold {0}")]
    InconsistentThreshold(f64),
    #[error("no available node is left for pixel {0}")]
    NoAvailableNode(Pixel),
    #[error("propagating the choice for pixel {0} emptied the constraint graph")]
    PropagationFailed(Pixel),
    #[error("pixel {pixel} has {count} available disparities instead of exactly one")]
    AmbiguousLabel { pixel: Pixel, count: usize },
    #[error("the compute device failed: {0}")]
    Device(#[from] DeviceError),
    #[error("the disparity map could not be assembled: {0}")]
    Image(#[from] ImageError),
}
