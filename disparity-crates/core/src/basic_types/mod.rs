mod errors;
mod image;
mod node;
mod pixel;

pub use errors::GraphConstructionError;
pub use errors::ImageError;
pub use errors::LabelingError;
pub use image::Image;
pub use node::Edge;
pub use node::Node;
pub use pixel::Direction;
pub use pixel::Pixel;
