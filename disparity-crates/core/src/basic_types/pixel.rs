use std::fmt::Display;
use std::fmt::Formatter;

use enum_map::Enum;

/// A coordinate in the image grid; `x` is the column and `y` the row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pixel {
    pub x: usize,
    pub y: usize,
}

impl Pixel {
    pub fn new(x: usize, y: usize) -> Self {
        Pixel { x, y }
    }
}

impl Display for Pixel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The position of a 4-neighbour relative to a pixel.
///
/// The declaration order is part of the index layout of the reparametrization and the neighbourhood
/// penalties, and of the buffers handed to compute devices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Enum)]
pub enum Direction {
    Right,
    Left,
    Bottom,
    Top,
}

impl Direction {
    /// All directions, in index order.
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Left,
        Direction::Bottom,
        Direction::Top,
    ];

    /// The number of neighbours a pixel can have.
    pub const COUNT: usize = <Direction as Enum>::LENGTH;

    pub fn index(self) -> usize {
        self.into_usize()
    }

    /// The direction in which `self` is seen from the neighbour.
    pub fn reverse(self) -> Direction {
        match self {
            Direction::Right => Direction::Left,
            Direction::Left => Direction::Right,
            Direction::Bottom => Direction::Top,
            Direction::Top => Direction::Bottom,
        }
    }

    /// The direction of `neighbor` as seen from `pixel`, or [`None`] if the two pixels are not
    /// 4-neighbours.
    pub fn between(pixel: Pixel, neighbor: Pixel) -> Option<Direction> {
        if pixel.y == neighbor.y {
            if pixel.x + 1 == neighbor.x {
                return Some(Direction::Right);
            }
            if neighbor.x + 1 == pixel.x {
                return Some(Direction::Left);
            }
        } else if pixel.x == neighbor.x {
            if pixel.y + 1 == neighbor.y {
                return Some(Direction::Bottom);
            }
            if neighbor.y + 1 == pixel.y {
                return Some(Direction::Top);
            }
        }

        None
    }

    /// The pixel next to `pixel` in this direction.
    ///
    /// Only the lower bound of the grid is known here; the caller is responsible for checking the
    /// result against the width and height of the image.
    pub fn neighbor_of(self, pixel: Pixel) -> Option<Pixel> {
        match self {
            Direction::Right => Some(Pixel::new(pixel.x + 1, pixel.y)),
            Direction::Left => pixel.x.checked_sub(1).map(|x| Pixel::new(x, pixel.y)),
            Direction::Bottom => Some(Pixel::new(pixel.x, pixel.y + 1)),
            Direction::Top => pixel.y.checked_sub(1).map(|y| Pixel::new(pixel.x, y)),
        }
    }
}
