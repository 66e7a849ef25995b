//! # Grid Mathematics
//!
//! Line rasterisation and direction helpers shared by generation and
//! gameplay code.

use crate::world::{Cardinal, GridPos};

/// Rasterises the segment from `start` to `end`, both ends included.
///
/// Works in every octant; consecutive points differ by one step on the major
/// axis and at most one step on the minor axis.
///
/// # Examples
///
/// ```
/// use tilecrawl::{bresenham_line, GridPos};
///
/// let line = bresenham_line(GridPos::new(0, 0), GridPos::new(4, 2));
/// assert_eq!(line.first(), Some(&GridPos::new(0, 0)));
/// assert_eq!(line.last(), Some(&GridPos::new(4, 2)));
/// assert_eq!(line.len(), 5);
/// ```
pub fn bresenham_line(start: GridPos, end: GridPos) -> Vec<GridPos> {
    let dx = (end.x - start.x).abs();
    let dy = -(end.y - start.y).abs();
    let step_x = if start.x < end.x { 1 } else { -1 };
    let step_y = if start.y < end.y { 1 } else { -1 };

    let mut points = Vec::with_capacity((dx.max(-dy) + 1) as usize);
    let mut error = dx + dy;
    let mut current = start;

    loop {
        points.push(current);
        if current == end {
            break;
        }
        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            current.x += step_x;
        }
        if doubled <= dx {
            error += dx;
            current.y += step_y;
        }
    }
    points
}

/// Adds a corner point inside every diagonal step of `points`, so consecutive
/// points always differ by one step along a single axis. Corners take the
/// `x` step first.
///
/// # Examples
///
/// ```
/// use tilecrawl::{four_connected, GridPos};
///
/// let path = four_connected(&[GridPos::new(0, 0), GridPos::new(1, 1)]);
/// assert_eq!(path, vec![GridPos::new(0, 0), GridPos::new(1, 0), GridPos::new(1, 1)]);
/// ```
pub fn four_connected(points: &[GridPos]) -> Vec<GridPos> {
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let mut path = Vec::with_capacity(points.len() * 2);
    path.push(*first);
    for pair in points.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        if from.x != to.x && from.y != to.y {
            path.push(GridPos::new(to.x, from.y));
        }
        path.push(to);
    }
    path
}

/// The cardinal direction closest to the vector from `from` to `to`.
///
/// Angles are measured from the `+x` axis (North) towards `+y` (East).
/// Exact diagonals round clockwise.
pub fn closest_direction(from: (f32, f32), to: (f32, f32)) -> Cardinal {
    let degrees = (to.1 - from.1).atan2(to.0 - from.0).to_degrees() + 360.0;
    Cardinal::from_index(((degrees / 90.0) + 0.5) as usize % 4)
}
