use std::collections::VecDeque;

use ndarray::Array2;

use crate::shared::region::Rect;

/// Clockwise ring of 8-neighbour offsets `(dx, dy)` with y pointing down,
/// starting at west.
const RING: [(isize, isize); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

const FOUR_NEIGHBOURS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// An outermost connected foreground component of a binary mask.
#[derive(Clone, Debug, PartialEq)]
pub struct Blob {
    pub bounds: Rect,
    /// Area enclosed by the outer boundary polygon through pixel centres.
    pub area: f64,
    pub pixel_count: usize,
}

/// Finds every outermost 8-connected foreground component of `mask`.
///
/// Components lying inside a hole of another component are skipped, and
/// holes never yield components of their own. Results are in raster order of
/// each component's first pixel.
pub fn external_blobs(mask: &Array2<bool>) -> Vec<Blob> {
    let (height, width) = mask.dim();
    if height == 0 || width == 0 {
        return Vec::new();
    }

    let outside = outer_background(mask);
    let mut visited = Array2::from_elem((height, width), false);
    let mut blobs = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if !mask[[y, x]] || visited[[y, x]] {
                continue;
            }
            let component = flood_component(mask, &outside, &mut visited, (y, x));
            if !component.external {
                continue;
            }
            let boundary = trace_boundary(mask, (y, x), component.pixel_count);
            blobs.push(Blob {
                bounds: component.bounds,
                area: polygon_area(&boundary),
                pixel_count: component.pixel_count,
            });
        }
    }

    blobs
}

struct Component {
    bounds: Rect,
    pixel_count: usize,
    external: bool,
}

fn neighbour(
    (y, x): (usize, usize),
    (dx, dy): (isize, isize),
    (height, width): (usize, usize),
) -> Option<(usize, usize)> {
    let ny = y as isize + dy;
    let nx = x as isize + dx;
    if ny < 0 || nx < 0 || ny >= height as isize || nx >= width as isize {
        None
    } else {
        Some((ny as usize, nx as usize))
    }
}

/// Background pixels 4-connected to the image border.
///
/// 4-connectivity for background is the dual of 8-connectivity for
/// foreground, so a closed 8-connected ring always seals its hole.
fn outer_background(mask: &Array2<bool>) -> Array2<bool> {
    let dim = mask.dim();
    let (height, width) = dim;
    let mut outside = Array2::from_elem(dim, false);
    let mut queue = VecDeque::new();

    let border = (0..width)
        .flat_map(|x| [(0, x), (height - 1, x)])
        .chain((0..height).flat_map(|y| [(y, 0), (y, width - 1)]));
    for p in border {
        if !mask[p] && !outside[p] {
            outside[p] = true;
            queue.push_back(p);
        }
    }

    while let Some(p) = queue.pop_front() {
        for offset in FOUR_NEIGHBOURS {
            if let Some(n) = neighbour(p, offset, dim) {
                if !mask[n] && !outside[n] {
                    outside[n] = true;
                    queue.push_back(n);
                }
            }
        }
    }
    outside
}

/// Breadth-first 8-connected fill from `seed`, marking `visited`.
fn flood_component(
    mask: &Array2<bool>,
    outside: &Array2<bool>,
    visited: &mut Array2<bool>,
    seed: (usize, usize),
) -> Component {
    let dim = mask.dim();
    let (height, width) = dim;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (seed.1, seed.0, seed.1, seed.0);
    let mut pixel_count = 0;
    let mut external = false;
    let mut queue = VecDeque::from([seed]);
    visited[seed] = true;

    while let Some(p @ (y, x)) = queue.pop_front() {
        pixel_count += 1;
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);

        if !external {
            external = y == 0
                || x == 0
                || y == height - 1
                || x == width - 1
                || FOUR_NEIGHBOURS
                    .iter()
                    .filter_map(|&o| neighbour(p, o, dim))
                    .any(|n| outside[n]);
        }

        for offset in RING {
            if let Some(n) = neighbour(p, offset, dim) {
                if mask[n] && !visited[n] {
                    visited[n] = true;
                    queue.push_back(n);
                }
            }
        }
    }

    Component {
        bounds: Rect::new(
            min_x as u32,
            min_y as u32,
            (max_x - min_x + 1) as u32,
            (max_y - min_y + 1) as u32,
        ),
        pixel_count,
        external,
    }
}

fn ring_index(offset: (isize, isize)) -> usize {
    RING.iter()
        .position(|&o| o == offset)
        .expect("difference of adjacent ring cells is a ring offset")
}

/// Moore-neighbour tracing of the outer boundary, clockwise, starting at the
/// component's first raster pixel. Returns boundary pixel centres as `(x, y)`.
///
/// Stops when the first move out of `start` is about to repeat, which also
/// handles one-pixel-wide necks that revisit `start`.
fn trace_boundary(
    mask: &Array2<bool>,
    start: (usize, usize),
    pixel_count: usize,
) -> Vec<(f64, f64)> {
    let dim = mask.dim();
    let is_fg = |p: (usize, usize), offset| neighbour(p, offset, dim).is_some_and(|n| mask[n]);

    let mut contour = vec![(start.1 as f64, start.0 as f64)];
    let mut current = start;
    // West of the first raster pixel is never foreground.
    let mut back = 0;
    let mut first_move = None;
    let max_steps = 8 * pixel_count + 8;

    for _ in 0..max_steps {
        let Some(dir) = (1..=8)
            .map(|i| (back + i) % 8)
            .find(|&d| is_fg(current, RING[d]))
        else {
            break; // isolated pixel
        };
        let Some(next) = neighbour(current, RING[dir], dim) else {
            break;
        };

        match first_move {
            Some(m) if m == (current, next) => break,
            None => first_move = Some((current, next)),
            _ => {}
        }

        // The last background cell examined becomes the backtrack of `next`.
        let prev = RING[(dir + 7) % 8];
        back = ring_index((prev.0 - RING[dir].0, prev.1 - RING[dir].1));
        current = next;
        contour.push((current.1 as f64, current.0 as f64));
    }

    if contour.len() > 1 && contour.last() == contour.first() {
        contour.pop();
    }
    contour
}

/// Shoelace formula over a closed polygon.
fn polygon_area(points: &[(f64, f64)]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(&(x0, y0), &(x1, y1))| x0 * y1 - x1 * y0)
        .sum();
    twice.abs() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn mask_with_rects(height: usize, width: usize, rects: &[Rect]) -> Array2<bool> {
        let mut mask = Array2::from_elem((height, width), false);
        for r in rects {
            for y in r.y as usize..r.bottom() as usize {
                for x in r.x as usize..r.right() as usize {
                    mask[[y, x]] = true;
                }
            }
        }
        mask
    }

    // ── Components ───────────────────────────────────────────────────

    #[test]
    fn test_empty_mask_has_no_blobs() {
        let mask = Array2::from_elem((20, 20), false);
        assert!(external_blobs(&mask).is_empty());
    }

    #[test]
    fn test_zero_sized_mask() {
        let mask = Array2::from_elem((0, 5), false);
        assert!(external_blobs(&mask).is_empty());
    }

    #[test]
    fn test_single_rectangle_bounds_and_area() {
        let mask = mask_with_rects(30, 30, &[Rect::new(5, 7, 10, 6)]);
        let blobs = external_blobs(&mask);
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].bounds, Rect::new(5, 7, 10, 6));
        assert_eq!(blobs[0].pixel_count, 60);
        // Polygon through pixel centres: (10 - 1) x (6 - 1)
        assert_relative_eq!(blobs[0].area, 45.0);
    }

    #[test]
    fn test_separate_rectangles_in_raster_order() {
        let mask = mask_with_rects(
            40,
            40,
            &[Rect::new(20, 2, 5, 5), Rect::new(2, 20, 5, 5)],
        );
        let blobs = external_blobs(&mask);
        assert_eq!(blobs.len(), 2);
        assert_eq!(blobs[0].bounds, Rect::new(20, 2, 5, 5));
        assert_eq!(blobs[1].bounds, Rect::new(2, 20, 5, 5));
    }

    #[test]
    fn test_diagonal_touch_is_one_component() {
        let mask = mask_with_rects(
            20,
            20,
            &[Rect::new(2, 2, 3, 3), Rect::new(5, 5, 3, 3)],
        );
        let blobs = external_blobs(&mask);
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].bounds, Rect::new(2, 2, 6, 6));
    }

    #[test]
    fn test_component_touching_border_is_external() {
        let mask = mask_with_rects(10, 10, &[Rect::new(0, 0, 4, 4)]);
        let blobs = external_blobs(&mask);
        assert_eq!(blobs.len(), 1);
        assert_relative_eq!(blobs[0].area, 9.0);
    }

    #[test]
    fn test_full_mask_is_one_blob() {
        let mask = Array2::from_elem((5, 8), true);
        let blobs = external_blobs(&mask);
        assert_eq!(blobs.len(), 1);
        assert_relative_eq!(blobs[0].area, 28.0);
    }

    // ── Holes and nesting ────────────────────────────────────────────

    /// 20x20 ring with 2px walls around an 16x16 hole, inside a 30x30 mask.
    fn ring_mask() -> Array2<bool> {
        let mut mask = mask_with_rects(30, 30, &[Rect::new(5, 5, 20, 20)]);
        for y in 7..23 {
            for x in 7..23 {
                mask[[y, x]] = false;
            }
        }
        mask
    }

    #[test]
    fn test_hole_does_not_produce_blob_and_area_includes_it() {
        let blobs = external_blobs(&ring_mask());
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].bounds, Rect::new(5, 5, 20, 20));
        assert_relative_eq!(blobs[0].area, 361.0);
    }

    #[test]
    fn test_blob_inside_hole_is_ignored() {
        let mut mask = ring_mask();
        for y in 12..17 {
            for x in 12..17 {
                mask[[y, x]] = true;
            }
        }
        let blobs = external_blobs(&mask);
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].bounds, Rect::new(5, 5, 20, 20));
    }

    #[test]
    fn test_blob_inside_open_ring_is_external() {
        let mut mask = ring_mask();
        // Cut a gap through the left wall so the hole joins the outside.
        for y in 14..16 {
            mask[[y, 5]] = false;
            mask[[y, 6]] = false;
        }
        for y in 12..17 {
            for x in 12..17 {
                mask[[y, x]] = true;
            }
        }
        assert_eq!(external_blobs(&mask).len(), 2);
    }

    // ── Degenerate shapes ────────────────────────────────────────────

    #[test]
    fn test_single_pixel_has_zero_area() {
        let mask = mask_with_rects(5, 5, &[Rect::new(2, 2, 1, 1)]);
        let blobs = external_blobs(&mask);
        assert_eq!(blobs.len(), 1);
        assert_relative_eq!(blobs[0].area, 0.0);
    }

    #[test]
    fn test_horizontal_line_has_zero_area() {
        let mask = mask_with_rects(5, 10, &[Rect::new(1, 2, 7, 1)]);
        let blobs = external_blobs(&mask);
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].bounds, Rect::new(1, 2, 7, 1));
        assert_relative_eq!(blobs[0].area, 0.0);
    }

    #[test]
    fn test_l_shape_area() {
        // Vertical bar 3x6 plus horizontal foot 6x3 sharing the corner.
        let mask = mask_with_rects(
            12,
            12,
            &[Rect::new(1, 1, 3, 6), Rect::new(1, 4, 6, 3)],
        );
        let blobs = external_blobs(&mask);
        assert_eq!(blobs.len(), 1);
        // Centre polygon (1,1) (3,1) (3,3) (4,4) (6,4) (6,6) (1,6): the
        // 8-connected trace cuts the inner corner diagonally.
        assert_relative_eq!(blobs[0].area, 16.5);
    }

    #[test]
    fn test_polygon_area_of_unit_square() {
        let square = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        assert_relative_eq!(polygon_area(&square), 1.0);
    }
}
