// THEORY:
// A `MotionRegion` is the spatial summary of one connected patch of change in a
// single frame. It is the only output of the motion detector that leaves the
// engine: the renderer draws its bounding box, the alarm only asks whether any
// region exists at all.
//
// Key architectural principles:
// 1.  **Stateless Data Container**: A region describes one frame. It carries no
//     identity across frames; tracking intruders is out of scope.
// 2.  **External Components Only**: Extraction walks the binary mask with an
//     8-connected flood fill. Each foreground island becomes exactly one region;
//     its area counts the island's foreground pixels. Islands sitting inside a
//     hole of another island are not reported: only components that touch the
//     background reachable from the image border are external.
// 3.  **Cheap to Discard**: Regions below the minimum area are dropped right
//     after extraction. They never reach the caller.

use crate::core_modules::mask::FOREGROUND;
use image::GrayImage;

/// An axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Returns true when `other` lies entirely inside this box.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.width <= self.x + self.width
            && other.y + other.height <= self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// One connected component of significant change in a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionRegion {
    /// Number of foreground pixels in the component.
    pub area: u64,
    /// The smallest rectangle enclosing every pixel of the component.
    pub bounding_box: BoundingBox,
}

/// Finds every external 8-connected foreground component in `mask`, in scan
/// order of each component's first pixel. Components enclosed by another
/// component are skipped.
pub fn extract_regions(mask: &GrayImage) -> Vec<MotionRegion> {
    let (width, height) = mask.dimensions();
    let (w, h) = (width as usize, height as usize);
    let pixels = mask.as_raw();
    let outside = outer_background(pixels, w, h);
    let mut visited = vec![false; w * h];
    let mut regions = Vec::new();

    for start in 0..w * h {
        if visited[start] || pixels[start] != FOREGROUND {
            continue;
        }
        let (region, external) = grow_region(start, pixels, &outside, &mut visited, w, h);
        if external {
            regions.push(region);
        }
    }

    regions
}

/// Marks the background pixels reachable from the image border through
/// 4-connected background. Background left unmarked lies in a hole.
fn outer_background(pixels: &[u8], width: usize, height: usize) -> Vec<bool> {
    let mut outside = vec![false; width * height];
    let mut stack = Vec::new();

    for y in 0..height {
        for x in 0..width {
            let on_border = x == 0 || y == 0 || x + 1 == width || y + 1 == height;
            let index = y * width + x;
            if on_border && pixels[index] != FOREGROUND {
                outside[index] = true;
                stack.push(index);
            }
        }
    }

    while let Some(index) = stack.pop() {
        let (x, y) = (index % width, index / width);
        for neighbour in four_neighbours(x, y, width, height).into_iter().flatten() {
            if !outside[neighbour] && pixels[neighbour] != FOREGROUND {
                outside[neighbour] = true;
                stack.push(neighbour);
            }
        }
    }

    outside
}

fn four_neighbours(x: usize, y: usize, width: usize, height: usize) -> [Option<usize>; 4] {
    [
        (x > 0).then(|| y * width + x - 1),
        (x + 1 < width).then(|| y * width + x + 1),
        (y > 0).then(|| (y - 1) * width + x),
        (y + 1 < height).then(|| (y + 1) * width + x),
    ]
}

/// Depth-first flood fill from `start`, collecting area and bounds. Also
/// reports whether the component is external: it touches the image border
/// or background reachable from it.
fn grow_region(
    start: usize,
    pixels: &[u8],
    outside: &[bool],
    visited: &mut [bool],
    width: usize,
    height: usize,
) -> (MotionRegion, bool) {
    let mut stack = vec![start];
    visited[start] = true;

    let mut area = 0u64;
    let mut external = false;
    let (mut min_x, mut min_y) = (usize::MAX, usize::MAX);
    let (mut max_x, mut max_y) = (0usize, 0usize);

    while let Some(index) = stack.pop() {
        let (x, y) = (index % width, index / width);
        area += 1;
        if !external {
            let on_border = x == 0 || y == 0 || x + 1 == width || y + 1 == height;
            external = on_border
                || four_neighbours(x, y, width, height)
                    .into_iter()
                    .flatten()
                    .any(|n| outside[n]);
        }
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);

        for dy in -1isize..=1 {
            for dx in -1isize..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = x as isize + dx;
                let ny = y as isize + dy;
                if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                    continue;
                }
                let neighbour = ny as usize * width + nx as usize;
                if !visited[neighbour] && pixels[neighbour] == FOREGROUND {
                    visited[neighbour] = true;
                    stack.push(neighbour);
                }
            }
        }
    }

    let region = MotionRegion {
        area,
        bounding_box: BoundingBox {
            x: min_x as u32,
            y: min_y as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        },
    };
    (region, external)
}

/// Keeps only the regions whose area reaches `min_area`.
pub fn filter_by_area(regions: Vec<MotionRegion>, min_area: u64) -> Vec<MotionRegion> {
    regions.into_iter().filter(|r| r.area >= min_area).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::mask::BACKGROUND;
    use image::Luma;

    fn fill(mask: &mut GrayImage, x: u32, y: u32, w: u32, h: u32) {
        for yy in y..y + h {
            for xx in x..x + w {
                mask.put_pixel(xx, yy, Luma([FOREGROUND]));
            }
        }
    }

    #[test]
    fn empty_mask_has_no_regions() {
        let mask = GrayImage::from_pixel(10, 10, Luma([BACKGROUND]));
        assert!(extract_regions(&mask).is_empty());
    }

    #[test]
    fn separate_blocks_become_separate_regions() {
        let mut mask = GrayImage::from_pixel(20, 10, Luma([BACKGROUND]));
        fill(&mut mask, 1, 1, 3, 2);
        fill(&mut mask, 10, 5, 4, 4);

        let regions = extract_regions(&mask);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].area, 6);
        assert_eq!(
            regions[0].bounding_box,
            BoundingBox { x: 1, y: 1, width: 3, height: 2 }
        );
        assert_eq!(regions[1].area, 16);
        assert_eq!(
            regions[1].bounding_box,
            BoundingBox { x: 10, y: 5, width: 4, height: 4 }
        );
    }

    #[test]
    fn diagonal_neighbours_are_connected() {
        let mut mask = GrayImage::from_pixel(4, 4, Luma([BACKGROUND]));
        mask.put_pixel(0, 0, Luma([FOREGROUND]));
        mask.put_pixel(1, 1, Luma([FOREGROUND]));
        mask.put_pixel(2, 2, Luma([FOREGROUND]));

        let regions = extract_regions(&mask);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 3);
        assert_eq!(
            regions[0].bounding_box,
            BoundingBox { x: 0, y: 0, width: 3, height: 3 }
        );
    }

    fn ring(mask: &mut GrayImage, x: u32, y: u32, side: u32, thickness: u32) {
        fill(mask, x, y, side, thickness);
        fill(mask, x, y + side - thickness, side, thickness);
        fill(mask, x, y, thickness, side);
        fill(mask, x + side - thickness, y, thickness, side);
    }

    #[test]
    fn island_inside_a_hole_is_not_reported() {
        let mut mask = GrayImage::from_pixel(40, 40, Luma([BACKGROUND]));
        ring(&mut mask, 5, 5, 30, 3);
        fill(&mut mask, 18, 18, 4, 4);

        let regions = extract_regions(&mask);
        assert_eq!(regions.len(), 1);
        assert_eq!(
            regions[0].bounding_box,
            BoundingBox { x: 5, y: 5, width: 30, height: 30 }
        );
        assert_eq!(regions[0].area, 30 * 30 - 24 * 24);
    }

    #[test]
    fn island_beside_an_open_ring_is_external() {
        let mut mask = GrayImage::from_pixel(40, 40, Luma([BACKGROUND]));
        ring(&mut mask, 5, 5, 30, 3);
        // Cut a gap into the right wall; the inner island now sees the outside.
        for y in 18..22 {
            for x in 32..35 {
                mask.put_pixel(x, y, Luma([BACKGROUND]));
            }
        }
        fill(&mut mask, 18, 18, 4, 4);

        let regions = extract_regions(&mask);
        assert_eq!(regions.len(), 2);
        assert!(regions.iter().any(|r| r.area == 16));
    }

    #[test]
    fn components_on_the_image_border_are_external() {
        let mut mask = GrayImage::from_pixel(8, 8, Luma([BACKGROUND]));
        fill(&mut mask, 0, 0, 8, 8);
        let regions = extract_regions(&mask);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 64);
    }

    #[test]
    fn filter_drops_small_regions_only() {
        let mut mask = GrayImage::from_pixel(30, 30, Luma([BACKGROUND]));
        fill(&mut mask, 0, 0, 2, 2);
        fill(&mut mask, 10, 10, 10, 10);

        let kept = filter_by_area(extract_regions(&mask), 100);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].area, 100);
        assert!(kept.iter().all(|r| r.area >= 100));
    }

    #[test]
    fn bounding_box_containment() {
        let outer = BoundingBox { x: 0, y: 0, width: 10, height: 10 };
        let inner = BoundingBox { x: 2, y: 3, width: 8, height: 7 };
        let outside = BoundingBox { x: 5, y: 5, width: 6, height: 1 };
        assert!(outer.contains(&inner));
        assert!(!outer.contains(&outside));
        assert_eq!(outer.area(), 100);
    }
}
