use image::GrayImage;
use imageproc::{
    contours::{find_contours, BorderType, Contour},
    point::Point,
};

/// A connected set of active pixels in a binary mask, described by its
/// outer border.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Left edge of the bounding box.
    pub x: u32,
    /// Top edge of the bounding box.
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Area enclosed by the outer border, through the border pixel centres.
    pub area: u64,
    /// Hole borders directly inside this region. Regions nested in a hole
    /// are reported as regions of their own.
    pub holes: usize,
}

/// Trace the borders of every 8-connected region of non zero pixels. Each
/// outer border is one region, in raster order of where it was found.
pub fn extract_regions(mask: &GrayImage) -> Vec<Region> {
    let contours = find_contours::<i64>(mask);

    let mut region_of = vec![None; contours.len()];
    let mut regions = Vec::new();
    for (i, contour) in contours.iter().enumerate() {
        if matches!(contour.border_type, BorderType::Outer) {
            region_of[i] = Some(regions.len());
            regions.push(region_from_border(contour));
        }
    }

    for contour in &contours {
        if matches!(contour.border_type, BorderType::Hole) {
            if let Some(index) = contour.parent.and_then(|parent| region_of[parent]) {
                regions[index].holes += 1;
            }
        }
    }
    regions
}

fn region_from_border(contour: &Contour<i64>) -> Region {
    let points = &contour.points;
    let min_x = points.iter().map(|p| p.x).min().unwrap_or(0);
    let max_x = points.iter().map(|p| p.x).max().unwrap_or(0);
    let min_y = points.iter().map(|p| p.y).min().unwrap_or(0);
    let max_y = points.iter().map(|p| p.y).max().unwrap_or(0);

    Region {
        x: min_x as u32,
        y: min_y as u32,
        width: (max_x - min_x + 1) as u32,
        height: (max_y - min_y + 1) as u32,
        area: polygon_area(points),
        holes: 0,
    }
}

/// Shoelace area of a closed polygon, rounded down.
fn polygon_area(points: &[Point<i64>]) -> u64 {
    if points.len() < 3 {
        return 0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    twice.unsigned_abs() / 2
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;

    fn mask_from(rows: &[&str]) -> GrayImage {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        GrayImage::from_fn(width, height, |x, y| {
            let on = rows[y as usize].as_bytes()[x as usize] == b'#';
            Luma([if on { 255 } else { 0 }])
        })
    }

    #[test]
    fn test_empty_mask_has_no_regions() {
        assert!(extract_regions(&GrayImage::new(16, 16)).is_empty());
    }

    #[test]
    fn test_diagonal_pixels_are_connected() {
        let mask = mask_from(&["#...", ".#..", "..#.", "...."]);
        let regions = extract_regions(&mask);
        assert_eq!(
            regions,
            vec![Region {
                x: 0,
                y: 0,
                width: 3,
                height: 3,
                area: 0,
                holes: 0
            }]
        );
    }

    #[test]
    fn test_separate_blobs() {
        let mask = mask_from(&["##....", "##....", "......", "....##"]);
        let regions = extract_regions(&mask);
        assert_eq!(regions.len(), 2);
        assert_eq!((regions[0].width, regions[0].height), (2, 2));
        assert_eq!(regions[0].area, 1);
        assert_eq!((regions[1].x, regions[1].y), (4, 3));
    }

    #[test]
    fn test_block_area() {
        let mask = mask_from(&["......", ".####.", ".####.", ".####.", ".####.", "......"]);
        let regions = extract_regions(&mask);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 9);
        assert_eq!((regions[0].x, regions[0].y), (1, 1));
    }

    #[test]
    fn test_ring_has_a_hole_and_nested_region() {
        let mask = mask_from(&[
            ".......",
            ".#####.",
            ".#...#.",
            ".#.#.#.",
            ".#...#.",
            ".#####.",
            ".......",
        ]);
        let regions = extract_regions(&mask);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].holes, 1);
        assert_eq!(regions[0].area, 16);
        assert_eq!((regions[1].x, regions[1].y), (3, 3));
        assert_eq!(regions[1].holes, 0);
    }

    #[test]
    fn test_open_shape_has_no_hole() {
        let mask = mask_from(&[".....", ".#.#.", ".#.#.", ".###.", "....."]);
        let regions = extract_regions(&mask);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].holes, 0);
    }

    #[test]
    fn test_polygon_area() {
        let square = [
            Point::new(0i64, 0),
            Point::new(3, 0),
            Point::new(3, 3),
            Point::new(0, 3),
        ];
        assert_eq!(polygon_area(&square), 9);
        assert_eq!(polygon_area(&square[..2]), 0);
    }
}
