//! # Pagination
//!
//! Page geometry for slicing one tall raster into page-sized strips.
//!
//! The raster is the whole document at a fixed pixel width. One page worth
//! of raster rows is the raster width scaled by the page's aspect ratio:
//!
//! ```text
//! page_rows = raster_width * page_height_mm / page_width_mm
//! pages     = ceil(raster_height / page_rows)
//! ```
//!
//! Slice `i` covers rows `[floor(i * page_rows), floor((i + 1) * page_rows))`,
//! clipped to the raster. Only the final slice can be short.

use serde::{Deserialize, Serialize};

/// Standard page sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageFormat {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
}

impl PageFormat {
    /// Portrait (width, height) in millimeters.
    pub fn dimensions_mm(&self) -> (f64, f64) {
        match self {
            PageFormat::A3 => (297.0, 420.0),
            PageFormat::A4 => (210.0, 297.0),
            PageFormat::A5 => (148.0, 210.0),
            PageFormat::Letter => (215.9, 279.4),
            PageFormat::Legal => (215.9, 355.6),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// A page format in a given orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PageGeometry {
    pub fn new(format: PageFormat, orientation: Orientation) -> Self {
        let (w, h) = format.dimensions_mm();
        match orientation {
            Orientation::Portrait => Self { width_mm: w, height_mm: h },
            Orientation::Landscape => Self { width_mm: h, height_mm: w },
        }
    }

    /// Raster rows that correspond to exactly one page.
    pub fn page_canvas_height(&self, raster_width: u32) -> f64 {
        page_canvas_height(raster_width, self.width_mm, self.height_mm)
    }
}

/// Raster rows that correspond to exactly one page of the given size.
pub fn page_canvas_height(raster_width: u32, page_width_mm: f64, page_height_mm: f64) -> f64 {
    raster_width as f64 * page_height_mm / page_width_mm
}

/// Number of pages needed for a raster of `total_height` rows.
pub fn page_count(total_height: u32, page_height: f64) -> usize {
    if total_height == 0 || page_height <= 0.0 {
        return 0;
    }
    (total_height as f64 / page_height).ceil() as usize
}

/// One page's strip of the master raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice {
    pub index: usize,
    /// First raster row of the strip.
    pub top: u32,
    /// Rows in the strip: `floor` or `ceil` of the page height, shorter
    /// only on the last page.
    pub height: u32,
}

impl PageSlice {
    /// Rows of the canvas this strip is drawn on. A full strip fills its
    /// canvas exactly; a short last strip gets a whole page of
    /// `ceil(page_height)` rows.
    pub fn canvas_rows(&self, page_height: f64) -> u32 {
        if self.height as f64 >= page_height.floor() {
            self.height
        } else {
            (page_height.ceil() as u32).max(1)
        }
    }
}

/// The strips covering `[0, total_height)`, in page order.
pub fn page_slices(total_height: u32, page_height: f64) -> Vec<PageSlice> {
    let count = page_count(total_height, page_height);
    (0..count)
        .map(|index| {
            let top = (index as f64 * page_height).floor() as u32;
            let bottom = (((index + 1) as f64 * page_height).floor() as u32).min(total_height);
            PageSlice {
                index,
                top,
                height: bottom - top,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_canvas_height() {
        let page = PageGeometry::new(PageFormat::A4, Orientation::Portrait);
        let p = page.page_canvas_height(1588);
        assert!((p - 1588.0 * 297.0 / 210.0).abs() < 1e-9);
    }

    #[test]
    fn test_landscape_swaps() {
        let page = PageGeometry::new(PageFormat::A4, Orientation::Landscape);
        assert_eq!((page.width_mm, page.height_mm), (297.0, 210.0));
    }

    #[test]
    fn test_exact_multiple() {
        let slices = page_slices(2000, 1000.0);
        assert_eq!(page_count(2000, 1000.0), 2);
        assert_eq!(slices.len(), 2);
        assert!(slices.iter().all(|s| s.height == 1000));
        assert_eq!(slices[1].top, 1000);
    }

    #[test]
    fn test_partial_last_page() {
        assert_eq!(page_count(2500, 1000.0), 3);
        let slices = page_slices(2500, 1000.0);
        assert_eq!(slices.len(), 3);
        assert_eq!(slices[2], PageSlice { index: 2, top: 2000, height: 500 });
    }

    #[test]
    fn test_fractional_page_height() {
        let p = page_canvas_height(1588, 210.0, 297.0);
        let total = 4000;
        let slices = page_slices(total, p);
        assert_eq!(slices.len(), page_count(total, p));
        assert_eq!(slices.iter().map(|s| s.height).sum::<u32>(), total);
        for pair in slices.windows(2) {
            assert_eq!(pair[0].top + pair[0].height, pair[1].top);
        }
    }

    #[test]
    fn test_full_strips_fill_their_canvas() {
        let p = page_canvas_height(210, 297.0, 210.0);
        let slices = page_slices(445, p);
        let heights: Vec<u32> = slices.iter().map(|s| s.height).collect();
        assert_eq!(heights, vec![148, 148, 149]);
        for slice in &slices {
            assert_eq!(slice.canvas_rows(p), slice.height);
        }
    }

    #[test]
    fn test_short_last_strip_gets_a_whole_page() {
        let p = page_canvas_height(210, 297.0, 210.0);
        let slices = page_slices(200, p);
        assert_eq!(slices[1].height, 52);
        assert_eq!(slices[1].canvas_rows(p), 149);
    }

    #[test]
    fn test_empty_raster() {
        assert_eq!(page_count(0, 1000.0), 0);
        assert!(page_slices(0, 1000.0).is_empty());
    }

    #[test]
    fn test_shorter_than_one_page() {
        let slices = page_slices(300, 1000.0);
        assert_eq!(slices, vec![PageSlice { index: 0, top: 0, height: 300 }]);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn slices_tile_the_raster(total in 1u32..50_000, page in 50.0f64..5_000.0) {
                let slices = page_slices(total, page);
                prop_assert_eq!(slices.len(), (total as f64 / page).ceil() as usize);
                prop_assert_eq!(slices.iter().map(|s| s.height).sum::<u32>(), total);
                for (i, s) in slices.iter().enumerate() {
                    prop_assert_eq!(s.index, i);
                }
            }
        }
    }
}
