use std::fmt;

use crate::cleanup::normalize_region_text;
use crate::parser::layout::{assemble_text, Glyph, PageLayout};

/// Offset applied to the right column's left edge so a glyph sitting exactly
/// on the page's vertical midline is never captured by both columns.
pub const COLUMN_GUTTER_EPSILON: f32 = 1e-3;

/// A rectangular crop box in top-left page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
}

/// Which half of a two-column page a region covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColumnSide {
    Left,
    Right,
}

impl fmt::Display for ColumnSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSide::Left => write!(f, "left"),
            ColumnSide::Right => write!(f, "right"),
        }
    }
}

impl Region {
    pub fn new(x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self { x0, top, x1, bottom }
    }

    /// `(0, 0, width / 2, height)`
    pub fn left_half(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width / 2.0, height)
    }

    /// `(width / 2 + ε, 0, width, height)`
    pub fn right_half(width: f32, height: f32) -> Self {
        Self::new(width / 2.0 + COLUMN_GUTTER_EPSILON, 0.0, width, height)
    }

    /// A glyph belongs to the region when its centre lies inside it.
    pub fn contains(&self, glyph: &Glyph) -> bool {
        let (mx, my) = (glyph.mid_x(), glyph.mid_y());
        self.x0 <= mx && mx <= self.x1 && self.top <= my && my <= self.bottom
    }
}

impl PageLayout {
    /// The two column regions of the page, left first.
    pub fn columns(&self) -> [(ColumnSide, Region); 2] {
        [
            (ColumnSide::Left, Region::left_half(self.width, self.height)),
            (ColumnSide::Right, Region::right_half(self.width, self.height)),
        ]
    }

    /// Glyphs inside `region`, in content-stream order.
    pub fn crop(&self, region: &Region) -> impl Iterator<Item = &Glyph> + '_ {
        let region = *region;
        self.glyphs.iter().filter(move |g| region.contains(g))
    }

    /// Plain text of the glyphs inside `region`. Empty when nothing falls in it.
    pub fn region_text(&self, region: &Region) -> String {
        normalize_region_text(&assemble_text(self.crop(region)))
    }
}
