use std::hash::Hash;

use generational_arena::{Arena, Index};
use itertools::Itertools;

#[derive(Debug, Eq, Hash, PartialEq, Clone, Copy)]
pub struct RectHandle(pub Index);

/// Rect packer for the glyph atlas. Rects are added with their size only and
/// get a position once [Atlas::pack] runs.
#[derive(Debug)]
pub struct Atlas {
    rects: Arena<Rect>,
    pub width: u32,
    pub height: u32,
    pub changed: bool,
}

impl Atlas {
    // 1x1 until something is packed, gpu textures can't be empty
    pub fn new() -> Self {
        Self {
            rects: Arena::new(),
            width: 1,
            height: 1,
            changed: false,
        }
    }

    pub fn add(&mut self, w: u32, h: u32) -> RectHandle {
        let rect = Rect { x: 0, y: 0, w, h };
        let index = self.rects.insert(rect);
        self.changed = true;

        RectHandle(index)
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Shelf packing: tallest rects first, rows roughly as wide as the square
    /// root of the total area.
    pub fn pack(&mut self) {
        self.changed = true;
        let total_area = self
            .rects
            .iter()
            .fold(0.0, |acc, (_, rect)| (rect.w * rect.h) as f32 + acc);
        let widest = self
            .rects
            .iter()
            .map(|(_, rect)| rect.w)
            .max()
            .unwrap_or(0);
        // the atlas texture can't be 0x0
        self.width = (total_area.sqrt().ceil() as u32).max(widest).max(1);

        // decreasing rect height means each row is as tall as its first rect
        let mut sorted_rects = self
            .rects
            .iter_mut()
            .sorted_by(|a, b| b.1.h.cmp(&a.1.h))
            .collect::<Vec<_>>();

        let mut x = 0;
        let mut y = 0;
        let mut max_h = sorted_rects.first().map(|(_, rect)| rect.h).unwrap_or(0);
        for (_, rect) in sorted_rects.iter_mut() {
            if x > 0 && x + rect.w > self.width {
                y += max_h;
                x = 0;
                max_h = rect.h;
            }
            rect.x = x;
            rect.y = y;
            x += rect.w;
        }
        self.height = (y + max_h).max(1);
        log::debug!(
            "packed {} rects into a {}x{} atlas",
            self.rects.len(),
            self.width,
            self.height
        );
    }

    pub fn get_rect(&self, handle: RectHandle) -> Option<&Rect> {
        self.rects.get(handle.0)
    }

    /// Returns [x0, y0, x1, y1], the rect's corners as fractions of the atlas size.
    pub fn uv(&self, handle: RectHandle) -> Option<[f32; 4]> {
        let rect = self.get_rect(handle)?;
        Some([
            rect.x as f32 / self.width as f32,
            rect.y as f32 / self.height as f32,
            (rect.x + rect.w) as f32 / self.width as f32,
            (rect.y + rect.h) as f32 / self.height as f32,
        ])
    }
}

impl Default for Atlas {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_rects_stay_inside_and_apart() {
        let mut atlas = Atlas::new();
        // roughly the LetterImages set, plus an odd wide one
        let mut handles: Vec<RectHandle> = (0..23).map(|_| atlas.add(12, 18)).collect();
        handles.push(atlas.add(40, 5));
        handles.push(atlas.add(3, 25));
        atlas.pack();

        let rects: Vec<Rect> = handles
            .iter()
            .map(|handle| *atlas.get_rect(*handle).unwrap())
            .collect();

        for (i, a) in rects.iter().enumerate() {
            assert!(a.x + a.w <= atlas.width, "{:?} past width {}", a, atlas.width);
            assert!(a.y + a.h <= atlas.height, "{:?} past height {}", a, atlas.height);
            for b in &rects[i + 1..] {
                assert!(!a.overlaps(b), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn wide_rect_widens_the_atlas() {
        let mut atlas = Atlas::new();
        atlas.add(100, 1);
        atlas.add(1, 1);
        atlas.pack();
        assert!(atlas.width >= 100);
    }

    #[test]
    fn fresh_atlas_is_one_pixel() {
        let atlas = Atlas::new();
        assert_eq!((atlas.width, atlas.height), (1, 1));
    }

    #[test]
    fn empty_atlas_packs_to_one_pixel() {
        let mut atlas = Atlas::new();
        atlas.pack();
        assert_eq!((atlas.width, atlas.height), (1, 1));
        assert!(atlas.is_empty());
    }

    #[test]
    fn uv_is_fractional_rect() {
        let mut atlas = Atlas::new();
        let handle = atlas.add(4, 4);
        atlas.pack();
        assert_eq!(atlas.uv(handle), Some([0.0, 0.0, 1.0, 1.0]));
    }
}
