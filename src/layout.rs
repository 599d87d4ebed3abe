use std::str::Chars;

use crate::glyph::{GlyphIndex, GlyphIndexResolver, GlyphSet, IntVec2};

/// Gap in pixels left between two neighbouring glyphs.
pub const DEFAULT_SPACING: i32 = 2;

/// Where one glyph of a laid out string goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub glyph: GlyphIndex,
    pub position: IntVec2,
}

/// Single line, left to right layout. Every character gets exactly one
/// [Placement], unknown characters included.
pub struct StringLayout<'a> {
    resolver: &'a GlyphIndexResolver,
    glyphs: &'a GlyphSet,
    spacing: i32,
}

impl<'a> StringLayout<'a> {
    pub fn new(resolver: &'a GlyphIndexResolver, glyphs: &'a GlyphSet) -> Self {
        Self {
            resolver,
            glyphs,
            spacing: DEFAULT_SPACING,
        }
    }

    pub fn with_spacing(mut self, spacing: i32) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn spacing(&self) -> i32 {
        self.spacing
    }

    pub fn placements<'t>(&self, start: IntVec2, text: &'t str) -> Placements<'a, 't> {
        Placements {
            resolver: self.resolver,
            glyphs: self.glyphs,
            spacing: self.spacing,
            chars: text.chars(),
            cursor: start.x,
            y: start.y,
        }
    }

    pub fn layout(&self, start: IntVec2, text: &str) -> Vec<Placement> {
        self.placements(start, text).collect()
    }

    /// Horizontal distance the cursor travels over `text`, trailing gap included.
    pub fn advance(&self, text: &str) -> i32 {
        text.chars().fold(0i32, |acc, character| {
            let glyph = self.resolver.resolve(character);
            acc.saturating_add(self.glyphs.size(glyph).x)
                .saturating_add(self.spacing)
        })
    }
}

pub struct Placements<'a, 't> {
    resolver: &'a GlyphIndexResolver,
    glyphs: &'a GlyphSet,
    spacing: i32,
    chars: Chars<'t>,
    cursor: i32,
    y: i32,
}

impl Iterator for Placements<'_, '_> {
    type Item = Placement;

    fn next(&mut self) -> Option<Self::Item> {
        let character = self.chars.next()?;
        let glyph = self.resolver.resolve(character);
        let placement = Placement {
            glyph,
            position: IntVec2::new(self.cursor, self.y),
        };
        // a glyph's own width only moves the glyphs after it
        self.cursor = self
            .cursor
            .saturating_add(self.glyphs.size(glyph).x)
            .saturating_add(self.spacing);
        Some(placement)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chars.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::glyph::{GlyphEntry, DEFAULT_UNKNOWN_INDEX};

    fn uniform(width: i32) -> GlyphSet {
        GlyphSet::new(
            (0..23)
                .map(|idx| GlyphEntry::new(&idx.to_string(), IntVec2::new(width, 16)))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn empty_text_places_nothing() {
        let glyphs = uniform(10);
        let resolver = GlyphIndexResolver::for_glyph_set(&glyphs);
        let layout = StringLayout::new(&resolver, &glyphs);

        assert!(layout.layout(IntVec2::new(32, 64), "").is_empty());
        assert_eq!(layout.advance(""), 0);
    }

    #[test]
    fn a0_at_32_64() {
        let glyphs = uniform(10);
        let resolver = GlyphIndexResolver::for_glyph_set(&glyphs);
        let layout = StringLayout::new(&resolver, &glyphs).with_spacing(2);

        assert_eq!(
            layout.layout(IntVec2::new(32, 64), "A0"),
            vec![
                Placement {
                    glyph: GlyphIndex(10),
                    position: IntVec2::new(32, 64),
                },
                Placement {
                    glyph: GlyphIndex(0),
                    position: IntVec2::new(44, 64),
                },
            ]
        );
    }

    #[test]
    fn unknown_glyph_sits_after_previous_width() {
        let mut entries: Vec<GlyphEntry> = (0..23)
            .map(|idx| GlyphEntry::new(&idx.to_string(), IntVec2::new(10, 16)))
            .collect();
        entries[9].size = IntVec2::new(7, 16);
        entries[22].size = IntVec2::new(30, 16);
        let glyphs = GlyphSet::new(entries).unwrap();
        let resolver = GlyphIndexResolver::for_glyph_set(&glyphs);
        let layout = StringLayout::new(&resolver, &glyphs);

        let placements = layout.layout(IntVec2::new(0, 5), "9:0");
        assert_eq!(placements[1].glyph, DEFAULT_UNKNOWN_INDEX);
        assert_eq!(placements[1].position, IntVec2::new(7 + DEFAULT_SPACING, 5));
        // the unknown glyph's width pushes the next one along
        assert_eq!(
            placements[2].position.x,
            7 + DEFAULT_SPACING + 30 + DEFAULT_SPACING
        );
    }

    #[test]
    fn one_placement_per_character() {
        let glyphs = uniform(3);
        let resolver = GlyphIndexResolver::for_glyph_set(&glyphs);
        let layout = StringLayout::new(&resolver, &glyphs);

        for text in ["", "A", "A0A0A0BE334C3D0C", "hello world", "??::", "ÄÖÜ"] {
            assert_eq!(
                layout.layout(IntVec2::ZERO, text).len(),
                text.chars().count(),
                "{:?}",
                text
            );
        }
    }

    #[test]
    fn x_strictly_increases_and_y_is_fixed() {
        let glyphs = uniform(5);
        let resolver = GlyphIndexResolver::for_glyph_set(&glyphs);
        let layout = StringLayout::new(&resolver, &glyphs).with_spacing(0);

        let placements = layout.layout(IntVec2::new(-20, 3), "A0A0A0BE334C3D0C");
        for pair in placements.windows(2) {
            assert!(pair[0].position.x < pair[1].position.x);
            assert_eq!(pair[1].position.y, 3);
        }
    }

    #[test]
    fn repeated_layout_is_identical() {
        let glyphs = uniform(8);
        let resolver = GlyphIndexResolver::for_glyph_set(&glyphs);
        let layout = StringLayout::new(&resolver, &glyphs);

        let start = IntVec2::new(32, 64);
        assert_eq!(
            layout.layout(start, "BE334C3D0C"),
            layout.layout(start, "BE334C3D0C")
        );
    }

    #[test]
    fn zero_width_glyphs_still_take_spacing() {
        let glyphs = uniform(0);
        let resolver = GlyphIndexResolver::for_glyph_set(&glyphs);
        let layout = StringLayout::new(&resolver, &glyphs);

        let xs: Vec<i32> = layout
            .placements(IntVec2::ZERO, "ABC")
            .map(|placement| placement.position.x)
            .collect();
        assert_eq!(xs, vec![0, 2, 4]);
        assert_eq!(layout.advance("ABC"), 6);
    }

    #[test]
    fn cursor_saturates_instead_of_overflowing() {
        let glyphs = uniform(i32::MAX);
        let resolver = GlyphIndexResolver::for_glyph_set(&glyphs);
        let layout = StringLayout::new(&resolver, &glyphs);

        let placements = layout.layout(IntVec2::new(1, 0), "AAA");
        assert_eq!(placements[2].position.x, i32::MAX);
    }
}
