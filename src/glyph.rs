use anyhow::{ensure, Result};

/// Integer (x, y) pair. Used for glyph pixel sizes as well as screen coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntVec2 {
    pub x: i32,
    pub y: i32,
}

impl IntVec2 {
    pub const ZERO: IntVec2 = IntVec2 { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlyphIndex(pub usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphEntry {
    /// Name of the image this glyph was loaded from.
    pub name: String,
    pub size: IntVec2,
}

impl GlyphEntry {
    pub fn new(name: &str, size: IntVec2) -> Self {
        debug_assert!(
            size.x >= 0 && size.y >= 0,
            "glyph {} has a negative size {:?}",
            name,
            size
        );
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Fixed table of glyphs. The last entry is always the "unknown" glyph that
/// unmapped characters fall back to.
#[derive(Clone, Debug)]
pub struct GlyphSet {
    entries: Vec<GlyphEntry>,
}

impl GlyphSet {
    pub fn new(entries: Vec<GlyphEntry>) -> Result<Self> {
        ensure!(
            !entries.is_empty(),
            "A glyph set needs at least the unknown glyph."
        );
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // never true, `new` refuses an empty table
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unknown_index(&self) -> GlyphIndex {
        GlyphIndex(self.entries.len() - 1)
    }

    pub fn get(&self, index: GlyphIndex) -> Option<&GlyphEntry> {
        self.entries.get(index.0)
    }

    /// Size of the glyph at `index`, or of the unknown glyph if `index` is out of range.
    pub fn size(&self, index: GlyphIndex) -> IntVec2 {
        self.get(index)
            .or_else(|| self.entries.last())
            .map(|entry| entry.size)
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GlyphIndex, &GlyphEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (GlyphIndex(idx), entry))
    }
}

/// Maps the characters `first..=last` onto consecutive glyph indices starting at `base`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphRange {
    pub first: char,
    pub last: char,
    pub base: usize,
}

impl GlyphRange {
    pub const fn new(first: char, last: char, base: usize) -> Self {
        Self { first, last, base }
    }

    pub const fn single(character: char, index: usize) -> Self {
        Self::new(character, character, index)
    }

    pub fn index_of(&self, character: char) -> Option<GlyphIndex> {
        if !(self.first..=self.last).contains(&character) {
            return None;
        }
        // a base near usize::MAX can't be indexed, treat it as unmapped
        self.base
            .checked_add(character as usize - self.first as usize)
            .map(GlyphIndex)
    }

    /// Index one past the last index this range produces.
    pub fn end(&self) -> usize {
        self.base
            .saturating_add((self.last as usize).saturating_sub(self.first as usize))
            .saturating_add(1)
    }
}

/// Digits then the uppercase letters A through L. Anything else, lowercase
/// included, is unknown. Extend with another range (e.g. a space glyph) to
/// cover more characters.
pub const DEFAULT_RANGES: &[GlyphRange] = &[
    GlyphRange::new('0', '9', 0),
    GlyphRange::new('A', 'L', 10),
];

/// Index of the unknown glyph in the default 23 entry table.
pub const DEFAULT_UNKNOWN_INDEX: GlyphIndex = GlyphIndex(22);

#[derive(Clone, Debug)]
pub struct GlyphIndexResolver {
    ranges: Vec<GlyphRange>,
    unknown: GlyphIndex,
}

impl GlyphIndexResolver {
    pub fn new(ranges: &[GlyphRange], unknown: GlyphIndex) -> Self {
        Self {
            ranges: ranges.to_vec(),
            unknown,
        }
    }

    /// Resolver over [DEFAULT_RANGES] whose fallback is the glyph set's unknown entry.
    pub fn for_glyph_set(glyphs: &GlyphSet) -> Self {
        Self::new(DEFAULT_RANGES, glyphs.unknown_index())
    }

    pub fn with_range(mut self, range: GlyphRange) -> Self {
        self.ranges.push(range);
        self
    }

    // first matching range wins
    pub fn resolve(&self, character: char) -> GlyphIndex {
        self.ranges
            .iter()
            .find_map(|range| range.index_of(character))
            .unwrap_or(self.unknown)
    }

    /// Checks that every index this resolver can produce exists in `glyphs`.
    pub fn check(&self, glyphs: &GlyphSet) -> Result<()> {
        ensure!(
            self.unknown.0 < glyphs.len(),
            "Unknown glyph index {} is outside a table of {} glyphs.",
            self.unknown.0,
            glyphs.len()
        );
        for range in &self.ranges {
            ensure!(
                range.end() <= glyphs.len(),
                "Range {:?}..={:?} needs {} glyphs but the table has {}.",
                range.first,
                range.last,
                range.end(),
                glyphs.len()
            );
        }
        Ok(())
    }
}

impl Default for GlyphIndexResolver {
    fn default() -> Self {
        Self::new(DEFAULT_RANGES, DEFAULT_UNKNOWN_INDEX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(len: usize) -> GlyphSet {
        GlyphSet::new(
            (0..len)
                .map(|idx| GlyphEntry::new(&format!("{}.png", idx), IntVec2::new(10, 16)))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn every_byte_resolves_inside_the_table() {
        let glyphs = table(23);
        let resolver = GlyphIndexResolver::for_glyph_set(&glyphs);
        for code in 0u8..=255 {
            let index = resolver.resolve(char::from(code));
            assert!(index.0 < glyphs.len(), "{} -> {:?}", code, index);
        }
    }

    #[test]
    fn digits_map_to_their_value() {
        let resolver = GlyphIndexResolver::default();
        for d in '0'..='9' {
            assert_eq!(resolver.resolve(d), GlyphIndex(d as usize - '0' as usize));
        }
    }

    #[test]
    fn letters_follow_digits() {
        let resolver = GlyphIndexResolver::default();
        for c in 'A'..='L' {
            assert_eq!(
                resolver.resolve(c),
                GlyphIndex(c as usize - 'A' as usize + 10)
            );
        }
    }

    #[test]
    fn unsupported_characters_fall_back() {
        let resolver = GlyphIndexResolver::default();
        for c in [':', '@', 'M', 'Z', ' ', 'a', 'l', '/', '\0', 'é', '\u{10FFFF}'] {
            assert_eq!(resolver.resolve(c), DEFAULT_UNKNOWN_INDEX, "{:?}", c);
        }
    }

    #[test]
    fn space_resolves_once_the_table_has_one() {
        let glyphs = table(24);
        let resolver = GlyphIndexResolver::new(DEFAULT_RANGES, GlyphIndex(22))
            .with_range(GlyphRange::single(' ', 23));

        assert_eq!(resolver.resolve(' '), GlyphIndex(23));
        assert_eq!(resolver.resolve('?'), GlyphIndex(22));
        assert!(resolver.check(&glyphs).is_ok());
    }

    #[test]
    fn check_rejects_short_tables() {
        let resolver = GlyphIndexResolver::default();
        assert!(resolver.check(&table(23)).is_ok());
        assert!(resolver.check(&table(22)).is_err());
        assert!(resolver.check(&table(12)).is_err());
    }

    #[test]
    fn range_past_usize_max_falls_back_to_unknown() {
        let resolver = GlyphIndexResolver::new(
            &[GlyphRange::new('A', 'L', usize::MAX - 1)],
            DEFAULT_UNKNOWN_INDEX,
        );
        assert_eq!(resolver.resolve('A'), GlyphIndex(usize::MAX - 1));
        assert_eq!(resolver.resolve('B'), GlyphIndex(usize::MAX));
        assert_eq!(resolver.resolve('C'), DEFAULT_UNKNOWN_INDEX);
        assert_eq!(resolver.resolve('L'), DEFAULT_UNKNOWN_INDEX);
        assert!(resolver.check(&table(23)).is_err());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "negative size")]
    fn negative_glyph_size_is_rejected_in_debug() {
        GlyphEntry::new("0.png", IntVec2::new(-1, 16));
    }

    #[test]
    fn glyph_set_keeps_unknown_last() {
        let glyphs = table(23);
        assert_eq!(glyphs.unknown_index(), DEFAULT_UNKNOWN_INDEX);
        assert!(GlyphSet::new(Vec::new()).is_err());
    }

    #[test]
    fn size_out_of_range_uses_unknown_glyph() {
        let mut entries = vec![GlyphEntry::new("0.png", IntVec2::new(4, 4))];
        entries.push(GlyphEntry::new("QMark.png", IntVec2::new(7, 9)));
        let glyphs = GlyphSet::new(entries).unwrap();

        assert_eq!(glyphs.size(GlyphIndex(0)), IntVec2::new(4, 4));
        assert_eq!(glyphs.size(GlyphIndex(40)), IntVec2::new(7, 9));
    }
}
