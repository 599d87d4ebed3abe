pub mod atlas;
pub mod bind;
pub mod camera;
pub mod font;
pub mod geometry;
pub mod glyph;
pub mod instance;
pub mod layout;
pub mod pipeline;
pub mod plain;
pub mod render;
pub mod text;
pub mod texture;
pub mod window;

// two layers:
// - glyph + layout are plain data and never touch the gpu, everything about
//   where a character goes is decided there
// - the rest (render, text, atlas, ...) turns placements into draw calls
//
// the glyph table is built once at startup and only read after that, so it's
// passed around by reference rather than living in a global.
