use std::sync::Arc;

use anyhow::Result;
use bitglyph::{
    camera::Camera,
    font::{BitmapFont, GlyphImages, LETTER_FOLDER},
    glyph::IntVec2,
    render::{PhysicalSize, Render, Window},
    text::TextPipeline,
    window::{make_window, AppLoop},
};
use wgpu::Color;

const SCREEN_RESOLUTION: (u32, u32) = (640, 480);

// 16ms frames
const FPS: f32 = 60.0;

const TEST_STRING: &str = "A0A0A0BE334C3D0C";

const STRING_POSITION: IntVec2 = IntVec2::new(32, 64);

// the glyphs are black, so anything but black
const BACKGROUND: Color = Color {
    r: 1.0,
    g: 200.0 / 255.0,
    b: 200.0 / 255.0,
    a: 1.0,
};

struct FontDemo {
    render: Render,
    text: TextPipeline,
    camera: Camera,
    font: BitmapFont,
}

impl AppLoop for FontDemo {
    fn init(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();
        let mut render = Render::new(window)?;
        render.set_clear_color(BACKGROUND);

        let text = TextPipeline::new(&mut render)?;
        let camera = Camera::new(size.width, size.height);
        text.update_camera(&mut render, &camera)?;

        let images = GlyphImages::load(LETTER_FOLDER)?;
        let font = BitmapFont::upload(&mut render, images)?;

        Ok(Self {
            render,
            text,
            camera,
            font,
        })
    }

    fn draw(&mut self) -> Result<()> {
        let placements = self.font.layout().layout(STRING_POSITION, TEST_STRING);
        self.text.queue(&mut self.render, &self.font, &placements)?;
        self.render.draw()
    }

    fn resized(&mut self, new_size: PhysicalSize<u32>) -> Result<()> {
        self.render.resize(new_size);
        self.camera.resize(new_size.width, new_size.height);
        self.text.update_camera(&mut self.render, &self.camera)
    }
}

fn main() -> Result<()> {
    make_window()
        .with_title("Font Demo!")
        .with_window_size(SCREEN_RESOLUTION)
        .with_framerate(FPS)
        .run::<FontDemo>()
}
