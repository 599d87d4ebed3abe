use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Result;
use log::{error, info};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

pub trait AppLoop: Sized {
    fn init(window: Arc<Window>) -> Result<Self>;

    fn draw(&mut self) -> Result<()>;

    fn resized(&mut self, _new_size: PhysicalSize<u32>) -> Result<()> {
        Ok(())
    }
}

pub struct App {
    title: String,
    window_size: (u32, u32),
    frame_rate: f32,
}

impl App {
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_framerate(mut self, frame_rate: f32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Whole milliseconds per frame, 16 at 60 fps.
    pub fn frame_duration(&self) -> Duration {
        Duration::from_millis((1000.0 / self.frame_rate.max(1.0)) as u64)
    }

    pub fn run<T: AppLoop>(self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        let mut runner = Runner::<T> {
            last_frame: Instant::now(),
            app: self,
            window: None,
            app_loop: None,
            error: None,
        };

        event_loop.run_app(&mut runner)?;

        match runner.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct Runner<T> {
    app: App,
    window: Option<Arc<Window>>,
    app_loop: Option<T>,
    last_frame: Instant,
    error: Option<anyhow::Error>,
}

impl<T: AppLoop> Runner<T> {
    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let (width, height) = self.app.window_size;
        let window = Arc::new(
            event_loop.create_window(
                Window::default_attributes()
                    .with_title(self.app.title.clone())
                    .with_inner_size(PhysicalSize::new(width, height))
                    .with_resizable(false),
            )?,
        );
        self.app_loop = Some(T::init(window.clone())?);
        self.window = Some(window);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{:#}", err);
        self.error = Some(err);
        event_loop.exit();
    }
}

impl<T: AppLoop> ApplicationHandler for Runner<T> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(app_loop) = self.app_loop.as_mut() else {
            return;
        };

        let result = match event {
            WindowEvent::CloseRequested => {
                info!("close requested, quitting");
                event_loop.exit();
                Ok(())
            }
            WindowEvent::Resized(new_size) => app_loop.resized(new_size),
            WindowEvent::RedrawRequested => app_loop.draw(),
            _ => Ok(()),
        };

        if let Err(err) = result {
            self.fail(event_loop, err);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let frame_duration = self.app.frame_duration();
        if self.last_frame.elapsed() >= frame_duration {
            self.last_frame = Instant::now();
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.last_frame + frame_duration));
    }
}

pub fn make_window() -> App {
    // RUST_LOG overrides the default
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    App {
        title: "bitglyph".into(),
        window_size: (640, 480),
        frame_rate: 60.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixty_fps_is_sixteen_ms() {
        let app = make_window().with_framerate(60.0);
        assert_eq!(app.frame_duration(), Duration::from_millis(16));
    }

    #[test]
    fn builder_overrides_defaults() {
        let app = make_window()
            .with_title("Font Demo!")
            .with_window_size((320, 200))
            .with_framerate(30.0);
        assert_eq!(app.title, "Font Demo!");
        assert_eq!(app.window_size, (320, 200));
        assert_eq!(app.frame_duration(), Duration::from_millis(33));
    }
}
