use ab_glyph::FontVec;
use anyhow::{Context, Result, anyhow};
use encodex_core::{KeyPress, Screen};
use encodex_experiment::{SessionSummary, StudyEvent, StudyStateMachine};
use encodex_render::SkiaRenderer;
use encodex_session::OutputStore;
use encodex_timing::{AbortToken, HighPrecisionTimer, Timer};
use pixels::{Pixels, SurfaceTexture};
use std::sync::Arc;
use std::time::Duration;
use tiny_skia::Pixmap;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

/// Deadlines closer than this are met with a precise sleep instead of the event loop.
const SLEEP_WINDOW: Duration = Duration::from_millis(2);

pub type Study = StudyStateMachine<HighPrecisionTimer, OutputStore>;

/// How the session ended, for the exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Aborted,
}

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    study: Study,
    renderer: Option<SkiaRenderer>,
    assets: Option<(FontVec, Vec<Pixmap>)>,
    abort: AbortToken,
    frame_timer: HighPrecisionTimer,
    scale_factor: f64,
    refresh_rate: Option<f64>,

    error: Option<anyhow::Error>,
    should_exit: bool,
}

impl App {
    pub fn new(study: Study, abort: AbortToken, font: FontVec, stimuli: Vec<Pixmap>) -> Self {
        Self {
            window: None,
            pixels: None,
            study,
            renderer: None,
            assets: Some((font, stimuli)),
            abort,
            frame_timer: HighPrecisionTimer::new(),
            scale_factor: 1.0,
            refresh_rate: None,
            error: None,
            should_exit: false,
        }
    }

    pub fn run(mut self) -> Result<Outcome> {
        #[cfg(target_os = "windows")]
        unsafe {
            let _ = windows::Win32::Media::timeBeginPeriod(1);
        }

        let event_loop = EventLoop::new()?;
        log::info!("Platform: {} ({})", std::env::consts::OS, std::env::consts::ARCH);
        let result = event_loop.run_app(&mut self);

        #[cfg(target_os = "windows")]
        unsafe {
            let _ = windows::Win32::Media::timeEndPeriod(1);
        }

        result?;
        if let Some(err) = self.error.take() {
            return Err(err);
        }

        for row in self.study.results() {
            log::debug!(
                "{},{},{},{},{},{}",
                row.trial,
                row.image,
                row.degradation,
                row.response.as_deref().unwrap_or(""),
                row.rt.map(|rt| format!("{rt:.3}")).unwrap_or_default(),
                row.category
            );
        }
        let summary = SessionSummary::from_results(self.study.results());
        log::info!("{summary}");
        let frames = self.frame_timer.frame_stats();
        if frames.frames > 0 {
            log::info!(
                "Frames: {}, mean {:.3} ms, jitter {:.3} ms, max {:.3} ms",
                frames.frames,
                frames.average_frame_time_ns / 1e6,
                frames.jitter_ns / 1e6,
                frames.max_frame_time_ns / 1e6
            );
        }

        if self.study.was_aborted() {
            log::warn!(
                "Session aborted after {} of {} trials; {} rows kept in {}",
                self.study.results().len(),
                self.study.trials().len(),
                self.study.sink().rows(),
                self.study.sink().path().display()
            );
            Ok(Outcome::Aborted)
        } else if self.study.is_done() {
            log::info!("Results saved to {}", self.study.sink().path().display());
            Ok(Outcome::Completed)
        } else {
            Err(anyhow!("event loop stopped before the session finished"))
        }
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary_monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow!("No monitor available"))?;

        self.refresh_rate = primary_monitor
            .refresh_rate_millihertz()
            .map(|rate| rate as f64 / 1000.0);

        let mut window_attributes = Window::default_attributes()
            .with_title("Encodex")
            .with_resizable(false);
        if self.study.config.fullscreen {
            window_attributes = window_attributes
                .with_fullscreen(Some(Fullscreen::Borderless(Some(primary_monitor.clone()))));
        }

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        self.scale_factor = window.scale_factor();

        log::info!(
            "Display: {}x{}, scale factor {:.2}{}",
            physical_size.width,
            physical_size.height,
            self.scale_factor,
            self.refresh_rate
                .map(|hz| format!(", refresh rate {hz:.1} Hz"))
                .unwrap_or_default()
        );

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(
            Pixels::new(physical_size.width, physical_size.height, surface_texture)
                .context("failed to create frame buffer")?,
        );

        let (font, stimuli) = self
            .assets
            .take()
            .ok_or_else(|| anyhow!("renderer assets already consumed"))?;
        let mut renderer =
            SkiaRenderer::new(physical_size.width, physical_size.height, font, stimuli)?;
        let text = &self.study.config.text;
        renderer.warm_text([
            text.welcome.as_str(),
            text.instructions.as_str(),
            text.task.as_str(),
            text.indoor_feedback.as_str(),
            text.outdoor_feedback.as_str(),
            text.no_response_feedback.as_str(),
            text.farewell.as_str(),
        ]);
        self.renderer = Some(renderer);

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };
        let screen = self.study.screen();
        let showing_stimulus = matches!(screen, Screen::Image(_));
        let timer = &mut self.frame_timer;

        let stats = renderer.render_frame(screen, pixels.frame_mut(), timer)?;
        let t = timer.now();
        pixels.render().context("failed to present frame")?;
        log::trace!(
            "frame: draw {:.3} ms, copy {:.3} ms, present {:.3} ms, total {:.3} ms",
            stats.draw.as_secs_f64() * 1e3,
            stats.copy.as_secs_f64() * 1e3,
            timer.elapsed(t).as_secs_f64() * 1e3,
            stats.total.as_secs_f64() * 1e3
        );

        // The image is on screen once present returns; RT starts here.
        if showing_stimulus {
            self.study.mark_presented();
        }
        Ok(())
    }

    /// Every state change alters what is on screen.
    fn apply(&mut self, events: Vec<StudyEvent>) {
        if events.is_empty() {
            return;
        }
        if events.contains(&StudyEvent::Finished) {
            log::info!("All {} trials done", self.study.results().len());
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn handle_input(&mut self, event: &KeyEvent) -> Result<()> {
        let key = key_press(event.physical_key, &event.logical_key);
        if let KeyPress::Char(c) = key {
            if c.to_ascii_lowercase() == self.study.config.abort_key.to_ascii_lowercase() {
                self.abort.cancel();
            }
        }
        let events = self.study.handle_key(key)?;
        self.apply(events);
        Ok(())
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) -> Result<()> {
        if new_size.width == 0 || new_size.height == 0 {
            return Ok(());
        }
        if let Some(pixels) = &mut self.pixels {
            pixels
                .resize_surface(new_size.width, new_size.height)
                .context("failed to resize surface")?;
            pixels
                .resize_buffer(new_size.width, new_size.height)
                .context("failed to resize frame buffer")?;
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(new_size.width, new_size.height)?;
        }
        log::info!("Display resized to {}x{}", new_size.width, new_size.height);
        if let Some(window) = &self.window {
            window.request_redraw();
        }
        Ok(())
    }

    fn fail(&mut self, err: anyhow::Error, event_loop: &ActiveEventLoop) {
        self.error = Some(err);
        self.cleanup_and_exit(event_loop);
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        self.should_exit = true;
        event_loop.exit();
    }
}

/// Response digits are matched by physical key, so Shift or a non-QWERTY layout
/// still yields `1`/`2`. Everything else goes by the logical character.
fn key_press(physical: PhysicalKey, logical: &Key) -> KeyPress {
    match physical {
        PhysicalKey::Code(KeyCode::Digit1 | KeyCode::Numpad1) => return KeyPress::Char('1'),
        PhysicalKey::Code(KeyCode::Digit2 | KeyCode::Numpad2) => return KeyPress::Char('2'),
        _ => {}
    }
    match logical {
        Key::Character(s) => s.chars().next().map_or(KeyPress::Other, KeyPress::Char),
        _ => KeyPress::Other,
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                self.fail(e.context("failed to create window and surface"), event_loop);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let result = match event {
            WindowEvent::CloseRequested => {
                self.abort.cancel();
                Ok(())
            }
            WindowEvent::RedrawRequested => self.render(),
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() && !event.repeat => {
                self.handle_input(&event)
            }
            WindowEvent::Resized(sz) => self.handle_resize(sz),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                match self.window.as_ref().map(|w| w.inner_size()) {
                    Some(size) => self.handle_resize(size),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        };
        if let Err(e) = result {
            self.fail(e, event_loop);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
            return;
        }

        match self.study.update() {
            Ok(events) => self.apply(events),
            Err(e) => return self.fail(e, event_loop),
        }
        if self.study.is_done() {
            self.cleanup_and_exit(event_loop);
            return;
        }

        let control_flow = match self.study.next_deadline() {
            Some(deadline) => {
                let remaining = self.study.timer.remaining(deadline);
                if remaining <= SLEEP_WINDOW {
                    self.study.timer.sleep(remaining);
                    ControlFlow::Poll
                } else {
                    ControlFlow::WaitUntil(self.study.timer.instant_at(deadline) - SLEEP_WINDOW)
                }
            }
            None => ControlFlow::Wait,
        };
        event_loop.set_control_flow(control_flow);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::{NamedKey, NativeKeyCode};

    #[test]
    fn digit_row_counts_regardless_of_shift_or_layout() {
        let one = PhysicalKey::Code(KeyCode::Digit1);
        assert_eq!(key_press(one, &Key::Character("1".into())), KeyPress::Char('1'));
        // Shift+1 on QWERTY
        assert_eq!(key_press(one, &Key::Character("!".into())), KeyPress::Char('1'));
        // Unshifted top row on AZERTY
        assert_eq!(key_press(one, &Key::Character("&".into())), KeyPress::Char('1'));
        assert_eq!(
            key_press(PhysicalKey::Code(KeyCode::Digit2), &Key::Character("é".into())),
            KeyPress::Char('2')
        );
    }

    #[test]
    fn keypad_digits_count_as_responses() {
        assert_eq!(
            key_press(PhysicalKey::Code(KeyCode::Numpad2), &Key::Named(NamedKey::ArrowDown)),
            KeyPress::Char('2')
        );
    }

    #[test]
    fn other_keys_go_by_character() {
        assert_eq!(
            key_press(PhysicalKey::Code(KeyCode::KeyQ), &Key::Character("q".into())),
            KeyPress::Char('q')
        );
        // AZERTY 'a' sits where QWERTY has 'q'
        assert_eq!(
            key_press(PhysicalKey::Code(KeyCode::KeyQ), &Key::Character("a".into())),
            KeyPress::Char('a')
        );
        assert_eq!(
            key_press(
                PhysicalKey::Unidentified(NativeKeyCode::Unidentified),
                &Key::Named(NamedKey::Space)
            ),
            KeyPress::Other
        );
    }
}
