use crate::text::render_text_pixmap;
use ab_glyph::FontVec;
use anyhow::{Result, anyhow, bail};
use encodex_core::Screen;
use encodex_timing::{HighPrecisionTimer, Timer};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tiny_skia::{
    Color, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Transform,
};

pub fn background() -> Color {
    Color::from_rgba8(128, 128, 128, 255)
}

/// Text height and fixation radius, relative to window height
const TEXT_HEIGHT: f32 = 0.03;
const FIXATION_RADIUS: f32 = 0.01;
/// Wrap width relative to window width
const WRAP_WIDTH: f32 = 0.8;

#[derive(Debug, Clone, Copy)]
pub struct FrameTiming {
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
}

/// Rasterized messages, keyed by their text. Invalidated on resize since the
/// font size follows the window height.
struct TextCache {
    font: FontVec,
    size_px: f32,
    max_width: f32,
    map: HashMap<String, Arc<Pixmap>>,
}

impl TextCache {
    fn new(font: FontVec, size_px: f32, max_width: f32) -> Self {
        Self {
            font,
            size_px,
            max_width,
            map: HashMap::new(),
        }
    }

    fn get_or_render(&mut self, text: &str) -> Option<Arc<Pixmap>> {
        if let Some(p) = self.map.get(text) {
            return Some(Arc::clone(p));
        }
        let pm = Arc::new(render_text_pixmap(
            text,
            self.size_px,
            &self.font,
            Color::WHITE,
            self.max_width,
        )?);
        self.map.insert(text.to_string(), Arc::clone(&pm));
        Some(pm)
    }

    fn rescale(&mut self, size_px: f32, max_width: f32) {
        self.size_px = size_px;
        self.max_width = max_width;
        self.map.clear();
    }
}

pub struct SkiaRenderer {
    height: u32,
    canvas: Pixmap,
    text_cache: TextCache,
    stimuli: Vec<Pixmap>,
}

impl SkiaRenderer {
    /// `stimuli` are indexed the same way as `Screen::Image`.
    pub fn new(width: u32, height: u32, font: FontVec, stimuli: Vec<Pixmap>) -> Result<Self> {
        let mut canvas = Pixmap::new(width.max(1), height.max(1))
            .ok_or_else(|| anyhow!("cannot allocate a {width}x{height} canvas"))?;
        canvas.fill(background());
        let (size_px, max_width) = text_metrics(width, height);

        Ok(Self {
            height,
            canvas,
            text_cache: TextCache::new(font, size_px, max_width),
            stimuli,
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) -> Result<()> {
        self.canvas = Pixmap::new(new_width.max(1), new_height.max(1))
            .ok_or_else(|| anyhow!("cannot allocate a {new_width}x{new_height} canvas"))?;
        self.canvas.fill(background());
        self.height = new_height;

        let (size_px, max_width) = text_metrics(new_width, new_height);
        self.text_cache.rescale(size_px, max_width);
        Ok(())
    }

    /// Pre-rasterizes messages so the first frame showing them does not pay for layout.
    pub fn warm_text<'a>(&mut self, texts: impl IntoIterator<Item = &'a str>) {
        for text in texts {
            self.text_cache.get_or_render(text);
        }
    }

    pub fn draw_screen(&mut self, screen: Screen<'_>) -> Result<()> {
        self.canvas.fill(background());
        match screen {
            Screen::Text(text) => {
                if let Some(pm) = self.text_cache.get_or_render(text) {
                    draw_centered(&mut self.canvas, &pm);
                }
            }
            Screen::Fixation => {
                let radius = self.height as f32 * FIXATION_RADIUS;
                draw_fixation(&mut self.canvas, radius);
            }
            Screen::Image(index) => {
                let stimulus = self
                    .stimuli
                    .get(index)
                    .ok_or_else(|| anyhow!("no stimulus loaded for trial slot {index}"))?;
                draw_centered(&mut self.canvas, stimulus);
            }
            Screen::Blank => {}
        }
        Ok(())
    }

    pub fn render_frame(
        &mut self,
        screen: Screen<'_>,
        frame_buffer: &mut [u8],
        timer: &mut HighPrecisionTimer,
    ) -> Result<FrameTiming> {
        let start = timer.now();
        self.draw_screen(screen)?;
        let draw = timer.elapsed(start);

        let data = self.canvas.data();
        if frame_buffer.len() != data.len() {
            bail!(
                "frame buffer holds {} bytes, canvas needs {}",
                frame_buffer.len(),
                data.len()
            );
        }
        let t = timer.now();
        frame_buffer.copy_from_slice(data);
        let copy = timer.elapsed(t);

        let total = draw + copy;
        timer.record_frame(total);
        Ok(FrameTiming { draw, copy, total })
    }
}

fn text_metrics(width: u32, height: u32) -> (f32, f32) {
    (
        (height as f32 * TEXT_HEIGHT).max(8.0),
        (width as f32 * WRAP_WIDTH).max(1.0),
    )
}

/// Filled dot at the canvas center
pub fn draw_fixation(canvas: &mut Pixmap, radius: f32) {
    let cx = canvas.width() as f32 * 0.5;
    let cy = canvas.height() as f32 * 0.5;

    let mut pb = PathBuilder::new();
    pb.push_circle(cx, cy, radius.max(1.0));
    let Some(path) = pb.finish() else {
        return;
    };

    let mut paint = Paint::default();
    paint.anti_alias = true;
    paint.set_color(Color::BLACK);
    canvas.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
}

/// Draws `src` centered, shrunk uniformly when it does not fit the canvas.
pub fn draw_centered(canvas: &mut Pixmap, src: &Pixmap) {
    let (cw, ch) = (canvas.width() as f32, canvas.height() as f32);
    let (sw, sh) = (src.width() as f32, src.height() as f32);
    let scale = (cw / sw).min(ch / sh).min(1.0);

    let x = ((cw - sw * scale) * 0.5).floor();
    let y = ((ch - sh * scale) * 0.5).floor();

    let paint = PixmapPaint {
        quality: if scale < 1.0 {
            FilterQuality::Bicubic
        } else {
            FilterQuality::Nearest
        },
        ..PixmapPaint::default()
    };
    let transform = Transform::from_row(scale, 0.0, 0.0, scale, x, y);
    canvas.draw_pixmap(0, 0, src.as_ref(), &paint, transform, None);
}
