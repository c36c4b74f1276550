pub mod font;
pub mod render;
pub mod stimulus;
pub mod text;

pub use font::load_font;
pub use render::{FrameTiming, SkiaRenderer, background, draw_centered, draw_fixation};
pub use stimulus::{load_stimuli, load_stimulus};
pub use text::{render_text_pixmap, wrap_text};
