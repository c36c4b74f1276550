use ab_glyph::{Font, Glyph, PxScale, PxScaleFont, ScaleFont, point};
use tiny_skia::{Color, Pixmap, PremultipliedColorU8};

/// Advance width of a single line, kerning included
pub fn line_width<F: Font>(sf: &PxScaleFont<F>, line: &str) -> f32 {
    let mut width = 0.0f32;
    let mut prev = None;
    for ch in line.chars() {
        let id = sf.glyph_id(ch);
        if let Some(prev) = prev {
            width += sf.kern(prev, id);
        }
        width += sf.h_advance(id);
        prev = Some(id);
    }
    width
}

/// Splits on explicit newlines, then greedily wraps words that overflow `max_width`.
/// Lines that already fit keep their spacing untouched.
pub fn wrap_text<F: Font>(sf: &PxScaleFont<F>, text: &str, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        if line_width(sf, paragraph) <= max_width {
            lines.push(paragraph.to_string());
            continue;
        }

        let mut current = String::new();
        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if line_width(sf, &candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        lines.push(current);
    }
    lines
}

/// Rasterizes centered, wrapped text onto a transparent premultiplied pixmap.
pub fn render_text_pixmap<F: Font>(
    text: &str,
    font_size: f32,
    font: &F,
    color: Color,
    max_width: f32,
) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    let lines = wrap_text(&sf, text, max_width);
    let widths: Vec<f32> = lines.iter().map(|l| line_width(&sf, l)).collect();
    let line_height = (sf.height() + sf.line_gap()).ceil();

    let w = widths.iter().cloned().fold(1.0f32, f32::max).ceil() as u32;
    let h = (line_height * lines.len() as f32).ceil().max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;

    let cu = color.to_color_u8();
    let stride = pm.width() as usize;
    let dst = pm.pixels_mut();

    for (row, (line, line_w)) in lines.iter().zip(&widths).enumerate() {
        let baseline = sf.ascent() + row as f32 * line_height;
        let mut pen_x = (w as f32 - line_w) * 0.5;
        let mut prev = None;

        for ch in line.chars() {
            let id = sf.glyph_id(ch);
            if let Some(prev) = prev {
                pen_x += sf.kern(prev, id);
            }
            let glyph = Glyph {
                id,
                scale,
                position: point(pen_x, baseline),
            };
            pen_x += sf.h_advance(id);
            prev = Some(id);

            let Some(outlined) = sf.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|x, y, cov| {
                if cov <= f32::EPSILON {
                    return;
                }
                let ix = bounds.min.x as i32 + x as i32;
                let iy = bounds.min.y as i32 + y as i32;
                if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                    return;
                }
                let i = iy as usize * stride + ix as usize;

                // Porter-Duff over in premultiplied space: out = src + bg * (1 - src.a)
                let a = (cov.min(1.0) * cu.alpha() as f32 / 255.0).clamp(0.0, 1.0);
                let sr = (cu.red() as f32 * a) as u8;
                let sg = (cu.green() as f32 * a) as u8;
                let sb = (cu.blue() as f32 * a) as u8;
                let sa = (a * 255.0) as u8;

                let bg = dst[i];
                let inv = 1.0 - a;
                let r = sr.saturating_add((bg.red() as f32 * inv) as u8);
                let g = sg.saturating_add((bg.green() as f32 * inv) as u8);
                let b = sb.saturating_add((bg.blue() as f32 * inv) as u8);
                let a = sa.saturating_add((bg.alpha() as f32 * inv) as u8);

                if let Some(px) = PremultipliedColorU8::from_rgba(r.min(a), g.min(a), b.min(a), a) {
                    dst[i] = px;
                }
            });
        }
    }

    Some(pm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::load_font;

    // Layout depends on real glyph metrics; hosts without a system font skip.
    fn font() -> Option<ab_glyph::FontVec> {
        load_font(None).ok()
    }

    #[test]
    fn short_lines_are_kept_whole() {
        let Some(font) = font() else { return };
        let sf = font.as_scaled(PxScale::from(20.0));
        assert_eq!(wrap_text(&sf, "Hello there", 1000.0), vec!["Hello there"]);
        assert_eq!(wrap_text(&sf, "one\n\ntwo", 1000.0), vec!["one", "", "two"]);
    }

    #[test]
    fn long_lines_wrap_on_words() {
        let Some(font) = font() else { return };
        let sf = font.as_scaled(PxScale::from(20.0));
        let max = line_width(&sf, "press one for") + 1.0;
        let lines = wrap_text(&sf, "press one for indoor scenes", max);
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), "press one for indoor scenes");
        for line in &lines {
            assert!(line_width(&sf, line) <= max);
        }
    }

    #[test]
    fn pixmap_grows_with_line_count() {
        let Some(font) = font() else { return };
        let one = render_text_pixmap("Welcome", 24.0, &font, Color::WHITE, 800.0).unwrap();
        let two = render_text_pixmap("Welcome\nagain", 24.0, &font, Color::WHITE, 800.0).unwrap();
        assert!(two.height() > one.height());
        assert!(one.pixels().iter().any(|p| p.alpha() > 0));
    }
}
