use anyhow::{Context, Result, anyhow};
use encodex_core::TrialDescriptor;
use std::path::Path;
use tiny_skia::{IntSize, Pixmap};

/// Decodes one stimulus into a premultiplied pixmap.
pub fn load_stimulus(path: &Path) -> Result<Pixmap> {
    let image = image::open(path)
        .with_context(|| format!("failed to decode stimulus {}", path.display()))?
        .into_rgba8();
    let (width, height) = image.dimensions();
    let mut data = image.into_raw();

    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 255 {
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }

    let size = IntSize::from_wh(width, height)
        .ok_or_else(|| anyhow!("stimulus {} has no pixels", path.display()))?;
    Pixmap::from_vec(data, size)
        .ok_or_else(|| anyhow!("stimulus {} has an invalid pixel buffer", path.display()))
}

/// Loads every selected stimulus up front, in trial order.
pub fn load_stimuli(image_dir: &Path, trials: &[TrialDescriptor]) -> Result<Vec<Pixmap>> {
    trials
        .iter()
        .map(|trial| load_stimulus(&image_dir.join(&trial.image)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn premultiplies_translucent_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("half.png");
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([200, 100, 50, 255]));
        img.put_pixel(1, 0, Rgba([200, 100, 50, 128]));
        img.save(&path).unwrap();

        let pm = load_stimulus(&path).unwrap();
        assert_eq!((pm.width(), pm.height()), (2, 1));
        let opaque = pm.pixel(0, 0).unwrap();
        assert_eq!(
            (opaque.red(), opaque.green(), opaque.blue(), opaque.alpha()),
            (200, 100, 50, 255)
        );
        let half = pm.pixel(1, 0).unwrap();
        assert_eq!(
            (half.red(), half.green(), half.blue(), half.alpha()),
            (100, 50, 25, 128)
        );
    }

    #[test]
    fn missing_image_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let trials = vec![TrialDescriptor::new("nope.png", "none")];
        let err = load_stimuli(dir.path(), &trials).unwrap_err();
        assert!(format!("{err:#}").contains("nope.png"));
    }
}
