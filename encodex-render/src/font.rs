use ab_glyph::FontVec;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

/// Common install locations, tried in order when no font is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

fn parse(path: &Path) -> Result<FontVec> {
    let bytes = fs::read(path).with_context(|| format!("failed to read font {}", path.display()))?;
    FontVec::try_from_vec(bytes)
        .with_context(|| format!("{} is not a usable TrueType/OpenType font", path.display()))
}

/// Loads the configured font, or the first system font that parses.
pub fn load_font(configured: Option<&Path>) -> Result<FontVec> {
    if let Some(path) = configured {
        return parse(path);
    }

    for candidate in SYSTEM_FONTS.iter().map(PathBuf::from) {
        if !candidate.is_file() {
            continue;
        }
        match parse(&candidate) {
            Ok(font) => {
                log::info!("Using font {}", candidate.display());
                return Ok(font);
            }
            Err(e) => log::warn!("Skipping font: {e:#}"),
        }
    }
    bail!("no usable font found; set font_path in the config file")
}
