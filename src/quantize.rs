use std::collections::HashMap;

use color_quant::NeuQuant;
use image::RgbaImage;

use crate::{
    RoundGifError, RoundGifResult,
    foundation::core::{FrameDelay, IndexedFrame, MAX_OPAQUE_COLORS, Palette, TransparentIndex},
};

/// Pixels with alpha at or below this value become fully transparent.
pub const ALPHA_THRESHOLD: u8 = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct QuantizeOpts {
    /// NeuQuant sampling factor: 1 is slowest and best, 30 fastest.
    pub sample_factor: i32,
}

impl Default for QuantizeOpts {
    fn default() -> Self {
        Self { sample_factor: 10 }
    }
}

impl QuantizeOpts {
    pub fn validate(&self) -> RoundGifResult<()> {
        if !(1..=30).contains(&self.sample_factor) {
            return Err(RoundGifError::validation(format!(
                "quantizer sample factor must be within 1..=30, got {}",
                self.sample_factor
            )));
        }
        Ok(())
    }
}

pub fn is_transparent_alpha(alpha: u8) -> bool {
    alpha <= ALPHA_THRESHOLD
}

/// Reduce an RGBA frame to a 255-color palette plus the reserved transparent slot.
///
/// Color selection ignores alpha entirely; alpha only decides which pixels are then forced to
/// [`TransparentIndex::RESERVED`].
pub fn quantize_frame(frame: &RgbaImage, opts: &QuantizeOpts) -> RoundGifResult<IndexedFrame> {
    opts.validate()?;

    let (mut indices, palette) = match exact_palette(frame) {
        Some(exact) => exact,
        None => neuquant_palette(frame, opts.sample_factor)?,
    };

    let transparent = TransparentIndex::RESERVED;
    for (slot, px) in indices.iter_mut().zip(frame.pixels()) {
        if is_transparent_alpha(px.0[3]) {
            *slot = transparent.get();
        }
    }

    Ok(IndexedFrame {
        width: frame.width(),
        height: frame.height(),
        indices,
        palette,
        transparent,
        delay: FrameDelay::default(),
    })
}

/// Map each distinct RGB color to its own entry, in first-seen order. `None` when the frame
/// has more colors than the palette can hold.
fn exact_palette(frame: &RgbaImage) -> Option<(Vec<u8>, Palette)> {
    let mut lookup: HashMap<[u8; 3], u8> = HashMap::new();
    let mut colors: Vec<[u8; 3]> = Vec::new();
    let mut indices = Vec::with_capacity(frame.as_raw().len() / 4);

    for px in frame.pixels() {
        let rgb = [px.0[0], px.0[1], px.0[2]];
        let idx = match lookup.get(&rgb) {
            Some(&idx) => idx,
            None => {
                if colors.len() == MAX_OPAQUE_COLORS {
                    return None;
                }
                let idx = colors.len() as u8;
                colors.push(rgb);
                lookup.insert(rgb, idx);
                idx
            }
        };
        indices.push(idx);
    }

    let palette = Palette::from_opaque_colors(&colors).ok()?;
    Some((indices, palette))
}

fn neuquant_palette(frame: &RgbaImage, sample_factor: i32) -> RoundGifResult<(Vec<u8>, Palette)> {
    // NeuQuant trains on RGBA; alpha is pinned so it cannot influence color choice.
    let opaque: Vec<u8> = frame
        .pixels()
        .flat_map(|px| [px.0[0], px.0[1], px.0[2], 255])
        .collect();

    let nq = NeuQuant::new(sample_factor, MAX_OPAQUE_COLORS, &opaque);
    let colors: Vec<[u8; 3]> = nq
        .color_map_rgb()
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();
    let palette = Palette::from_opaque_colors(&colors)?;

    let indices = opaque
        .chunks_exact(4)
        .map(|px| nq.index_of(px) as u8)
        .collect();
    Ok((indices, palette))
}
