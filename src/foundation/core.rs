use crate::foundation::error::{RoundGifError, RoundGifResult};

/// Display duration of one animation frame, in milliseconds.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameDelay(pub u32);

impl FrameDelay {
    /// Build from a rational `numer / denom` milliseconds, rounding to the nearest ms.
    pub fn from_ratio_ms(numer: u32, denom: u32) -> Self {
        if denom == 0 {
            return Self(0);
        }
        let (n, d) = (u64::from(numer), u64::from(denom));
        Self(((n + d / 2) / d).min(u64::from(u32::MAX)) as u32)
    }

    /// Build from GIF delay units (hundredths of a second).
    pub fn from_centis(centis: u16) -> Self {
        Self(u32::from(centis) * 10)
    }

    /// Nearest GIF delay in hundredths of a second, saturating at `u16::MAX`.
    pub fn as_centis(self) -> u16 {
        (self.0.saturating_add(5) / 10).min(u32::from(u16::MAX)) as u16
    }
}

/// Palette slot reserved to mean "fully transparent".
///
/// Quantized color indices are plain `u8` values below [`TransparentIndex::RESERVED`]; only
/// this type may name the transparency sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TransparentIndex(u8);

impl TransparentIndex {
    pub const RESERVED: Self = Self(255);

    pub fn get(self) -> u8 {
        self.0
    }
}

/// Number of palette entries available to visible colors.
pub const MAX_OPAQUE_COLORS: usize = TransparentIndex::RESERVED.0 as usize;

/// A full 256-entry RGB palette. Entry 255 belongs to the transparency sentinel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    rgb: Vec<[u8; 3]>,
}

impl Palette {
    pub const LEN: usize = 256;

    /// Build a palette from at most [`MAX_OPAQUE_COLORS`] visible colors. Unused entries,
    /// including the reserved one, are padded with black.
    pub fn from_opaque_colors(colors: &[[u8; 3]]) -> RoundGifResult<Self> {
        if colors.len() > MAX_OPAQUE_COLORS {
            return Err(RoundGifError::validation(format!(
                "palette holds at most {MAX_OPAQUE_COLORS} visible colors, got {}",
                colors.len()
            )));
        }
        let mut rgb = Vec::with_capacity(Self::LEN);
        rgb.extend_from_slice(colors);
        rgb.resize(Self::LEN, [0, 0, 0]);
        Ok(Self { rgb })
    }

    pub fn color(&self, index: u8) -> [u8; 3] {
        self.rgb[usize::from(index)]
    }

    /// Flat `r,g,b,r,g,b,...` bytes as GIF color tables store them.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.rgb.iter().flatten().copied().collect()
    }
}

/// A decoded input frame, normalized to straight RGBA8.
#[derive(Clone, Debug)]
pub struct SourceFrame {
    pub image: image::RgbaImage,
    pub delay: FrameDelay,
}

/// A palette-indexed frame with one transparent palette slot.
#[derive(Clone, Debug)]
pub struct IndexedFrame {
    pub width: u32,
    pub height: u32,
    /// One palette index per pixel, row-major.
    pub indices: Vec<u8>,
    pub palette: Palette,
    pub transparent: TransparentIndex,
    pub delay: FrameDelay,
}

impl IndexedFrame {
    /// Palette index of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the frame.
    pub fn index_at(&self, x: u32, y: u32) -> u8 {
        self.indices[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the frame.
    pub fn is_transparent_at(&self, x: u32, y: u32) -> bool {
        self.index_at(x, y) == self.transparent.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_rounds_to_nearest_centisecond() {
        assert_eq!(FrameDelay(0).as_centis(), 0);
        assert_eq!(FrameDelay(44).as_centis(), 4);
        assert_eq!(FrameDelay(45).as_centis(), 5);
        assert_eq!(FrameDelay(100).as_centis(), 10);
        assert_eq!(FrameDelay(u32::MAX).as_centis(), u16::MAX);
        assert_eq!(FrameDelay(u32::MAX - 2).as_centis(), u16::MAX);
        assert_eq!(FrameDelay::from_centis(7), FrameDelay(70));
    }

    #[test]
    fn delay_from_ratio_handles_zero_denominator() {
        assert_eq!(FrameDelay::from_ratio_ms(100, 3), FrameDelay(33));
        assert_eq!(FrameDelay::from_ratio_ms(5, 0), FrameDelay(0));
    }

    #[test]
    fn palette_pads_to_full_table_and_rejects_overflow() {
        let p = Palette::from_opaque_colors(&[[1, 2, 3]]).unwrap();
        assert_eq!(p.to_rgb_bytes().len(), Palette::LEN * 3);
        assert_eq!(p.color(0), [1, 2, 3]);
        assert_eq!(p.color(255), [0, 0, 0]);

        let too_many = vec![[0u8; 3]; MAX_OPAQUE_COLORS + 1];
        assert!(Palette::from_opaque_colors(&too_many).is_err());
    }

    #[test]
    #[should_panic]
    fn index_outside_frame_panics() {
        let frame = IndexedFrame {
            width: 2,
            height: 2,
            indices: vec![0; 4],
            palette: Palette::from_opaque_colors(&[]).unwrap(),
            transparent: TransparentIndex::RESERVED,
            delay: FrameDelay::default(),
        };
        frame.index_at(0, 2);
    }

    #[test]
    fn reserved_index_is_last_slot() {
        assert_eq!(TransparentIndex::RESERVED.get(), 255);
        assert_eq!(MAX_OPAQUE_COLORS, 255);
    }
}
