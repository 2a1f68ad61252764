use image::{DynamicImage, GrayImage, Luma, RgbaImage};
use kurbo::{Point, RoundedRect, Shape as _};

use crate::{
    RoundGifError, RoundGifResult,
    blur_cpu::{blur_gray8, kernel_radius_for_sigma},
};

/// Geometry of the corner mask.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MaskParams {
    /// Corner radius in pixels. Clamped to half the frame's shorter side.
    pub corner_radius: u32,
    /// Gaussian standard deviation in pixels; `0` keeps hard edges.
    pub blur_radius: f32,
}

impl Default for MaskParams {
    fn default() -> Self {
        Self {
            corner_radius: 30,
            blur_radius: 0.0,
        }
    }
}

impl MaskParams {
    pub fn validate(&self) -> RoundGifResult<()> {
        if !self.blur_radius.is_finite() || self.blur_radius < 0.0 {
            return Err(RoundGifError::validation(format!(
                "blur radius must be a finite value >= 0, got {}",
                self.blur_radius
            )));
        }
        Ok(())
    }
}

/// Single-channel visibility mask for one frame size: 255 inside the rounded rectangle,
/// 0 outside, graduated at the edge when blurred.
#[derive(Clone, Debug, PartialEq)]
pub struct CornerMask {
    alpha: GrayImage,
}

impl CornerMask {
    pub fn build(width: u32, height: u32, params: &MaskParams) -> RoundGifResult<Self> {
        params.validate()?;

        let mut alpha = GrayImage::new(width, height);
        if width == 0 || height == 0 {
            return Ok(Self { alpha });
        }

        let max_radius = f64::from(width.min(height)) / 2.0;
        let radius = f64::from(params.corner_radius).min(max_radius);
        let shape = RoundedRect::new(0.0, 0.0, f64::from(width), f64::from(height), radius);

        for (x, y, px) in alpha.enumerate_pixels_mut() {
            let center = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            if shape.contains(center) {
                *px = Luma([255]);
            }
        }

        if params.blur_radius > 0.0 {
            let blurred = blur_gray8(
                alpha.as_raw(),
                width,
                height,
                kernel_radius_for_sigma(params.blur_radius),
                params.blur_radius,
            )?;
            alpha = GrayImage::from_raw(width, height, blurred)
                .ok_or_else(|| RoundGifError::validation("blurred mask size mismatch"))?;
        }

        Ok(Self { alpha })
    }

    pub fn width(&self) -> u32 {
        self.alpha.width()
    }

    pub fn height(&self) -> u32 {
        self.alpha.height()
    }

    pub fn alpha(&self) -> &GrayImage {
        &self.alpha
    }

    /// Copy `frame` with its alpha channel replaced by this mask.
    pub fn apply(&self, frame: &RgbaImage) -> RoundGifResult<RgbaImage> {
        if frame.dimensions() != self.alpha.dimensions() {
            return Err(RoundGifError::validation(format!(
                "mask is {}x{} but frame is {}x{}",
                self.width(),
                self.height(),
                frame.width(),
                frame.height()
            )));
        }

        let mut out = frame.clone();
        for (px, m) in out.pixels_mut().zip(self.alpha.pixels()) {
            px.0[3] = m.0[0];
        }
        Ok(out)
    }
}

/// Round the corners of `frame` by replacing its alpha with a [`CornerMask`].
pub fn mask_rounded_corners(frame: &RgbaImage, params: &MaskParams) -> RoundGifResult<RgbaImage> {
    CornerMask::build(frame.width(), frame.height(), params)?.apply(frame)
}

/// Like [`mask_rounded_corners`] for an image in any color mode; it is converted to RGBA8 first.
pub fn mask_dynamic(frame: &DynamicImage, params: &MaskParams) -> RoundGifResult<RgbaImage> {
    mask_rounded_corners(&frame.to_rgba8(), params)
}
