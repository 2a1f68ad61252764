use std::{
    borrow::Cow,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::Context as _;

use crate::{RoundGifError, RoundGifResult, foundation::core::IndexedFrame};

pub fn ensure_parent_dir(path: &Path) -> RoundGifResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Write `frames` as a looping GIF at `path`.
///
/// Every frame carries its own 256-entry palette and transparent slot and is disposed to the
/// background before the next one is drawn. Indices are written as-is, with no re-quantization.
#[tracing::instrument(skip(frames), fields(frames = frames.len()))]
pub fn write_gif(path: &Path, frames: &[IndexedFrame]) -> RoundGifResult<()> {
    // Frame sizes are checked before the output file exists.
    let (width, height) = screen_size(frames)?;

    ensure_parent_dir(path)?;
    let file =
        File::create(path).with_context(|| format!("create output '{}'", path.display()))?;
    let mut out = BufWriter::new(file);
    encode_gif(&mut out, width, height, frames)?;
    out.flush()
        .with_context(|| format!("flush output '{}'", path.display()))?;
    Ok(())
}

/// Encode `frames` into any writer. See [`write_gif`].
pub fn encode_gif<W: Write>(
    out: W,
    width: u16,
    height: u16,
    frames: &[IndexedFrame],
) -> RoundGifResult<()> {
    let mut encoder = gif::Encoder::new(out, width, height, &[]).map_err(encode_err)?;
    encoder.set_repeat(gif::Repeat::Infinite).map_err(encode_err)?;

    for (i, frame) in frames.iter().enumerate() {
        let (w, h) = gif_dims(frame)?;
        let expected = usize::from(w) * usize::from(h);
        if frame.indices.len() != expected {
            return Err(RoundGifError::encode(format!(
                "frame {i} has {} indices, expected {expected}",
                frame.indices.len()
            )));
        }

        let gif_frame = gif::Frame {
            width: w,
            height: h,
            delay: frame.delay.as_centis(),
            dispose: gif::DisposalMethod::Background,
            transparent: Some(frame.transparent.get()),
            palette: Some(frame.palette.to_rgb_bytes()),
            buffer: Cow::Borrowed(frame.indices.as_slice()),
            ..gif::Frame::default()
        };
        encoder
            .write_frame(&gif_frame)
            .map_err(|e| RoundGifError::encode(format!("frame {i}: {e}")))?;
    }

    encoder
        .into_inner()
        .map_err(|e| RoundGifError::encode(format!("finish gif stream: {e}")))?;
    Ok(())
}

fn screen_size(frames: &[IndexedFrame]) -> RoundGifResult<(u16, u16)> {
    let first = frames
        .first()
        .ok_or_else(|| RoundGifError::validation("cannot write a gif with no frames"))?;
    let size = gif_dims(first)?;
    for (i, f) in frames.iter().enumerate().skip(1) {
        if gif_dims(f)? != size {
            return Err(RoundGifError::validation(format!(
                "frame {i} is {}x{}, expected {}x{}",
                f.width, f.height, size.0, size.1
            )));
        }
    }
    Ok(size)
}

fn gif_dims(frame: &IndexedFrame) -> RoundGifResult<(u16, u16)> {
    let w = u16::try_from(frame.width).ok();
    let h = u16::try_from(frame.height).ok();
    match (w, h) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(RoundGifError::validation(format!(
            "{}x{} exceeds the gif size limit of {}x{}",
            frame.width,
            frame.height,
            u16::MAX,
            u16::MAX
        ))),
    }
}

fn encode_err(e: gif::EncodingError) -> RoundGifError {
    RoundGifError::encode(e.to_string())
}
