use std::{
    fs::File,
    io::{BufRead, BufReader, Seek},
    path::Path,
};

use anyhow::Context as _;
use image::{
    AnimationDecoder, ImageFormat, ImageReader,
    codecs::{gif::GifDecoder, png::PngDecoder, webp::WebPDecoder},
};

use crate::{
    RoundGifError, RoundGifResult,
    foundation::core::{FrameDelay, SourceFrame},
};

/// Read every frame of the animation at `path`, in order, as straight RGBA8.
///
/// The file is closed before this returns, whether decoding succeeded or not.
#[tracing::instrument]
pub fn read_frames(path: &Path) -> RoundGifResult<Vec<SourceFrame>> {
    let file = File::open(path).with_context(|| format!("open input '{}'", path.display()))?;
    let frames = read_frames_from(BufReader::new(file))?;
    tracing::debug!(frames = frames.len(), "decoded input");
    Ok(frames)
}

/// Decode a frame sequence from any seekable reader. The format is sniffed from content.
pub fn read_frames_from<R: BufRead + Seek>(reader: R) -> RoundGifResult<Vec<SourceFrame>> {
    let reader = ImageReader::new(reader)
        .with_guessed_format()
        .context("sniff input format")?;
    let format = reader.format();
    tracing::debug!(?format, "input format");

    match format {
        Some(ImageFormat::Gif) => {
            let decoder = GifDecoder::new(reader.into_inner()).map_err(decode_err)?;
            collect_animation(decoder)
        }
        Some(ImageFormat::Png) => {
            let decoder = PngDecoder::new(reader.into_inner()).map_err(decode_err)?;
            if decoder.is_apng().map_err(decode_err)? {
                collect_animation(decoder.apng().map_err(decode_err)?)
            } else {
                still_frame(image::DynamicImage::from_decoder(decoder).map_err(decode_err)?)
            }
        }
        Some(ImageFormat::WebP) => {
            let decoder = WebPDecoder::new(reader.into_inner()).map_err(decode_err)?;
            if decoder.has_animation() {
                collect_animation(decoder)
            } else {
                still_frame(image::DynamicImage::from_decoder(decoder).map_err(decode_err)?)
            }
        }
        Some(_) => still_frame(reader.decode().map_err(decode_err)?),
        None => Err(RoundGifError::decode("unrecognized input format")),
    }
}

fn collect_animation<'a>(decoder: impl AnimationDecoder<'a>) -> RoundGifResult<Vec<SourceFrame>> {
    decoder
        .into_frames()
        .enumerate()
        .map(|(i, frame)| {
            let frame = frame.map_err(|e| RoundGifError::decode(format!("frame {i}: {e}")))?;
            let (numer, denom) = frame.delay().numer_denom_ms();
            Ok(SourceFrame {
                delay: FrameDelay::from_ratio_ms(numer, denom),
                image: frame.into_buffer(),
            })
        })
        .collect()
}

fn still_frame(img: image::DynamicImage) -> RoundGifResult<Vec<SourceFrame>> {
    Ok(vec![SourceFrame {
        image: img.to_rgba8(),
        delay: FrameDelay::default(),
    }])
}

fn decode_err(e: image::ImageError) -> RoundGifError {
    RoundGifError::decode(e.to_string())
}
