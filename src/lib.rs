//! Round the corners of animated images.
//!
//! Each frame gets a rounded-rectangle alpha mask, is reduced to a 255-color palette plus one
//! reserved transparent slot, and the sequence is written back out as a looping GIF.
//!
//! - [`mask`]: build a [`CornerMask`] and apply it to a frame
//! - [`quantize`]: palette reduction with 1-bit transparency
//! - [`pipeline`]: read, transform, and write a whole sequence via [`process`]
#![forbid(unsafe_code)]

mod foundation;

pub mod blur_cpu;
pub mod decode;
pub mod encode_gif;
pub mod mask;
pub mod pipeline;
pub mod quantize;

pub use crate::foundation::core::{
    FrameDelay, IndexedFrame, MAX_OPAQUE_COLORS, Palette, SourceFrame, TransparentIndex,
};
pub use crate::foundation::error::{RoundGifError, RoundGifResult};

pub use crate::decode::{read_frames, read_frames_from};
pub use crate::encode_gif::{encode_gif, write_gif};
pub use crate::mask::{CornerMask, MaskParams, mask_dynamic, mask_rounded_corners};
pub use crate::pipeline::{
    ProcessOpts, ProcessOutcome, RoundOpts, process, process_frame, process_frames,
};
pub use crate::quantize::{ALPHA_THRESHOLD, QuantizeOpts, is_transparent_alpha, quantize_frame};
