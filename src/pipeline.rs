use std::path::{Path, PathBuf};

use anyhow::Context as _;
use rayon::prelude::*;

use crate::{
    RoundGifError, RoundGifResult,
    decode::read_frames,
    encode_gif::write_gif,
    foundation::core::{IndexedFrame, SourceFrame},
    mask::{CornerMask, MaskParams},
    quantize::{QuantizeOpts, quantize_frame},
};

/// Per-frame transform settings.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RoundOpts {
    pub mask: MaskParams,
    pub quantize: QuantizeOpts,
    /// Transform frames on a rayon pool. Output order is unaffected.
    pub parallel: bool,
    /// Override the number of rayon worker threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
}

impl RoundOpts {
    pub fn validate(&self) -> RoundGifResult<()> {
        self.mask.validate()?;
        self.quantize.validate()?;
        if self.threads == Some(0) {
            return Err(RoundGifError::validation("'threads' must be >= 1 when set"));
        }
        Ok(())
    }
}

/// One input-to-output job.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProcessOpts {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub round: RoundOpts,
}

impl ProcessOpts {
    pub const SAMPLE_INPUT: &'static str = "Templates_Accessing_Templates.gif";
    pub const SAMPLE_OUTPUT: &'static str = "Templates_Accessing_Templates_Rounded.gif";
    pub const SAMPLE_CORNER_RADIUS: u32 = 50;

    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            round: RoundOpts::default(),
        }
    }

    /// The stock job the binary runs with no arguments.
    pub fn sample() -> Self {
        let mut opts = Self::new(Self::SAMPLE_INPUT, Self::SAMPLE_OUTPUT);
        opts.round.mask.corner_radius = Self::SAMPLE_CORNER_RADIUS;
        opts
    }

    /// Load a JSON job file. Relative paths inside it resolve against the file's directory.
    pub fn from_json_path(path: &Path) -> RoundGifResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read job file '{}'", path.display()))?;
        let mut opts: Self = serde_json::from_str(&text)
            .map_err(|e| RoundGifError::serde(format!("{}: {e}", path.display())))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        if opts.input.is_relative() {
            opts.input = base.join(&opts.input);
        }
        if opts.output.is_relative() {
            opts.output = base.join(&opts.output);
        }
        Ok(opts)
    }
}

/// What [`process`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessOutcome {
    Written { path: PathBuf, frames: usize },
    /// The input held no frames; nothing was written.
    NoFrames { input: PathBuf },
}

impl std::fmt::Display for ProcessOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Written { path, .. } => {
                write!(f, "Saved rounded-corner GIF to: {}", path.display())
            }
            Self::NoFrames { input } => write!(f, "No frames found in {}", input.display()),
        }
    }
}

/// Mask then quantize one frame, keeping its delay.
pub fn process_frame(
    frame: &SourceFrame,
    mask: &CornerMask,
    opts: &RoundOpts,
) -> RoundGifResult<IndexedFrame> {
    let rounded = mask.apply(&frame.image)?;
    let mut indexed = quantize_frame(&rounded, &opts.quantize)?;
    indexed.delay = frame.delay;
    Ok(indexed)
}

/// Transform a whole sequence, preserving order.
#[tracing::instrument(skip(frames), fields(frames = frames.len()))]
pub fn process_frames(
    frames: &[SourceFrame],
    opts: &RoundOpts,
) -> RoundGifResult<Vec<IndexedFrame>> {
    opts.validate()?;

    // Masks depend only on frame size, which is uniform in practice; cache by dimensions.
    let mut masks: Vec<CornerMask> = Vec::new();
    let mut mask_for_frame = Vec::with_capacity(frames.len());
    for f in frames {
        let dims = f.image.dimensions();
        let slot = match masks.iter().position(|m| (m.width(), m.height()) == dims) {
            Some(i) => i,
            None => {
                masks.push(CornerMask::build(dims.0, dims.1, &opts.mask)?);
                masks.len() - 1
            }
        };
        mask_for_frame.push(slot);
    }

    let run = |i: usize| -> RoundGifResult<IndexedFrame> {
        let out = process_frame(&frames[i], &masks[mask_for_frame[i]], opts)?;
        tracing::debug!(frame = i, width = out.width, height = out.height, "frame processed");
        Ok(out)
    };

    if opts.parallel {
        let pool = build_thread_pool(opts.threads)?;
        pool.install(|| (0..frames.len()).into_par_iter().map(run).collect())
    } else {
        (0..frames.len()).map(run).collect()
    }
}

/// Read `opts.input`, round every frame, and write the result to `opts.output`.
///
/// An input without frames is reported as [`ProcessOutcome::NoFrames`] and leaves the output
/// untouched.
#[tracing::instrument(skip(opts), fields(input = %opts.input.display(), output = %opts.output.display()))]
pub fn process(opts: &ProcessOpts) -> RoundGifResult<ProcessOutcome> {
    opts.round.validate()?;

    let frames = read_frames(&opts.input)?;
    if frames.is_empty() {
        tracing::info!("input has no frames; nothing written");
        return Ok(ProcessOutcome::NoFrames {
            input: opts.input.clone(),
        });
    }

    let indexed = process_frames(&frames, &opts.round)?;
    write_gif(&opts.output, &indexed)?;
    tracing::info!(frames = indexed.len(), "wrote gif");

    Ok(ProcessOutcome::Written {
        path: opts.output.clone(),
        frames: indexed.len(),
    })
}

fn build_thread_pool(threads: Option<usize>) -> RoundGifResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| RoundGifError::validation(format!("failed to build rayon thread pool: {e}")))
}
