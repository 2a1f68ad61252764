use std::path::PathBuf;

use clap::Parser;

/// Round the corners of an animated image and save it as a transparent GIF.
#[derive(Parser, Debug)]
#[command(name = "roundgif", version)]
struct Cli {
    /// Input animation (GIF, APNG or animated WebP).
    #[arg(long = "in")]
    in_path: Option<PathBuf>,

    /// Output GIF path.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Corner radius in pixels.
    #[arg(long)]
    radius: Option<u32>,

    /// Gaussian blur applied to the mask edge, in pixels.
    #[arg(long)]
    blur: Option<f32>,

    /// Quantizer sampling factor (1 = best, 30 = fastest).
    #[arg(long)]
    sample_factor: Option<i32>,

    /// Transform frames in parallel.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// JSON job file; other flags override its fields.
    #[arg(long)]
    job: Option<PathBuf>,

    /// Log pipeline progress to stderr.
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let opts = resolve_opts(&cli)?;
    let outcome = roundgif::process(&opts)?;
    println!("{outcome}");
    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_opts(cli: &Cli) -> anyhow::Result<roundgif::ProcessOpts> {
    let mut opts = match &cli.job {
        Some(path) => roundgif::ProcessOpts::from_json_path(path)?,
        None => roundgif::ProcessOpts::sample(),
    };

    if let Some(p) = &cli.in_path {
        opts.input = p.clone();
    }
    if let Some(p) = &cli.out {
        opts.output = p.clone();
    }
    if let Some(r) = cli.radius {
        opts.round.mask.corner_radius = r;
    }
    if let Some(b) = cli.blur {
        opts.round.mask.blur_radius = b;
    }
    if let Some(s) = cli.sample_factor {
        opts.round.quantize.sample_factor = s;
    }
    if cli.parallel {
        opts.round.parallel = true;
    }
    if cli.threads.is_some() {
        opts.round.threads = cli.threads;
    }

    opts.round.validate()?;
    Ok(opts)
}
