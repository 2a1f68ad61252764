use std::{
    borrow::Cow,
    fs::File,
    path::{Path, PathBuf},
};

use roundgif::{MaskParams, ProcessOpts, ProcessOutcome, RoundOpts, process};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("round_pipeline").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write an opaque `w`x`h` GIF with one solid-colored frame per entry of `fills`.
fn write_fixture(path: &Path, w: u16, h: u16, fills: &[u8]) {
    let palette = [255u8, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
    let f = File::create(path).unwrap();
    let mut enc = gif::Encoder::new(f, w, h, &palette).unwrap();
    enc.set_repeat(gif::Repeat::Finite(1)).unwrap();
    for &fill in fills {
        let frame = gif::Frame {
            width: w,
            height: h,
            delay: 7,
            buffer: Cow::Owned(vec![fill; usize::from(w) * usize::from(h)]),
            ..gif::Frame::default()
        };
        enc.write_frame(&frame).unwrap();
    }
}

struct DecodedOutput {
    width: u16,
    height: u16,
    looping_forever: bool,
    frames: Vec<DecodedFrame>,
}

struct DecodedFrame {
    width: u16,
    height: u16,
    dispose: gif::DisposalMethod,
    transparent: Option<u8>,
    delay: u16,
    palette: Vec<u8>,
    indices: Vec<u8>,
}

impl DecodedFrame {
    fn at(&self, x: usize, y: usize) -> u8 {
        self.indices[y * usize::from(self.width) + x]
    }

    fn rgb_at(&self, x: usize, y: usize) -> [u8; 3] {
        let i = usize::from(self.at(x, y)) * 3;
        [self.palette[i], self.palette[i + 1], self.palette[i + 2]]
    }
}

fn decode_output(path: &Path) -> DecodedOutput {
    let mut opts = gif::DecodeOptions::new();
    opts.set_color_output(gif::ColorOutput::Indexed);
    let mut dec = opts.read_info(File::open(path).unwrap()).unwrap();

    let mut frames = Vec::new();
    while let Some(f) = dec.read_next_frame().unwrap() {
        frames.push(DecodedFrame {
            width: f.width,
            height: f.height,
            dispose: f.dispose,
            transparent: f.transparent,
            delay: f.delay,
            palette: f.palette.clone().expect("local palette"),
            indices: f.buffer.to_vec(),
        });
    }

    DecodedOutput {
        width: dec.width(),
        height: dec.height(),
        looping_forever: matches!(dec.repeat(), gif::Repeat::Infinite),
        frames,
    }
}

fn job(dir: &Path, corner_radius: u32, blur_radius: f32) -> ProcessOpts {
    ProcessOpts {
        input: dir.join("in.gif"),
        output: dir.join("out.gif"),
        round: RoundOpts {
            mask: MaskParams {
                corner_radius,
                blur_radius,
            },
            ..RoundOpts::default()
        },
    }
}

#[test]
fn three_frame_animation_gets_transparent_corners() {
    let dir = scratch_dir("three_frames");
    let opts = job(&dir, 20, 0.0);
    let _ = std::fs::remove_file(&opts.output);
    write_fixture(&opts.input, 100, 100, &[0, 1, 2]);

    let outcome = process(&opts).unwrap();
    assert_eq!(
        outcome,
        ProcessOutcome::Written {
            path: opts.output.clone(),
            frames: 3
        }
    );

    let out = decode_output(&opts.output);
    assert_eq!((out.width, out.height), (100, 100));
    assert!(out.looping_forever);
    assert_eq!(out.frames.len(), 3);

    let expected_colors = [[255, 0, 0], [0, 255, 0], [0, 0, 255]];
    for (frame, color) in out.frames.iter().zip(expected_colors) {
        assert_eq!((frame.width, frame.height), (100, 100));
        assert_eq!(frame.transparent, Some(255));
        assert_eq!(frame.dispose, gif::DisposalMethod::Background);
        assert_eq!(frame.delay, 7);

        for (x, y) in [(0, 0), (99, 0), (0, 99), (99, 99)] {
            assert_eq!(frame.at(x, y), 255, "corner ({x},{y})");
        }
        assert_ne!(frame.at(50, 50), 255);
        assert_eq!(frame.rgb_at(50, 50), color);
    }
}

#[test]
fn blurred_mask_still_yields_binary_transparency() {
    let dir = scratch_dir("blurred");
    let opts = job(&dir, 12, 3.0);
    write_fixture(&opts.input, 48, 32, &[3]);

    process(&opts).unwrap();

    let out = decode_output(&opts.output);
    let frame = &out.frames[0];
    assert_eq!(frame.at(0, 0), 255);
    assert_eq!(frame.at(24, 16), 0);
    assert!(frame.indices.iter().all(|&i| i == 0 || i == 255));
}

#[test]
fn empty_input_writes_nothing() {
    let dir = scratch_dir("empty");
    let opts = job(&dir, 20, 0.0);
    let _ = std::fs::remove_file(&opts.output);
    write_fixture(&opts.input, 4, 4, &[]);

    let outcome = process(&opts).unwrap();
    assert_eq!(
        outcome,
        ProcessOutcome::NoFrames {
            input: opts.input.clone()
        }
    );
    assert!(outcome.to_string().contains("in.gif"));
    assert!(!opts.output.exists());
}

#[test]
fn unreadable_input_fails_without_output() {
    let dir = scratch_dir("corrupt");
    let opts = job(&dir, 20, 0.0);
    let _ = std::fs::remove_file(&opts.output);
    std::fs::write(&opts.input, b"GIF89a but not really").unwrap();

    assert!(process(&opts).is_err());
    assert!(!opts.output.exists());
}

#[test]
fn json_job_resolves_paths_next_to_the_job_file() {
    let dir = scratch_dir("job_file");
    write_fixture(&dir.join("in.gif"), 20, 20, &[1, 3]);
    let _ = std::fs::remove_file(dir.join("out.gif"));

    let job_path = dir.join("job.json");
    std::fs::write(
        &job_path,
        r#"{ "input": "in.gif", "output": "out.gif", "round": { "mask": { "corner_radius": 6 }, "parallel": true } }"#,
    )
    .unwrap();

    let opts = ProcessOpts::from_json_path(&job_path).unwrap();
    assert_eq!(opts.input, dir.join("in.gif"));
    assert!(opts.round.parallel);

    process(&opts).unwrap();
    let out = decode_output(&dir.join("out.gif"));
    assert_eq!(out.frames.len(), 2);
    assert_eq!(out.frames[1].rgb_at(10, 10), [255, 255, 255]);
    assert_eq!(out.frames[1].at(0, 19), 255);
}
