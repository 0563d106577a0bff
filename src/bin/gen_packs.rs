//! gen-packs: generate the notification sound-pack WAV assets.
//!
//! Writes assets/sounds/packs/{modern,minimal,retro}/{info,warning,error}.wav
//! as short decaying chimes (mono, 44.1 kHz, 16-bit).

use std::f64::consts::PI;
use std::path::PathBuf;

use clap::Parser;
use hound::{SampleFormat, WavSpec, WavWriter};

const SAMPLE_RATE: u32 = 44_100;
const LENGTH_SECS: f64 = 0.5;

#[derive(Parser, Debug)]
#[command(name = "gen-packs", about = "Generate notification sound packs")]
struct Args {
    /// Output root for the pack directories
    #[arg(short, long, default_value = "assets/sounds/packs")]
    out_dir: PathBuf,
}

type PackTable = &'static [(&'static str, &'static [(&'static str, &'static [f64])])];

const PACKS: PackTable = &[
    (
        "modern",
        &[
            ("info", &[880.0, 1108.0]),
            ("warning", &[660.0, 880.0]),
            ("error", &[220.0, 330.0]),
        ],
    ),
    (
        "minimal",
        &[
            ("info", &[880.0]),
            ("warning", &[660.0]),
            ("error", &[440.0]),
        ],
    ),
    (
        "retro",
        &[
            ("info", &[660.0, 880.0]),
            ("warning", &[440.0, 550.0]),
            ("error", &[220.0, 110.0]),
        ],
    ),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    for (pack, levels) in PACKS {
        let pack_dir = args.out_dir.join(pack);
        std::fs::create_dir_all(&pack_dir)?;
        for (level, freqs) in *levels {
            let path = pack_dir.join(format!("{level}.wav"));
            let mut writer = WavWriter::create(&path, spec)?;
            for sample in chime(freqs) {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

/// One chime: the pack's frequencies with a slight 3 Hz vibrato and a
/// decaying envelope, amplitude split across the chord.
fn chime(freqs: &[f64]) -> Vec<i16> {
    let n_samples = (SAMPLE_RATE as f64 * LENGTH_SECS) as usize;
    let mut samples = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let t = i as f64 / SAMPLE_RATE as f64;
        let envelope = (1.0 - t / LENGTH_SECS).powf(1.2);
        let mut s = 0.0;
        for f in freqs {
            s += (2.0 * PI * (f + 5.0 * (2.0 * PI * 3.0 * t).sin()) * t).sin();
        }
        s = s * envelope * 0.6 / freqs.len() as f64;
        samples.push((s * 32767.0) as i16);
    }
    samples
}
