use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::Result;

/// Narrowest standard PCM width that holds every sample
fn bits_needed(samples: &[i32]) -> u16 {
    let fits = |bits: u32| {
        let limit = 1i64 << (bits - 1);
        samples
            .iter()
            .all(|&s| (-limit..limit).contains(&i64::from(s)))
    };
    if fits(16) {
        16
    } else if fits(24) {
        24
    } else {
        32
    }
}

/// Write raw ECG samples as a mono integer PCM recording
///
/// Front-end samples are 18-bit, so captures normally land in 24-bit files.
pub fn save_wav<P: AsRef<Path>>(path: P, samples: &[i32], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: bits_needed(samples),
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path.as_ref(), spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    log::debug!(
        "Wrote {} samples as {}-bit PCM to {}",
        samples.len(),
        spec.bits_per_sample,
        path.as_ref().display()
    );
    Ok(())
}
