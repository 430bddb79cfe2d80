//! Join audio clips in order.

use std::path::PathBuf;

use clipcast_audio::{AudioConcatenator, DurationProbe};
use clipcast_common::config::AppConfig;
use clipcast_composition_model::audio::AudioClip;

pub fn run(config: &AppConfig, files: Vec<PathBuf>, output: PathBuf) -> anyhow::Result<()> {
    let probe = DurationProbe::new(&config.tools, &config.probe);
    let concatenator = AudioConcatenator::new(&config.tools, &config.probe);

    let clips = files
        .iter()
        .map(|path| {
            let bytes = std::fs::read(path)
                .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
            let duration = probe.measure(&bytes);
            Ok(AudioClip::new(bytes, duration))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let refs: Vec<&AudioClip> = clips.iter().collect();
    let joined = concatenator.concat_all(&refs)?;
    std::fs::write(&output, joined.bytes())?;

    println!(
        "Joined {} clips into {} ({:.3}s, {})",
        clips.len(),
        output.display(),
        joined.duration_secs(),
        if joined.duration().is_exact() {
            "measured"
        } else {
            "estimated"
        }
    );

    Ok(())
}
