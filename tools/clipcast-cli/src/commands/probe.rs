//! Measure audio durations.

use std::path::PathBuf;

use clipcast_audio::DurationProbe;
use clipcast_common::config::AppConfig;

pub fn run(config: &AppConfig, files: Vec<PathBuf>) -> anyhow::Result<()> {
    let probe = DurationProbe::new(&config.tools, &config.probe);

    for path in files {
        let bytes = std::fs::read(&path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
        let measurement = probe.measure(&bytes);
        println!(
            "{}\t{:.3}s\t{}",
            path.display(),
            measurement.secs,
            if measurement.is_exact() {
                "measured"
            } else {
                "estimated"
            }
        );
    }

    Ok(())
}
