//! Convert captions to an overlay script or SRT.

use std::path::PathBuf;

use clipcast_common::config::AppConfig;
use clipcast_processing_core::subtitles::{generate_srt, parse_srt};
use clipcast_processing_core::{segment_text, OverlayScriptBuilder};

pub fn run(
    config: &AppConfig,
    srt: Option<PathBuf>,
    text: Option<String>,
    duration: Option<f64>,
    output: Option<PathBuf>,
    srt_out: bool,
) -> anyhow::Result<()> {
    let cues = match (srt, text, duration) {
        (Some(path), _, _) => {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
            parse_srt(&content)?
        }
        (None, Some(text), Some(duration)) => {
            segment_text(&text, duration, &config.captions.segmentation)
        }
        _ => anyhow::bail!("Provide an SRT file, or --text with --duration"),
    };

    let rendered = if srt_out {
        generate_srt(&cues)
    } else {
        OverlayScriptBuilder::new(config.captions.clone())
            .build(&cues)?
            .to_string()
    };

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)?;
            println!("Wrote {} cues to {}", cues.len(), path.display());
        }
        None => print!("{rendered}"),
    }

    Ok(())
}
