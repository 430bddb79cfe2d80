//! Check external tools and configuration.

use std::path::Path;

use clipcast_common::config::{config_file_path, AppConfig};
use clipcast_common::process::command_exists;
use clipcast_render_engine::{FfmpegBackend, RenderBackend};

pub fn run(config: &AppConfig, explicit: Option<&Path>) -> anyhow::Result<()> {
    println!("Clipcast System Check");
    println!("{}", "=".repeat(50));

    let mut ok = true;
    for (name, path) in [
        ("ffmpeg", &config.tools.ffmpeg_path),
        ("ffprobe", &config.tools.ffprobe_path),
    ] {
        if command_exists(path) {
            println!("[OK] {name}: {}", path.display());
        } else {
            println!("[MISSING] {name}: {} not found", path.display());
            ok = false;
        }
    }

    let backend = FfmpegBackend::new(&config.tools, config.render.clone());
    println!(
        "[{}] Render backend: {}",
        if backend.is_available() { "OK" } else { "WARN" },
        backend.name()
    );

    let config_path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path);
    if config_path.exists() {
        match config.validate() {
            Ok(()) => println!("[OK] Config: {}", config_path.display()),
            Err(e) => {
                println!("[ERROR] Config {}: {e}", config_path.display());
                ok = false;
            }
        }
    } else {
        println!("[OK] Config: defaults ({} not present)", config_path.display());
    }

    println!();
    if ok {
        println!("All required tools are available. Clipcast is ready.");
    } else {
        println!("Some required tools are missing. See above for fixes.");
    }

    Ok(())
}
