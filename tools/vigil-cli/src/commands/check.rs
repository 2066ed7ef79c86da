//! Check that everything `vigil watch` needs is in place.

use std::path::Path;

use vigil_camera::OpenCvCamera;
use vigil_common::config::{config_file_path, AppConfig, TelegramCredentials};
use vigil_notify::SoundPlayer;

pub fn run(config: &AppConfig, explicit_config: Option<&Path>) -> anyhow::Result<()> {
    println!("Vigil System Check");
    println!("{}", "=".repeat(50));

    let mut ready = true;

    match TelegramCredentials::from_env() {
        Ok(credentials) => println!("[OK] Telegram credentials (chat {})", credentials.chat_id),
        Err(e) => {
            println!("[FAIL] {e}");
            ready = false;
        }
    }

    let config_path = explicit_config.map_or_else(config_file_path, Path::to_path_buf);
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[OK] Config: defaults ({} not found)", config_path.display());
    }
    println!(
        "     policy={} motion_threshold={} pixel_threshold={}",
        config.alarm.policy, config.detection.motion_threshold, config.detection.pixel_threshold
    );

    let sound_path = &config.notify.sound_file;
    match SoundPlayer::load(sound_path) {
        Some(_) => println!("[OK] Alarm sound: {}", sound_path.display()),
        None => println!(
            "[WARN] Alarm sound unavailable: {} (alarms will be silent)",
            sound_path.display()
        ),
    }

    match OpenCvCamera::probe(&config.camera) {
        Ok((width, height)) => println!(
            "[OK] Camera {}: {width}x{height}",
            config.camera.device_index
        ),
        Err(e) => {
            println!("[FAIL] {e}");
            ready = false;
        }
    }

    println!();
    if ready {
        println!("All required components are available. Vigil is ready.");
        Ok(())
    } else {
        anyhow::bail!("Some required components are missing. See above for fixes.")
    }
}
