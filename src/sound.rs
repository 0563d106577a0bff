//! Notification sound channel: asset resolution and rodio playback.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rodio::{Decoder, OutputStreamBuilder, Sink};
use tracing::warn;

use crate::config::NotifyConfig;
use crate::request::NotificationRequest;

/// Narrow seam over audio playback, injectable for tests.
pub trait SoundPlayer: Send + Sync {
    /// Start playback and return immediately; dispatch never waits on it.
    fn play(&self, path: &Path) -> Result<()>;
}

/// Plays each file on its own detached thread through the default output
/// device.
pub struct RodioPlayer;

impl SoundPlayer for RodioPlayer {
    fn play(&self, path: &Path) -> Result<()> {
        let path = path.to_path_buf();
        std::thread::spawn(move || {
            if let Err(e) = play_file(&path) {
                warn!("Sound playback failed for {}: {e}", path.display());
            }
        });
        Ok(())
    }
}

fn play_file(path: &Path) -> Result<()> {
    let stream = OutputStreamBuilder::open_default_stream()
        .context("Failed to open audio output")?;
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let source =
        Decoder::try_from(file).with_context(|| format!("Failed to decode {}", path.display()))?;

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    sink.sleep_until_end();
    Ok(())
}

/// Resolve which asset backs this notification, in priority order:
/// explicit per-call override, the sound-pack asset for the level (only if
/// the file exists), then the flat per-level map. `None` means no sound.
pub fn resolve_sound_path(request: &NotificationRequest, config: &NotifyConfig) -> Option<PathBuf> {
    if let Some(path) = &request.sound_file {
        return Some(path.clone());
    }
    if let Some(pack) = &config.sound_pack {
        let candidate = config
            .pack_dir
            .join(pack)
            .join(format!("{}.wav", request.level));
        if candidate.exists() {
            return Some(candidate);
        }
    }
    config.sounds.get(&request.level).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Level;

    fn config_with_pack(pack_dir: &Path) -> NotifyConfig {
        NotifyConfig {
            sound_pack: Some("modern".into()),
            pack_dir: pack_dir.to_path_buf(),
            ..NotifyConfig::default()
        }
    }

    #[test]
    fn explicit_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let pack_file = dir.path().join("modern").join("info.wav");
        std::fs::create_dir_all(pack_file.parent().unwrap()).unwrap();
        std::fs::write(&pack_file, b"RIFF").unwrap();

        let config = config_with_pack(dir.path());
        let request = NotificationRequest::new("hi").with_sound_file("/tmp/custom.wav");
        assert_eq!(
            resolve_sound_path(&request, &config),
            Some(PathBuf::from("/tmp/custom.wav"))
        );
    }

    #[test]
    fn pack_asset_used_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let pack_file = dir.path().join("modern").join("warning.wav");
        std::fs::create_dir_all(pack_file.parent().unwrap()).unwrap();
        std::fs::write(&pack_file, b"RIFF").unwrap();

        let config = config_with_pack(dir.path());
        let request = NotificationRequest::new("hi").with_level(Level::Warning);
        assert_eq!(resolve_sound_path(&request, &config), Some(pack_file));
    }

    #[test]
    fn missing_pack_asset_falls_back_to_flat_map() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_with_pack(dir.path());
        config
            .sounds
            .insert(Level::Error, PathBuf::from("/tmp/flat-error.wav"));

        let request = NotificationRequest::new("hi").with_level(Level::Error);
        assert_eq!(
            resolve_sound_path(&request, &config),
            Some(PathBuf::from("/tmp/flat-error.wav"))
        );
    }

    #[test]
    fn nothing_configured_means_no_sound() {
        let request = NotificationRequest::new("hi");
        assert_eq!(resolve_sound_path(&request, &NotifyConfig::default()), None);
    }
}
