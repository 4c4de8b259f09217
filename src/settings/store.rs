use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::coordinator::CoordinatorConfig;
use crate::error::SettingsError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSettings {
    // 播放器设置
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// DUCK 时相对正常音量的比例
    #[serde(default = "default_duck_volume")]
    pub duck_volume: f32,

    // 服务设置
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_random_queue_size")]
    pub random_queue_size: usize,
    /// 静音后端里时长未知的曲目播放多久
    #[serde(default = "default_null_track_ms")]
    pub null_track_ms: u64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            duck_volume: default_duck_volume(),
            channel_capacity: default_channel_capacity(),
            random_queue_size: default_random_queue_size(),
            null_track_ms: default_null_track_ms(),
        }
    }
}

// 默认值函数（用于 serde default）
fn default_volume() -> f32 { 1.0 }
fn default_duck_volume() -> f32 { 0.2 }
fn default_channel_capacity() -> usize { 64 }
fn default_random_queue_size() -> usize { 10 }
fn default_null_track_ms() -> u64 { 30_000 }

impl PlayerSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(0.0..=2.0).contains(&self.volume) {
            return Err(SettingsError::InvalidValue(format!("volume={}", self.volume)));
        }
        if !(0.0..=1.0).contains(&self.duck_volume) {
            return Err(SettingsError::InvalidValue(format!(
                "duck_volume={}",
                self.duck_volume
            )));
        }
        if self.channel_capacity == 0 {
            return Err(SettingsError::InvalidValue("channel_capacity=0".to_owned()));
        }
        Ok(())
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            volume: self.volume,
            duck_volume: self.duck_volume,
            random_queue_size: self.random_queue_size,
        }
    }
}

/// 读取设置；文件不存在、损坏或取值非法时回退到默认值
pub fn load_settings(data_dir: &Path) -> PlayerSettings {
    let p = settings_path(data_dir);
    let Ok(bytes) = fs::read(&p) else {
        return PlayerSettings::default();
    };
    let parsed: PlayerSettings = match serde_json::from_slice(&bytes) {
        Ok(s) => s,
        Err(source) => {
            let err = SettingsError::Json(source);
            tracing::warn!(path = %p.display(), err = %err, "使用默认设置");
            return PlayerSettings::default();
        }
    };
    if let Err(err) = parsed.validate() {
        tracing::warn!(path = %p.display(), err = %err, "使用默认设置");
        return PlayerSettings::default();
    }
    parsed
}

/// 先写临时文件再 rename，避免写一半的 settings.json
pub fn save_settings(data_dir: &Path, s: &PlayerSettings) -> Result<(), SettingsError> {
    let p = settings_path(data_dir);
    let write_err = |source| SettingsError::Write {
        path: p.clone(),
        source,
    };
    fs::create_dir_all(data_dir).map_err(write_err)?;
    let tmp = p.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, bytes).map_err(write_err)?;
    if let Err(e) = fs::rename(&tmp, &p) {
        let _ = fs::remove_file(&p);
        fs::rename(&tmp, &p).map_err(|_| write_err(e))?;
    }
    Ok(())
}

fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("settings.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let s: PlayerSettings = serde_json::from_str(r#"{"volume":0.5}"#).unwrap();
        assert!((s.volume - 0.5).abs() < f32::EPSILON);
        assert!((s.duck_volume - 0.2).abs() < f32::EPSILON);
        assert_eq!(s.channel_capacity, 64);
        assert_eq!(s.random_queue_size, 10);
        assert_eq!(s.null_track_ms, 30_000);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let s = PlayerSettings {
            duck_volume: 1.5,
            ..Default::default()
        };
        assert!(matches!(s.validate(), Err(SettingsError::InvalidValue(_))));
        assert!(PlayerSettings::default().validate().is_ok());
    }

    #[test]
    fn test_coordinator_config() {
        let cfg = PlayerSettings {
            volume: 0.8,
            random_queue_size: 3,
            ..Default::default()
        }
        .coordinator_config();
        assert!((cfg.volume - 0.8).abs() < f32::EPSILON);
        assert_eq!(cfg.random_queue_size, 3);
    }
}
