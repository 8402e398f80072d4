use super::{ConfigError, ConfigResult};
use crate::impl_default;
use serde::{Deserialize, Serialize};

/// 场景编辑器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneEditorConfig {
    /// 默认显示网格
    pub show_grid: bool,
    /// 网格大小（世界单位）
    pub grid_size: f32,
    /// 网格颜色
    pub grid_color: [f32; 4],
    /// 背景颜色
    pub background_color: [f32; 4],
    /// 最小缩放
    pub min_zoom: f32,
    /// 最大缩放
    pub max_zoom: f32,
    /// 每次滚轮的缩放步长
    pub zoom_step: f32,
}

impl_default!(SceneEditorConfig {
    show_grid: true,
    grid_size: 32.0,
    grid_color: [0.32, 0.32, 0.36, 0.35],
    background_color: [0.16, 0.16, 0.17, 1.0],
    min_zoom: 0.05,
    max_zoom: 20.0,
    zoom_step: 0.1,
});

impl SceneEditorConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.grid_size > 0.0) {
            return Err(ConfigError::ValidationError(
                "grid_size must be positive".to_string(),
            ));
        }
        if !(self.min_zoom > 0.0) || self.min_zoom > self.max_zoom {
            return Err(ConfigError::ValidationError(format!(
                "invalid zoom range {}..{}",
                self.min_zoom, self.max_zoom
            )));
        }
        if !(self.zoom_step > 0.0) {
            return Err(ConfigError::ValidationError(
                "zoom_step must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// 未经验证的配置（如 min > max）也不会 panic
    pub fn clamp_zoom(&self, zoom: f32) -> f32 {
        zoom.max(self.min_zoom).min(self.max_zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_inverted_zoom_range() {
        let config = SceneEditorConfig {
            min_zoom: 4.0,
            max_zoom: 2.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_nan_grid() {
        let config = SceneEditorConfig {
            grid_size: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_clamp_zoom() {
        let config = SceneEditorConfig::default();
        assert_eq!(config.clamp_zoom(100.0), config.max_zoom);
        assert_eq!(config.clamp_zoom(0.0), config.min_zoom);
    }
}
