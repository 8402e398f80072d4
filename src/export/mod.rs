//! 导出设置

pub mod settings;

pub use settings::{ExporterSettings, TextureFilter};
