//! 场景数据：场景文件和实体方案

pub mod editor_scene;
pub mod scheme;

pub use editor_scene::{EditorScene, LayerInfo, SharedScene};
pub use scheme::{ComponentScheme, EntityScheme};
