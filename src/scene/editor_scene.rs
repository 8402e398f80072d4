//! 编辑器场景文件

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::EntityScheme;
use crate::core::EditorResult;
use crate::ecs::SceneViewport;

/// 场景标签页和场景模块共享的场景
pub type SharedScene = Rc<RefCell<EditorScene>>;

fn visible_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerInfo {
    pub id: u32,
    pub name: String,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
}

impl LayerInfo {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            visible: true,
            locked: false,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }
}

fn default_layers() -> Vec<LayerInfo> {
    vec![LayerInfo::new(0, "Default")]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorScene {
    pub name: String,
    /// 场景文件位置，不写入文件本身
    #[serde(skip)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub viewport: SceneViewport,
    pub width: f32,
    pub height: f32,
    #[serde(default = "default_layers")]
    pub layers: Vec<LayerInfo>,
    #[serde(default)]
    pub schemes: Vec<EntityScheme>,
}

impl EditorScene {
    pub fn new(name: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            name: name.into(),
            path: None,
            viewport: SceneViewport::default(),
            width,
            height,
            layers: default_layers(),
            schemes: Vec::new(),
        }
    }

    pub fn into_shared(self) -> SharedScene {
        Rc::new(RefCell::new(self))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> EditorResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut scene: EditorScene = serde_json::from_str(&content)?;
        scene.path = Some(path.to_path_buf());
        tracing::debug!(
            target: "scene",
            "Loaded scene '{}' with {} entities from {}",
            scene.name,
            scene.schemes.len(),
            path.display()
        );
        Ok(scene)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> EditorResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 保存到加载时的路径，没有路径时返回 `false`
    pub fn save(&self) -> EditorResult<bool> {
        match &self.path {
            Some(path) => {
                self.save_to(path)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn layer(&self, id: u32) -> Option<&LayerInfo> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// 添加图层，编号为现有最大编号加一
    pub fn add_layer(&mut self, name: impl Into<String>) -> u32 {
        let id = self.layers.iter().map(|l| l.id + 1).max().unwrap_or(0);
        self.layers.push(LayerInfo::new(id, name));
        id
    }
}
