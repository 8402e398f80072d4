//! 项目作用域：项目描述、项目模块容器和纹理缓存

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};

use super::{EditorModuleContainer, Module, ModuleContainer, ModuleLookup, ModuleRef};
use crate::core::{EditorError, EditorResult};
use crate::export::ExporterSettings;
use crate::serialization::TaggedRecord;

/// 项目描述文件名
pub const PROJECT_FILE: &str = "project.json";

const EXPORTER_SETTINGS_FILE: &str = ".editor/exporter.settings";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(skip)]
    pub root: PathBuf,
    /// 相对项目根目录
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
    #[serde(default = "default_scenes_dir")]
    pub scenes_dir: PathBuf,
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

fn default_scenes_dir() -> PathBuf {
    PathBuf::from("scenes")
}

impl Project {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            assets_dir: default_assets_dir(),
            scenes_dir: default_scenes_dir(),
        }
    }

    /// 从项目根目录下的 `project.json` 打开项目
    pub fn open<P: AsRef<Path>>(root: P) -> EditorResult<Self> {
        let root = root.as_ref();
        let content = fs::read_to_string(root.join(PROJECT_FILE))?;
        let mut project: Project = serde_json::from_str(&content)?;
        project.root = root.to_path_buf();
        tracing::info!(target: "project", "Opened project '{}' at {}", project.name, root.display());
        Ok(project)
    }

    pub fn save(&self) -> EditorResult<()> {
        fs::create_dir_all(&self.root)?;
        let content = serde_json::to_string_pretty(self)?;
        fs::write(self.root.join(PROJECT_FILE), content)?;
        Ok(())
    }

    pub fn assets_path(&self) -> PathBuf {
        self.root.join(&self.assets_dir)
    }

    pub fn scenes_path(&self) -> PathBuf {
        self.root.join(&self.scenes_dir)
    }

    pub fn exporter_settings_path(&self) -> PathBuf {
        self.root.join(EXPORTER_SETTINGS_FILE)
    }

    /// 读取导出设置，文件不存在时返回默认值
    pub fn load_exporter_settings(&self) -> EditorResult<ExporterSettings> {
        ExporterSettings::load_or_default(self.exporter_settings_path())
    }

    pub fn save_exporter_settings(&self, settings: &ExporterSettings) -> EditorResult<()> {
        settings.save(self.exporter_settings_path())
    }
}

// ============================================================================
// Texture Cache
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TextureInfo {
    pub path: String,
    pub width: u32,
    pub height: u32,
    /// 每次重载加一
    pub generation: u64,
}

/// 纹理重载通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureReloaded {
    pub path: String,
    pub generation: u64,
}

/// 项目内纹理的元数据缓存
///
/// 纹理像素由渲染后端持有，这里只记录尺寸和重载代数；
/// 场景中的 `TextureReloaderManager` 通过 `subscribe_with_id` 得到重载通知，
/// 场景关闭时用返回的 id 退订。
#[derive(Debug, Default)]
pub struct TextureCacheModule {
    textures: HashMap<String, TextureInfo>,
    subscribers: Vec<(u64, Sender<TextureReloaded>)>,
    next_subscriber: u64,
}

impl TextureCacheModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记纹理；已存在时只更新尺寸
    pub fn register(&mut self, path: impl Into<String>, width: u32, height: u32) -> &TextureInfo {
        let path = path.into();
        let info = self.textures.entry(path.clone()).or_insert_with(|| TextureInfo {
            path,
            width,
            height,
            generation: 0,
        });
        info.width = width;
        info.height = height;
        info
    }

    pub fn get(&self, path: &str) -> Option<&TextureInfo> {
        self.textures.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.textures.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// 标记纹理已重载并通知订阅者，返回新的代数
    pub fn reload(&mut self, path: &str) -> Option<u64> {
        let info = self.textures.get_mut(path)?;
        info.generation += 1;
        let event = TextureReloaded {
            path: info.path.clone(),
            generation: info.generation,
        };

        // 接收端已释放的订阅者直接移除
        self.subscribers.retain(|(_, tx)| tx.send(event.clone()).is_ok());
        tracing::debug!(target: "texture", "Reloaded {} (generation {})", event.path, event.generation);
        Some(event.generation)
    }

    pub fn reload_all(&mut self) -> usize {
        let mut paths: Vec<String> = self.textures.keys().cloned().collect();
        paths.sort();
        paths.iter().filter(|path| self.reload(path).is_some()).count()
    }

    /// 匿名订阅，接收端释放后在下一次重载时移除
    pub fn subscribe(&mut self) -> Receiver<TextureReloaded> {
        self.subscribe_with_id().1
    }

    pub fn subscribe_with_id(&mut self) -> (u64, Receiver<TextureReloaded>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let id = self.next_subscriber;
        self.next_subscriber += 1;
        self.subscribers.push((id, tx));
        (id, rx)
    }

    pub fn unsubscribe(&mut self, id: u64) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(subscriber, _)| *subscriber != id);
        before != self.subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Module for TextureCacheModule {
    fn dispose(&mut self) {
        self.subscribers.clear();
        self.textures.clear();
    }
}

// ============================================================================
// Project Module Container
// ============================================================================

pub struct ProjectModuleContainer {
    editor: Rc<EditorModuleContainer>,
    project: Option<Rc<Project>>,
    modules: ModuleContainer<dyn Module>,
}

impl ProjectModuleContainer {
    pub fn new(editor: Rc<EditorModuleContainer>) -> Self {
        Self {
            editor,
            project: None,
            modules: ModuleContainer::new("project"),
        }
    }

    /// 创建容器，设置项目并注册 `TextureCacheModule`
    pub fn with_project(editor: Rc<EditorModuleContainer>, project: Project) -> EditorResult<Self> {
        let mut container = Self::new(editor);
        container.set_project(project)?;
        container.add(TextureCacheModule::new())?;
        Ok(container)
    }

    /// 已经加载了模块之后不允许再更换项目
    pub fn set_project(&mut self, project: Project) -> EditorResult<()> {
        if !self.modules.is_empty() {
            return Err(EditorError::illegal_state(
                "Can't change project while modules are loaded",
            ));
        }
        tracing::debug!(target: "project", "Project set to '{}'", project.name);
        self.project = Some(Rc::new(project));
        Ok(())
    }

    pub fn project(&self) -> Option<Rc<Project>> {
        self.project.clone()
    }

    pub fn editor_container(&self) -> &Rc<EditorModuleContainer> {
        &self.editor
    }

    pub fn add<T: Module>(&mut self, module: T) -> EditorResult<ModuleRef<T>> {
        let handle = Rc::new(RefCell::new(module));
        let erased: Rc<RefCell<dyn Module>> = handle.clone();
        self.modules.insert(handle.clone(), erased.clone())?;

        if self.modules.is_initialized() {
            tracing::warn!(target: "module", "Module added to project container after init, initializing immediately");
            self.modules.init_late(&erased, &*self)?;
        }
        Ok(handle)
    }

    pub fn init(&mut self) -> EditorResult<()> {
        self.modules.init_all(&*self)?;
        tracing::info!(target: "module", "Project modules initialized: {:?}", self.modules.type_names());
        Ok(())
    }

    pub fn resize(&self) {
        self.modules.resize_all();
    }

    pub fn dispose(&mut self) {
        self.modules.dispose_all();
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }
}

impl ModuleLookup for ProjectModuleContainer {
    fn lookup_local(&self, type_id: TypeId) -> Option<Rc<dyn Any>> {
        self.modules.find(type_id)
    }

    fn lookup_in_hierarchy(&self, type_id: TypeId) -> Option<Rc<dyn Any>> {
        self.modules
            .find(type_id)
            .or_else(|| self.editor.lookup_in_hierarchy(type_id))
    }
}
