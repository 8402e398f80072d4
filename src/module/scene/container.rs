//! 场景模块容器
//!
//! 每个打开的场景标签页一个。容器持有该场景的实体引擎，
//! 管理场景模块的生命周期，并把 UI 输入逐个转发给所有模块。

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::rc::Rc;

use super::{SceneContext, SceneModule, SceneTab};
use crate::core::{EditorError, EditorResult};
use crate::ecs::{CameraManager, EngineInfrastructure, EntityEngine, EntitySerializerManager};
use crate::module::{
    EditorModuleContainer, ModuleContainer, ModuleLookup, ModuleLookupExt, ModuleRef, Project,
    ProjectModuleContainer, TextureCacheModule,
};
use crate::platform::{Graphics, InputEvent, KeyCode, ModuleInput, MouseButton, WidgetId};
use crate::render::{borrow_batch, SharedBatch};
use crate::scene::SharedScene;

/// 按字段借用的查找视图，使得查找与引擎的可变借用可以同时存在
struct SceneLookup<'a> {
    modules: &'a ModuleContainer<dyn SceneModule>,
    parent: &'a ProjectModuleContainer,
}

impl ModuleLookup for SceneLookup<'_> {
    fn lookup_local(&self, type_id: TypeId) -> Option<Rc<dyn Any>> {
        self.modules.find(type_id)
    }

    fn lookup_in_hierarchy(&self, type_id: TypeId) -> Option<Rc<dyn Any>> {
        self.modules
            .find(type_id)
            .or_else(|| self.parent.lookup_in_hierarchy(type_id))
    }
}

pub struct SceneModuleContainer {
    project_container: Rc<ProjectModuleContainer>,
    editor_container: Rc<EditorModuleContainer>,
    graphics: Rc<dyn Graphics>,
    project: Option<Rc<Project>>,
    tab: SceneTab,
    scene: SharedScene,
    engine: EntityEngine,
    modules: ModuleContainer<dyn SceneModule>,
    init_attempted: bool,
    initialized: bool,
}

impl SceneModuleContainer {
    /// 使用标准基础设施创建容器
    ///
    /// 父容器中必须已有 `TextureCacheModule`。
    pub fn new(
        parent: Rc<ProjectModuleContainer>,
        tab: SceneTab,
        scene: SharedScene,
        batch: &SharedBatch,
    ) -> EditorResult<Self> {
        let texture_cache = parent.require::<TextureCacheModule>()?;
        let infrastructure = EngineInfrastructure::standard(batch, &texture_cache, &scene.borrow());
        Self::with_infrastructure(parent, tab, scene, infrastructure)
    }

    pub fn with_infrastructure(
        parent: Rc<ProjectModuleContainer>,
        tab: SceneTab,
        scene: SharedScene,
        infrastructure: EngineInfrastructure,
    ) -> EditorResult<Self> {
        if !infrastructure.has_manager::<CameraManager>() {
            return Err(EditorError::missing("CameraManager"));
        }

        let mut engine = EntityEngine::new();
        infrastructure.install(&mut engine)?;

        let editor_container = Rc::clone(parent.editor_container());
        let graphics = editor_container.graphics();
        tracing::debug!(
            target: "scene",
            tab = tab.id,
            systems = engine.system_count(),
            managers = engine.managers().len(),
            "Scene container created for '{}'",
            tab.title
        );

        Ok(Self {
            project: parent.project(),
            project_container: parent,
            editor_container,
            graphics,
            tab,
            scene,
            engine,
            modules: ModuleContainer::new("scene"),
            init_attempted: false,
            initialized: false,
        })
    }

    fn lookup(&self) -> SceneLookup<'_> {
        SceneLookup {
            modules: &self.modules,
            parent: &self.project_container,
        }
    }

    fn scene_context(&self) -> EditorResult<SceneContext> {
        let project = self
            .project
            .clone()
            .ok_or_else(|| EditorError::missing("project"))?;
        Ok(SceneContext {
            project,
            project_container: Rc::clone(&self.project_container),
            editor_container: Rc::clone(&self.editor_container),
            tab: self.tab.clone(),
            scene: Rc::clone(&self.scene),
        })
    }

    /// 添加模块
    ///
    /// 先注入场景上下文，模块若能配置实体引擎则立即调用其钩子，最后才注册。
    /// 任一步失败时模块不会被注册，钩子对引擎的注册也会被撤销。
    pub fn add<T: SceneModule>(&mut self, module: T) -> EditorResult<ModuleRef<T>> {
        self.modules.ensure_absent::<T>()?;
        let context = self.scene_context()?;

        let handle = Rc::new(RefCell::new(module));
        handle.borrow_mut().set_scene_context(context);

        let modules = &mut self.modules;
        let parent = &self.project_container;
        self.engine.transaction(|engine| {
            if let Some(configurator) = handle.borrow_mut().as_engine_configurator() {
                tracing::debug!(target: "scene", "Configuring EntityEngine for {}", std::any::type_name::<T>());
                configurator.setup_entity_engine(engine)?;
            }

            let erased: Rc<RefCell<dyn SceneModule>> = handle.clone();
            modules.insert(handle.clone(), erased.clone())?;
            if !modules.is_initialized() {
                return Ok(());
            }

            tracing::warn!(target: "scene", "Module added to scene container after init, initializing immediately");
            let late = {
                let lookup = SceneLookup {
                    modules: &*modules,
                    parent,
                };
                modules.init_late(&erased, &lookup)
            };
            if late.is_err() {
                modules.remove(TypeId::of::<T>());
            }
            late
        })?;
        Ok(handle)
    }

    /// 初始化模块和实体引擎，按声明顺序创建场景中的实体，最后向引擎注入模块
    ///
    /// 只能调用一次。失败后容器保持未初始化，再次调用也会失败，只能 `dispose`。
    pub fn init(&mut self) -> EditorResult<()> {
        if self.initialized {
            return Err(EditorError::illegal_state("Scene module container already initialized"));
        }
        if self.init_attempted {
            return Err(EditorError::illegal_state("Scene module container failed to initialize earlier"));
        }
        self.init_attempted = true;

        let lookup = SceneLookup {
            modules: &self.modules,
            parent: &self.project_container,
        };
        self.modules.init_all(&lookup)?;
        self.engine.initialize()?;

        tracing::debug!(target: "scene", "Populating EntityEngine");
        let scene = self.scene.borrow();
        for (index, scheme) in scene.schemes.iter().enumerate() {
            if let Err(e) = scheme.build(&mut self.engine) {
                tracing::error!(target: "scene", "Failed to build entity #{} of '{}': {}", index, scene.name, e);
                return Err(e);
            }
        }
        let built = scene.schemes.len();
        drop(scene);

        self.engine.inject_modules(&lookup)?;
        self.initialized = true;
        tracing::info!(
            target: "scene",
            modules = self.modules.len(),
            entities = built,
            "Scene '{}' initialized",
            self.tab.title
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// 本地查找，找不到时沿父容器向上查找
    pub fn find_in_hierarchy<T: Any>(&self) -> Option<ModuleRef<T>> {
        <Self as ModuleLookupExt>::find_in_hierarchy::<T>(self)
    }

    pub fn project(&self) -> Option<Rc<Project>> {
        self.project.clone()
    }

    /// 已经加载了模块之后不允许再更换项目
    pub fn set_project(&mut self, project: Rc<Project>) -> EditorResult<()> {
        if !self.modules.is_empty() {
            return Err(EditorError::illegal_state(
                "Can't change project while modules are loaded",
            ));
        }
        self.project = Some(project);
        Ok(())
    }

    /// 先调用模块的 `resize`，再按当前窗口尺寸调整相机
    pub fn resize(&mut self) -> EditorResult<()> {
        self.modules.resize_all();

        let (width, height) = (self.graphics.width(), self.graphics.height());
        self.engine
            .manager_mut::<CameraManager>()
            .ok_or_else(|| EditorError::missing("CameraManager"))?
            .resize(width, height);
        Ok(())
    }

    /// 推进实体引擎一帧，然后按注册顺序渲染模块
    pub fn render(&mut self, batch: &SharedBatch) -> EditorResult<()> {
        self.engine.set_delta(self.graphics.delta_time());
        self.engine.process()?;

        let mut batch = borrow_batch(batch)?;
        for module in self.modules.snapshot() {
            module.borrow_mut().render(&mut batch)?;
        }
        Ok(())
    }

    pub fn on_show(&mut self) {
        self.fan_out(|m| m.on_show());
    }

    pub fn on_hide(&mut self) {
        self.fan_out(|m| m.on_hide());
    }

    /// 把引擎中的实体写回场景，然后通知所有模块保存
    ///
    /// 所有模块都会收到 `save`，返回第一个错误。
    pub fn save(&mut self) -> EditorResult<()> {
        if self.engine.is_initialized() {
            let schemes = self
                .engine
                .with_manager::<EntitySerializerManager, _>(|serializer, world| serializer.serialize_all(world));
            match schemes {
                Some(schemes) => {
                    tracing::debug!(target: "scene", "Synced {} entities into scene", schemes.len());
                    self.scene.borrow_mut().schemes = schemes;
                }
                None => tracing::debug!(target: "scene", "No EntitySerializerManager, scene schemes left untouched"),
            }
        }

        let mut first_error = None;
        for module in self.modules.snapshot() {
            if let Err(e) = module.borrow_mut().save() {
                tracing::error!(target: "scene", "Module save failed: {}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub fn dispose(&mut self) {
        self.modules.dispose_all();
        self.engine.dispose();
        tracing::debug!(target: "scene", "Scene container for '{}' disposed", self.tab.title);
    }

    pub fn entity_engine(&self) -> &EntityEngine {
        &self.engine
    }

    pub fn entity_engine_mut(&mut self) -> &mut EntityEngine {
        &mut self.engine
    }

    pub fn scene(&self) -> &SharedScene {
        &self.scene
    }

    pub fn tab(&self) -> &SceneTab {
        &self.tab
    }

    pub fn project_container(&self) -> &Rc<ProjectModuleContainer> {
        &self.project_container
    }

    pub fn editor_container(&self) -> &Rc<EditorModuleContainer> {
        &self.editor_container
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    fn fan_out(&self, mut f: impl FnMut(&mut dyn SceneModule)) {
        for module in self.modules.snapshot() {
            f(&mut *module.borrow_mut());
        }
    }

    /// 所有模块都会被调用，任一返回 `true` 即视为已处理
    fn fan_out_any(&self, mut f: impl FnMut(&mut dyn SceneModule) -> bool) -> bool {
        let mut handled = false;
        for module in self.modules.snapshot() {
            if f(&mut *module.borrow_mut()) {
                handled = true;
            }
        }
        handled
    }
}

impl ModuleLookup for SceneModuleContainer {
    fn lookup_local(&self, type_id: TypeId) -> Option<Rc<dyn Any>> {
        self.lookup().lookup_local(type_id)
    }

    fn lookup_in_hierarchy(&self, type_id: TypeId) -> Option<Rc<dyn Any>> {
        self.lookup().lookup_in_hierarchy(type_id)
    }
}

impl ModuleInput for SceneModuleContainer {
    fn touch_down(&mut self, event: &InputEvent, x: f32, y: f32, pointer: u32, button: MouseButton) -> bool {
        self.fan_out_any(|m| m.touch_down(event, x, y, pointer, button))
    }

    fn touch_up(&mut self, event: &InputEvent, x: f32, y: f32, pointer: u32, button: MouseButton) {
        self.fan_out(|m| m.touch_up(event, x, y, pointer, button));
    }

    fn touch_dragged(&mut self, event: &InputEvent, x: f32, y: f32, pointer: u32) {
        self.fan_out(|m| m.touch_dragged(event, x, y, pointer));
    }

    fn mouse_moved(&mut self, event: &InputEvent, x: f32, y: f32) -> bool {
        self.fan_out_any(|m| m.mouse_moved(event, x, y))
    }

    fn enter(&mut self, event: &InputEvent, x: f32, y: f32, pointer: u32, from: Option<WidgetId>) {
        self.fan_out(|m| m.enter(event, x, y, pointer, from));
    }

    fn exit(&mut self, event: &InputEvent, x: f32, y: f32, pointer: u32, to: Option<WidgetId>) {
        self.fan_out(|m| m.exit(event, x, y, pointer, to));
    }

    fn scrolled(&mut self, event: &InputEvent, x: f32, y: f32, amount: i32) -> bool {
        self.fan_out_any(|m| m.scrolled(event, x, y, amount))
    }

    fn key_down(&mut self, event: &InputEvent, key: KeyCode) -> bool {
        self.fan_out_any(|m| m.key_down(event, key))
    }

    fn key_up(&mut self, event: &InputEvent, key: KeyCode) -> bool {
        self.fan_out_any(|m| m.key_up(event, key))
    }

    fn key_typed(&mut self, event: &InputEvent, character: char) -> bool {
        self.fan_out_any(|m| m.key_typed(event, character))
    }
}
