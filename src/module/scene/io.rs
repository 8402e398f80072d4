use super::{SceneContext, SceneModule};
use crate::core::EditorResult;
use crate::module::Module;
use crate::platform::ModuleInput;

/// 保存时把场景写回它的 JSON 文件
#[derive(Default)]
pub struct SceneIoModule {
    context: Option<SceneContext>,
    saves: u32,
}

impl SceneIoModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// 成功写入文件的次数
    pub fn saves(&self) -> u32 {
        self.saves
    }
}

impl Module for SceneIoModule {}

impl ModuleInput for SceneIoModule {}

impl SceneModule for SceneIoModule {
    fn set_scene_context(&mut self, context: SceneContext) {
        self.context = Some(context);
    }

    fn save(&mut self) -> EditorResult<()> {
        let Some(context) = &self.context else {
            return Ok(());
        };

        let scene = context.scene.borrow();
        if scene.save()? {
            self.saves += 1;
            tracing::info!(target: "scene", "Saved scene '{}'", scene.name);
        } else {
            tracing::debug!(target: "scene", "Scene '{}' has no file path, nothing written", scene.name);
        }
        Ok(())
    }
}
