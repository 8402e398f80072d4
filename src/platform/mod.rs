// ============================================================================
// Platform Abstraction
// ============================================================================
//
// 编辑器本身不创建窗口；宿主程序通过 `Graphics` 提供当前窗口尺寸和帧间隔。

use std::cell::Cell;

pub mod input;

pub use input::{
    dispatch_input, InputEvent, InputEventType, KeyCode, Modifiers, ModuleInput, MouseButton,
    WidgetId,
};

/// 窗口与帧时间信息
pub trait Graphics {
    /// 窗口宽度（像素）
    fn width(&self) -> u32;
    /// 窗口高度（像素）
    fn height(&self) -> u32;
    /// 上一帧耗时（秒）
    fn delta_time(&self) -> f32;
}

/// 无窗口环境下的 `Graphics` 实现，供测试和离线工具使用
#[derive(Debug)]
pub struct HeadlessGraphics {
    width: Cell<u32>,
    height: Cell<u32>,
    delta: Cell<f32>,
}

impl Default for HeadlessGraphics {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl HeadlessGraphics {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: Cell::new(width),
            height: Cell::new(height),
            delta: Cell::new(1.0 / 60.0),
        }
    }

    pub fn set_size(&self, width: u32, height: u32) {
        self.width.set(width);
        self.height.set(height);
    }

    pub fn set_delta_time(&self, delta: f32) {
        self.delta.set(delta);
    }
}

impl Graphics for HeadlessGraphics {
    fn width(&self) -> u32 {
        self.width.get()
    }

    fn height(&self) -> u32 {
        self.height.get()
    }

    fn delta_time(&self) -> f32 {
        self.delta.get()
    }
}
