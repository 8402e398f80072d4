//! 绘制批次
//!
//! 记录一帧内的绘制命令，由宿主的渲染后端在帧末取走并提交 GPU。
//! `begin`/`end` 必须成对调用，嵌套或在批次外绘制都视为错误。

use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use glam::{Mat4, Vec2};

use crate::core::{EditorError, EditorResult};

/// 多个系统与模块共享的批次句柄
pub type SharedBatch = Rc<RefCell<RenderBatch>>;

/// 可变借用共享批次，批次已被借用时返回错误而不是 panic
pub fn borrow_batch(batch: &SharedBatch) -> EditorResult<RefMut<'_, RenderBatch>> {
    batch
        .try_borrow_mut()
        .map_err(|_| EditorError::Batch("render batch is already borrowed".to_string()))
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Sprite {
        texture: String,
        /// 纹理重载次数，后端据此丢弃旧的 GPU 纹理
        generation: u64,
        position: Vec2,
        size: Vec2,
        origin: Vec2,
        scale: Vec2,
        rotation: f32,
        tint: [f32; 4],
        flip_x: bool,
        flip_y: bool,
    },
    Line {
        from: Vec2,
        to: Vec2,
        color: [f32; 4],
    },
    Rect {
        min: Vec2,
        max: Vec2,
        color: [f32; 4],
        filled: bool,
    },
}

/// 一次 begin/end 之间提交的命令
#[derive(Debug, Clone, PartialEq)]
pub struct DrawPass {
    pub projection: Mat4,
    pub commands: Vec<DrawCommand>,
}

#[derive(Debug, Default)]
pub struct RenderBatch {
    current: Option<DrawPass>,
    passes: Vec<DrawPass>,
}

impl RenderBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedBatch {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn begin(&mut self, projection: Mat4) -> EditorResult<()> {
        if self.current.is_some() {
            return Err(EditorError::Batch("begin called while already drawing".to_string()));
        }
        self.current = Some(DrawPass {
            projection,
            commands: Vec::new(),
        });
        Ok(())
    }

    pub fn draw(&mut self, command: DrawCommand) -> EditorResult<()> {
        match self.current.as_mut() {
            Some(pass) => {
                pass.commands.push(command);
                Ok(())
            }
            None => Err(EditorError::Batch("draw called outside begin/end".to_string())),
        }
    }

    pub fn end(&mut self) -> EditorResult<()> {
        match self.current.take() {
            Some(pass) => {
                if !pass.commands.is_empty() {
                    self.passes.push(pass);
                }
                Ok(())
            }
            None => Err(EditorError::Batch("end called without begin".to_string())),
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.current.is_some()
    }

    pub fn passes(&self) -> &[DrawPass] {
        &self.passes
    }

    pub fn command_count(&self) -> usize {
        self.passes.iter().map(|p| p.commands.len()).sum()
    }

    /// 取走本帧所有已结束的绘制批次
    pub fn take_passes(&mut self) -> Vec<DrawPass> {
        std::mem::take(&mut self.passes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> DrawCommand {
        DrawCommand::Line {
            from: Vec2::ZERO,
            to: Vec2::ONE,
            color: [1.0; 4],
        }
    }

    #[test]
    fn test_begin_draw_end() {
        let mut batch = RenderBatch::new();
        batch.begin(Mat4::IDENTITY).unwrap();
        batch.draw(line()).unwrap();
        batch.draw(line()).unwrap();
        batch.end().unwrap();

        assert_eq!(batch.passes().len(), 1);
        assert_eq!(batch.command_count(), 2);
        assert_eq!(batch.take_passes().len(), 1);
        assert_eq!(batch.command_count(), 0);
    }

    #[test]
    fn test_misuse_is_reported() {
        let mut batch = RenderBatch::new();
        assert!(batch.draw(line()).is_err());
        assert!(batch.end().is_err());

        batch.begin(Mat4::IDENTITY).unwrap();
        assert!(matches!(batch.begin(Mat4::IDENTITY), Err(EditorError::Batch(_))));
    }

    #[test]
    fn test_empty_pass_is_dropped() {
        let mut batch = RenderBatch::new();
        batch.begin(Mat4::IDENTITY).unwrap();
        batch.end().unwrap();
        assert!(batch.passes().is_empty());
    }
}
