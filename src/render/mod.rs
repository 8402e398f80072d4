//! 渲染数据
//!
//! 编辑器只负责生成绘制命令，GPU 提交由宿主完成。

pub mod batch;

pub use batch::{borrow_batch, DrawCommand, DrawPass, RenderBatch, SharedBatch};
