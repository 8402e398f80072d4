//! 统一错误处理模块
//!
//! 提供编辑器范围内的统一错误类型定义
//!
//! ## 错误类型分层
//!
//! - `EditorError`: 模块容器、实体引擎、场景加载等所有公开操作的错误
//! - `SchemeError`: 实体模板（scheme）构建失败
//! - `CodecError`: 标签字段编解码失败（见 `serialization::tagged`）
//! - `ConfigError`: 配置文件读取、解析和验证失败（见 `config`）
//!
//! 所有违反不变量的情况都以 `Err` 返回并由调用方用 `?` 向上传播，
//! 非测试代码中不使用 panic。

use thiserror::Error;

use crate::config::ConfigError;

/// 编辑器核心错误类型
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(&'static str),

    #[error("Module already added: {0}")]
    DuplicateModule(&'static str),

    #[error("Entity scheme error: {0}")]
    Scheme(#[from] SchemeError),

    #[error("Render batch error: {0}")]
    Batch(String),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scene file error: {0}")]
    SceneFile(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EditorError {
    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState(message.into())
    }

    pub fn missing(dependency: impl Into<String>) -> Self {
        Self::MissingDependency(dependency.into())
    }
}

/// 实体模板构建错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemeError {
    #[error("Component {0} declared more than once")]
    DuplicateComponent(&'static str),

    #[error("Invalid {component} component: {reason}")]
    InvalidValue {
        component: &'static str,
        reason: String,
    },

    #[error("Scheme has no components")]
    Empty,
}

/// 标签字段编解码错误
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Encoding failed for tag {tag}: {reason}")]
    Encode { tag: u32, reason: String },

    #[error("Decoding failed for tag {tag}: {reason}")]
    Decode { tag: u32, reason: String },

    #[error("Duplicate tag {0}")]
    DuplicateTag(u32),

    #[error("Not a tagged record (magic {0:#010x})")]
    BadMagic(u32),

    #[error("Malformed tagged record: {0}")]
    Malformed(#[from] bincode::Error),
}

/// 编辑器结果类型别名
pub type EditorResult<T> = Result<T, EditorError>;
pub type CodecResult<T> = Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let scheme_err = SchemeError::DuplicateComponent("Sprite");
        let editor_err: EditorError = scheme_err.into();
        assert!(matches!(editor_err, EditorError::Scheme(_)));
    }

    #[test]
    fn test_error_display() {
        let err = EditorError::illegal_state("Project can't be changed while modules are loaded");
        assert_eq!(
            err.to_string(),
            "Illegal state: Project can't be changed while modules are loaded"
        );
        assert_eq!(
            CodecError::DuplicateTag(3).to_string(),
            "Duplicate tag 3"
        );
    }
}
