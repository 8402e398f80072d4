//! 持久化格式
//!
//! - `tagged` - 按整数标签存储字段、可跨版本兼容的二进制记录

pub mod tagged;

pub use tagged::{TaggedReader, TaggedRecord, TaggedWriter, TAGGED_MAGIC};
