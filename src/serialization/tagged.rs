//! 标签字段编解码
//!
//! 每个字段以 `(tag, payload)` 的形式写入，payload 本身是字段值的 bincode 编码。
//! 读取时：
//! - 未知标签直接跳过（新版本写入、旧版本读取）
//! - 缺失标签回退到调用方提供的默认值（旧版本写入、新版本读取）
//!
//! 标签一经发布就不能复用于其他含义。

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::{CodecError, CodecResult, EditorResult};

/// 记录头魔数 ("TGRD")
pub const TAGGED_MAGIC: u32 = 0x5447_5244;

#[derive(Serialize, Deserialize)]
struct TaggedField {
    tag: u32,
    payload: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct TaggedBlob {
    magic: u32,
    fields: Vec<TaggedField>,
}

/// 标签字段写入器
#[derive(Default)]
pub struct TaggedWriter {
    fields: Vec<TaggedField>,
}

impl TaggedWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一个字段；同一标签只能写一次
    pub fn write<T: Serialize>(&mut self, tag: u32, value: &T) -> CodecResult<&mut Self> {
        if self.fields.iter().any(|f| f.tag == tag) {
            return Err(CodecError::DuplicateTag(tag));
        }
        let payload = bincode::serialize(value).map_err(|e| CodecError::Encode {
            tag,
            reason: e.to_string(),
        })?;
        self.fields.push(TaggedField { tag, payload });
        Ok(self)
    }

    pub fn finish(self) -> CodecResult<Vec<u8>> {
        let blob = TaggedBlob {
            magic: TAGGED_MAGIC,
            fields: self.fields,
        };
        Ok(bincode::serialize(&blob)?)
    }
}

/// 标签字段读取器
pub struct TaggedReader {
    fields: BTreeMap<u32, Vec<u8>>,
}

impl TaggedReader {
    pub fn from_bytes(bytes: &[u8]) -> CodecResult<Self> {
        let blob: TaggedBlob = bincode::deserialize(bytes)?;
        if blob.magic != TAGGED_MAGIC {
            return Err(CodecError::BadMagic(blob.magic));
        }

        let mut fields = BTreeMap::new();
        for field in blob.fields {
            if fields.insert(field.tag, field.payload).is_some() {
                return Err(CodecError::DuplicateTag(field.tag));
            }
        }
        Ok(Self { fields })
    }

    pub fn has(&self, tag: u32) -> bool {
        self.fields.contains_key(&tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = u32> + '_ {
        self.fields.keys().copied()
    }

    /// 读取字段；标签缺失时返回 `default`
    pub fn read_or<T: DeserializeOwned>(&self, tag: u32, default: T) -> CodecResult<T> {
        match self.fields.get(&tag) {
            Some(payload) => bincode::deserialize(payload).map_err(|e| CodecError::Decode {
                tag,
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }
}

/// 以标签字段持久化的记录
pub trait TaggedRecord: Default {
    fn write_fields(&self, writer: &mut TaggedWriter) -> CodecResult<()>;

    fn read_fields(reader: &TaggedReader) -> CodecResult<Self>;

    fn to_tagged_bytes(&self) -> CodecResult<Vec<u8>> {
        let mut writer = TaggedWriter::new();
        self.write_fields(&mut writer)?;
        writer.finish()
    }

    fn from_tagged_bytes(bytes: &[u8]) -> CodecResult<Self> {
        let reader = TaggedReader::from_bytes(bytes)?;
        Self::read_fields(&reader)
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> EditorResult<()> {
        let bytes = self.to_tagged_bytes()?;
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }

    /// 文件不存在时返回默认值，文件损坏时返回错误
    fn load_or_default<P: AsRef<Path>>(path: P) -> EditorResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let bytes = fs::read(path)?;
        Ok(Self::from_tagged_bytes(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tags_are_skipped() {
        let mut writer = TaggedWriter::new();
        writer.write(0, &true).unwrap();
        writer.write(42, &"from the future".to_string()).unwrap();
        let bytes = writer.finish().unwrap();

        let reader = TaggedReader::from_bytes(&bytes).unwrap();
        assert!(reader.read_or(0, false).unwrap());
        assert_eq!(reader.read_or(7, 19u32).unwrap(), 19);
        assert_eq!(reader.tags().collect::<Vec<_>>(), vec![0, 42]);
    }

    #[test]
    fn test_duplicate_tag_rejected_on_write() {
        let mut writer = TaggedWriter::new();
        writer.write(1, &1u8).unwrap();
        assert!(matches!(
            writer.write(1, &2u8),
            Err(CodecError::DuplicateTag(1))
        ));
    }

    #[test]
    fn test_bad_magic() {
        let blob = TaggedBlob {
            magic: 0xDEAD_BEEF,
            fields: Vec::new(),
        };
        let bytes = bincode::serialize(&blob).unwrap();
        assert!(matches!(
            TaggedReader::from_bytes(&bytes),
            Err(CodecError::BadMagic(0xDEAD_BEEF))
        ));
    }

    #[test]
    fn test_type_mismatch_is_decode_error() {
        let mut writer = TaggedWriter::new();
        writer.write(3, &1u8).unwrap();
        let reader = TaggedReader::from_bytes(&writer.finish().unwrap()).unwrap();
        assert!(matches!(
            reader.read_or(3, String::new()),
            Err(CodecError::Decode { tag: 3, .. })
        ));
    }

    #[test]
    fn test_truncated_input() {
        assert!(matches!(
            TaggedReader::from_bytes(&[1, 2]),
            Err(CodecError::Malformed(_))
        ));
    }
}
