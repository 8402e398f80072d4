use serde::{Deserialize, Serialize};

use crate::core::CodecResult;
use crate::impl_default;
use crate::serialization::{TaggedReader, TaggedRecord, TaggedWriter};

/// 纹理过滤模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFilter {
    Nearest,
    Linear,
    MipMap,
    MipMapNearestNearest,
    MipMapLinearNearest,
    MipMapNearestLinear,
    MipMapLinearLinear,
}

impl TextureFilter {
    /// 是否需要生成 mipmap
    pub fn is_mip_map(&self) -> bool {
        !matches!(self, TextureFilter::Nearest | TextureFilter::Linear)
    }
}

/// 默认导出器设置
///
/// 字段标签（0-4）写入项目文件，顺序和含义不能改变。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterSettings {
    /// tag 0
    pub skip_default_values: bool,
    /// tag 1
    pub use_minimal_output_type: bool,
    /// tag 2
    pub package_separate_atlas_for_each_scene: bool,
    /// tag 3
    pub mag_texture_filter: TextureFilter,
    /// tag 4
    pub min_texture_filter: TextureFilter,
}

impl_default!(ExporterSettings {
    skip_default_values: true,
    use_minimal_output_type: true,
    package_separate_atlas_for_each_scene: false,
    mag_texture_filter: TextureFilter::Nearest,
    min_texture_filter: TextureFilter::Nearest,
});

impl ExporterSettings {
    pub const TAG_SKIP_DEFAULT_VALUES: u32 = 0;
    pub const TAG_USE_MINIMAL_OUTPUT_TYPE: u32 = 1;
    pub const TAG_PACKAGE_SEPARATE_ATLAS: u32 = 2;
    pub const TAG_MAG_TEXTURE_FILTER: u32 = 3;
    pub const TAG_MIN_TEXTURE_FILTER: u32 = 4;
}

impl TaggedRecord for ExporterSettings {
    fn write_fields(&self, writer: &mut TaggedWriter) -> CodecResult<()> {
        writer
            .write(Self::TAG_SKIP_DEFAULT_VALUES, &self.skip_default_values)?
            .write(Self::TAG_USE_MINIMAL_OUTPUT_TYPE, &self.use_minimal_output_type)?
            .write(
                Self::TAG_PACKAGE_SEPARATE_ATLAS,
                &self.package_separate_atlas_for_each_scene,
            )?
            .write(Self::TAG_MAG_TEXTURE_FILTER, &self.mag_texture_filter)?
            .write(Self::TAG_MIN_TEXTURE_FILTER, &self.min_texture_filter)?;
        Ok(())
    }

    fn read_fields(reader: &TaggedReader) -> CodecResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            skip_default_values: reader
                .read_or(Self::TAG_SKIP_DEFAULT_VALUES, defaults.skip_default_values)?,
            use_minimal_output_type: reader.read_or(
                Self::TAG_USE_MINIMAL_OUTPUT_TYPE,
                defaults.use_minimal_output_type,
            )?,
            package_separate_atlas_for_each_scene: reader.read_or(
                Self::TAG_PACKAGE_SEPARATE_ATLAS,
                defaults.package_separate_atlas_for_each_scene,
            )?,
            mag_texture_filter: reader
                .read_or(Self::TAG_MAG_TEXTURE_FILTER, defaults.mag_texture_filter)?,
            min_texture_filter: reader
                .read_or(Self::TAG_MIN_TEXTURE_FILTER, defaults.min_texture_filter)?,
        })
    }
}
