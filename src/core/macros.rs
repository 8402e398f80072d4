//! 核心宏定义
//!
//! 配置和数据记录大量使用"字段 + 默认值"的写法，这里统一生成 `Default` 实现。

/// 为结构体实现Default trait的宏
///
/// 使用示例:
/// ```rust
/// use scene_editor::impl_default;
///
/// struct GridStyle {
///     size: f32,
///     visible: bool,
/// }
///
/// impl_default!(GridStyle {
///     size: 32.0,
///     visible: true,
/// });
///
/// assert!(GridStyle::default().visible);
/// ```
#[macro_export]
macro_rules! impl_default {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }
    };
}

/// 为引擎管理器和系统生成 `as_any`/`as_any_mut`
#[macro_export]
macro_rules! impl_as_any {
    () => {
        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
            self
        }
    };
}

#[cfg(test)]
mod tests {
    struct Counter {
        hits: u32,
        label: String,
    }

    impl_default!(Counter {
        hits: 7,
        label: "scene".to_string(),
    });

    #[test]
    fn test_impl_default() {
        let counter = Counter::default();
        assert_eq!(counter.hits, 7);
        assert_eq!(counter.label, "scene");
    }
}
