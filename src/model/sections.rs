//! 分区派生：根据顶层数据形状生成可导航的分区（标签页）列表

use serde_json::Value;

use crate::model::value_tree::{Path, PathSegment};

/// 合成的总览分区名
pub const OVERVIEW_SECTION: &str = "overview";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionShape {
    Object,
    ArrayOfObjects,
    ArrayOfScalars,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpec {
    pub name: String,
    pub path: Path,
    pub shape: SectionShape,
}

impl SectionSpec {
    pub fn overview() -> Self {
        Self {
            name: OVERVIEW_SECTION.to_string(),
            path: Path::root(),
            shape: SectionShape::Object,
        }
    }

    /// 总览分区的路径是根，数据里的同名键不会与之混淆
    pub fn is_overview(&self) -> bool {
        self.path.is_root()
    }
}

/// 派生分区：首项恒为总览，随后按插入顺序列出值为对象或对象数组的顶层键
pub fn derive_sections(root: &Value) -> Vec<SectionSpec> {
    derive_sections_with(root, &[])
}

/// 同 [`derive_sections`]，`pinned` 中的顶层键只要是容器就单独成区
pub fn derive_sections_with(root: &Value, pinned: &[String]) -> Vec<SectionSpec> {
    let mut out = vec![SectionSpec::overview()];
    let Value::Object(map) = root else {
        return out;
    };

    for (key, value) in map {
        let is_pinned = pinned.iter().any(|p| p == key);
        if let Some(shape) = section_shape(value, is_pinned) {
            out.push(SectionSpec {
                name: key.clone(),
                path: Path::new(vec![PathSegment::Key(key.clone())]),
                shape,
            });
        }
    }
    out
}

/// 顶层值对应的分区形状；标量（以及非固定键下的标量数组）不成区
pub fn section_shape(value: &Value, pinned: bool) -> Option<SectionShape> {
    match value {
        Value::Object(_) => Some(SectionShape::Object),
        Value::Array(items) => match items.first() {
            Some(Value::Object(_)) => Some(SectionShape::ArrayOfObjects),
            _ if pinned => Some(SectionShape::ArrayOfScalars),
            _ => None,
        },
        _ => None,
    }
}
