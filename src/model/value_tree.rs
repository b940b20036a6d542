//! 值树（Value Tree）：以显式 Path 对任意 JSON 树做读写
//!
//! 读取从不报错，解析不到即返回 None；写入时自动补全缺失的中间容器，
//! 保证一次编辑不会因为路径结构不完整而丢失。

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("路径格式错误: {path} ({reason})")]
    BadPath { path: String, reason: String },
    #[error("路径 {path} 不可写: 数组不能以键 '{key}' 寻址")]
    KindMismatch { path: String, key: String },
    #[error("路径 {path} 不可写: 下标 {index} 超出数组长度 {len} 过多")]
    IndexOutOfRange { path: String, index: usize, len: usize },
}

/// 越界写入时最多以 null 补齐的元素个数
pub const MAX_ARRAY_PADDING: usize = 1024;

/// 路径中的一段：对象键或数组下标
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    /// 由字符串段构造，规范的十进制数字（"0"、"12"，不含 "01"）视为下标
    pub fn parse(text: &str) -> Self {
        match canonical_index(text) {
            Some(idx) => Self::Index(idx),
            None => Self::Key(text.to_string()),
        }
    }

    /// 作为对象键使用时的文本
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            Self::Key(k) => Cow::Borrowed(k.as_str()),
            Self::Index(i) => Cow::Owned(i.to_string()),
        }
    }

    /// 作为数组下标使用时的值
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Key(k) => canonical_index(k),
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }
}

fn canonical_index(text: &str) -> Option<usize> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if text.len() > 1 && text.starts_with('0') {
        return None;
    }
    text.parse().ok()
}

impl From<&str> for PathSegment {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl From<String> for PathSegment {
    fn from(text: String) -> Self {
        match canonical_index(&text) {
            Some(idx) => Self::Index(idx),
            None => Self::Key(text),
        }
    }
}

impl From<usize> for PathSegment {
    fn from(idx: usize) -> Self {
        Self::Index(idx)
    }
}

/// 树中某个位置的唯一标识；空路径即根
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<PathSegment>);

impl Path {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.0.push(segment.into());
    }

    /// 返回追加一段后的新路径
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut next = self.clone();
        next.push(segment);
        next
    }

    /// 以 JSONPath 形式输出（与影子树使用同一套写法）
    pub fn to_json_path(&self) -> String {
        let mut out = String::from("$");
        for seg in &self.0 {
            match seg {
                PathSegment::Index(i) => out.push_str(&format!("[{}]", i)),
                PathSegment::Key(k) => {
                    // 字段含特殊字符时使用 bracket-notation
                    if !k.is_empty() && k.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                        out.push('.');
                        out.push_str(k);
                    } else {
                        let escaped = k.replace('\\', "\\\\").replace('\'', "\\'");
                        out.push_str(&format!("['{}']", escaped));
                    }
                }
            }
        }
        out
    }

    /// 解析路径文本
    ///
    /// 以 `$` 开头按 JSONPath 规范化路径解析（`$.a`、`$['a b']`、`$[0]`、`$.['a'][0]`），
    /// 否则按点分形式解析（`scenarios.0.statuscode`），空串为根。
    pub fn parse(text: &str) -> Result<Self, TreeError> {
        let trimmed = text.trim();
        if trimmed.starts_with('$') {
            return parse_json_path(trimmed);
        }
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        Ok(trimmed.split('.').map(PathSegment::parse).collect())
    }
}

fn bad_path(text: &str, reason: &str) -> TreeError {
    TreeError::BadPath {
        path: text.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_json_path(text: &str) -> Result<Path, TreeError> {
    let chars: Vec<char> = text.chars().collect();
    let mut segments = Vec::new();
    let mut i = 1;

    while i < chars.len() {
        match chars[i] {
            '.' => {
                i += 1;
                // jsonpath-rust 的规范化路径形如 $.['a']
                if chars.get(i) == Some(&'[') {
                    continue;
                }
                let start = i;
                while i < chars.len() && chars[i] != '.' && chars[i] != '[' {
                    i += 1;
                }
                if start == i {
                    return Err(bad_path(text, "字段名为空"));
                }
                segments.push(PathSegment::Key(chars[start..i].iter().collect()));
            }
            '[' => {
                i += 1;
                match chars.get(i) {
                    Some(&quote @ ('\'' | '"')) => {
                        i += 1;
                        let mut name = String::new();
                        loop {
                            match chars.get(i) {
                                None => return Err(bad_path(text, "引号未闭合")),
                                Some('\\') => {
                                    let Some(&escaped) = chars.get(i + 1) else {
                                        return Err(bad_path(text, "转义符位于末尾"));
                                    };
                                    name.push(escaped);
                                    i += 2;
                                }
                                Some(&c) if c == quote => {
                                    i += 1;
                                    break;
                                }
                                Some(&c) => {
                                    name.push(c);
                                    i += 1;
                                }
                            }
                        }
                        if chars.get(i) != Some(&']') {
                            return Err(bad_path(text, "缺少 ']'"));
                        }
                        i += 1;
                        segments.push(PathSegment::Key(name));
                    }
                    _ => {
                        let start = i;
                        while i < chars.len() && chars[i] != ']' {
                            i += 1;
                        }
                        if i >= chars.len() {
                            return Err(bad_path(text, "缺少 ']'"));
                        }
                        let digits: String = chars[start..i].iter().collect();
                        let idx = digits
                            .trim()
                            .parse::<usize>()
                            .map_err(|_| bad_path(text, "下标不是非负整数"))?;
                        i += 1;
                        segments.push(PathSegment::Index(idx));
                    }
                }
            }
            _ => return Err(bad_path(text, "意外的字符")),
        }
    }

    Ok(Path(segments))
}

impl<S: Into<PathSegment>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_path())
    }
}

impl FromStr for Path {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// 深拷贝：结果与原值结构相等，且所有容器都是独立存储
pub fn deep_clone(value: &Value) -> Value {
    value.clone()
}

/// 按路径逐段读取；任一段无法解析（容器类型不符、键缺失、下标越界）即返回 None
pub fn get_at_path<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
    path.segments().iter().try_fold(root, |cur, seg| match cur {
        Value::Object(map) => map.get(&*seg.as_key()),
        Value::Array(arr) => seg.as_index().and_then(|i| arr.get(i)),
        _ => None,
    })
}

/// 按路径取可变引用，不做自动补全
pub fn get_at_path_mut<'a>(root: &'a mut Value, path: &Path) -> Option<&'a mut Value> {
    path.segments().iter().try_fold(root, |cur, seg| match cur {
        Value::Object(map) => map.get_mut(&*seg.as_key()),
        Value::Array(arr) => seg.as_index().and_then(move |i| arr.get_mut(i)),
        _ => None,
    })
}

/// 按路径写入
///
/// 缺失的中间容器按下一段的类型创建（下标 → 数组，否则 → 对象），
/// 中间位置若是标量或 null 也会被替换为所需容器；下标越界时以 null 补齐。
/// 空路径替换整个根。只有“以非数字键写入已存在的数组”会报错，因为那会毁掉数组数据。
pub fn set_at_path(root: &mut Value, path: &Path, value: Value) -> Result<(), TreeError> {
    let segments = path.segments();
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return Ok(());
    };

    check_writable(root, path)?;

    let mut cur = root;
    for (depth, seg) in parents.iter().enumerate() {
        let slot = slot_mut(cur, seg, path)?;
        if !slot.is_object() && !slot.is_array() {
            if !slot.is_null() {
                tracing::debug!("路径 {} 第 {} 段处的标量被替换为容器", path, depth);
            }
            *slot = empty_container_for(&segments[depth + 1]);
        }
        cur = slot;
    }

    *slot_mut(cur, last, path)? = value;
    Ok(())
}

fn empty_container_for(next: &PathSegment) -> Value {
    if next.is_index() {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

/// 写入前先沿路径检查一遍，失败的写入不会留下半途创建的容器
fn check_writable(root: &Value, path: &Path) -> Result<(), TreeError> {
    let mut cur = Some(root);
    for seg in path.segments() {
        cur = match cur {
            Some(Value::Object(map)) => map.get(&*seg.as_key()),
            Some(Value::Array(arr)) => {
                let idx = checked_index(seg, arr.len(), path)?;
                arr.get(idx)
            }
            // 这里会新建容器，只有下标段会建出空数组
            _ => {
                if seg.is_index() {
                    checked_index(seg, 0, path)?;
                }
                None
            }
        };
    }
    Ok(())
}

/// 数组可写的下标：必须是数字，且越界补齐不超过上限
fn checked_index(seg: &PathSegment, len: usize, path: &Path) -> Result<usize, TreeError> {
    let idx = seg.as_index().ok_or_else(|| TreeError::KindMismatch {
        path: path.to_string(),
        key: seg.as_key().into_owned(),
    })?;
    if idx.saturating_sub(len) > MAX_ARRAY_PADDING || idx.checked_add(1).is_none() {
        return Err(TreeError::IndexOutOfRange {
            path: path.to_string(),
            index: idx,
            len,
        });
    }
    Ok(idx)
}

fn slot_mut<'a>(
    cur: &'a mut Value,
    seg: &PathSegment,
    path: &Path,
) -> Result<&'a mut Value, TreeError> {
    match cur {
        Value::Object(map) => Ok(map.entry(seg.as_key().into_owned()).or_insert(Value::Null)),
        Value::Array(arr) => {
            let idx = checked_index(seg, arr.len(), path)?;
            if idx >= arr.len() {
                arr.resize(idx + 1, Value::Null);
            }
            Ok(&mut arr[idx])
        }
        other => {
            *other = empty_container_for(seg);
            slot_mut(other, seg, path)
        }
    }
}

/// 树的最大嵌套深度（标量为 0），迭代实现，不受递归栈限制
pub fn nesting_depth(root: &Value) -> usize {
    let mut max = 0;
    let mut stack = vec![(root, 0usize)];
    while let Some((value, depth)) = stack.pop() {
        match value {
            Value::Object(map) => {
                max = max.max(depth + 1);
                stack.extend(map.values().map(|child| (child, depth + 1)));
            }
            Value::Array(arr) => {
                max = max.max(depth + 1);
                stack.extend(arr.iter().map(|child| (child, depth + 1)));
            }
            _ => {}
        }
    }
    max
}
