//! 编辑会话：持有 原始值/草稿 对，管理 查看(Viewing)/编辑(Editing) 状态
//!
//! 草稿只在编辑状态存在，是原始值的独立深拷贝；提交时整棵树一次性替换原始值，
//! 取消时直接丢弃草稿。所有分区（标签页）共享同一份草稿。

use serde_json::{Number, Value};
use thiserror::Error;

use crate::model::value_tree::{self, deep_clone, get_at_path, nesting_depth, Path};

/// 初始数据允许的最大嵌套深度
pub const MAX_NESTING_DEPTH: usize = 128;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("当前不在编辑状态")]
    NotEditing,
    #[error("编辑被拒绝 {path}: {reason}")]
    InvalidEdit { path: String, reason: String },
    #[error("数据格式无效: {0}")]
    MalformedTree(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Viewing,
    Editing,
}

#[derive(Debug)]
pub struct EditSession {
    original: Value,
    draft: Option<Value>,
}

impl EditSession {
    /// 以初始数据创建会话；数据不合格时不创建任何会话
    pub fn new(value: Value) -> Result<Self, SessionError> {
        validate_tree(&value)?;
        Ok(Self {
            original: value,
            draft: None,
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self, SessionError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| SessionError::MalformedTree(format!("JSON解析失败: {}", e)))?;
        Self::new(value)
    }

    pub fn state(&self) -> SessionState {
        if self.draft.is_some() {
            SessionState::Editing
        } else {
            SessionState::Viewing
        }
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    /// 当前已提交的值
    pub fn original(&self) -> &Value {
        &self.original
    }

    pub fn draft(&self) -> Option<&Value> {
        self.draft.as_ref()
    }

    /// 视图读取的树：编辑中为草稿，否则为原始值
    pub fn view(&self) -> &Value {
        self.draft.as_ref().unwrap_or(&self.original)
    }

    /// 交给外部协作方的只读快照（独立拷贝）
    pub fn snapshot(&self) -> Value {
        deep_clone(&self.original)
    }

    /// 进入编辑状态并以原始值的深拷贝作为草稿；已在编辑中则不做任何事，返回现有草稿
    pub fn start_edit(&mut self) -> &Value {
        if self.draft.is_some() {
            tracing::debug!("编辑会话已打开，忽略重复的 start_edit");
        } else {
            tracing::info!("开始编辑");
        }
        self.draft.get_or_insert_with(|| deep_clone(&self.original))
    }

    /// 在草稿上按路径写入（自动补全缺失容器）
    pub fn set_at_path(&mut self, path: &Path, value: Value) -> Result<(), SessionError> {
        let draft = self.draft.as_mut().ok_or(SessionError::NotEditing)?;
        value_tree::set_at_path(draft, path, value).map_err(|e| {
            tracing::warn!("编辑被拒绝 {}: {}", path, e);
            SessionError::InvalidEdit {
                path: path.to_string(),
                reason: e.to_string(),
            }
        })
    }

    /// 以文本编辑草稿中的值，按草稿当前值的类型转换
    ///
    /// 转换失败时草稿保持不变并返回 InvalidEdit；成功时返回实际写入的值。
    pub fn set_text_at_path(&mut self, path: &Path, text: &str) -> Result<Value, SessionError> {
        let draft = self.draft.as_ref().ok_or(SessionError::NotEditing)?;
        let converted = convert_text(get_at_path(draft, path), text).map_err(|reason| {
            tracing::warn!("编辑被拒绝 {}: {}", path, reason);
            SessionError::InvalidEdit {
                path: path.to_string(),
                reason,
            }
        })?;
        self.set_at_path(path, converted.clone())?;
        Ok(converted)
    }

    /// 按顺序应用一批写入，全部成功才生效
    pub fn apply_batch(&mut self, edits: Vec<(Path, Value)>) -> Result<(), SessionError> {
        let draft = self.draft.as_ref().ok_or(SessionError::NotEditing)?;
        let mut scratch = deep_clone(draft);
        for (path, value) in edits {
            value_tree::set_at_path(&mut scratch, &path, value).map_err(|e| {
                SessionError::InvalidEdit {
                    path: path.to_string(),
                    reason: e.to_string(),
                }
            })?;
        }
        self.draft = Some(scratch);
        Ok(())
    }

    /// 草稿与原始值是否不同
    pub fn has_pending_changes(&self) -> bool {
        self.draft.as_ref().is_some_and(|d| *d != self.original)
    }

    /// 提交：草稿整体替换原始值，回到查看状态，返回新的当前值
    pub fn commit(&mut self) -> Result<&Value, SessionError> {
        let draft = self.draft.take().ok_or(SessionError::NotEditing)?;
        let changed = draft != self.original;
        self.original = draft;
        tracing::info!("提交编辑，数据{}变化", if changed { "有" } else { "无" });
        Ok(&self.original)
    }

    /// 取消：丢弃草稿，当前值不变
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        self.draft.take().ok_or(SessionError::NotEditing)?;
        tracing::info!("取消编辑，草稿已丢弃");
        Ok(())
    }
}

/// 初始数据必须是非空对象，且嵌套深度在限制之内
pub fn validate_tree(value: &Value) -> Result<(), SessionError> {
    let Some(map) = value.as_object() else {
        return Err(SessionError::MalformedTree("根节点必须是对象".into()));
    };
    if map.is_empty() {
        return Err(SessionError::MalformedTree("根对象为空".into()));
    }
    let depth = nesting_depth(value);
    if depth > MAX_NESTING_DEPTH {
        return Err(SessionError::MalformedTree(format!(
            "嵌套深度 {} 超过上限 {}",
            depth, MAX_NESTING_DEPTH
        )));
    }
    Ok(())
}

/// 按目标位置当前值的类型把文本转换为 JSON 值
///
/// - 数字：必须能解析为整数或浮点数
/// - 布尔：true/false（不区分大小写）
/// - 数组：按逗号拆分并去除首尾空白，元素类型跟随首个非 null 元素；
///   含对象或嵌套数组的数组拒绝整体编辑。空项若对应原位置的 null 或空串则原样保留，否则丢弃
/// - 对象：拒绝，需逐个字段编辑
/// - 字符串、null 或缺失：按字符串保存
pub fn convert_text(current: Option<&Value>, text: &str) -> Result<Value, String> {
    match current {
        Some(Value::Object(_)) => Err("对象不能整体编辑，请逐个字段修改".into()),
        Some(Value::Array(items)) if items.iter().any(|v| v.is_object() || v.is_array()) => {
            Err("数组包含对象或数组，不能作为文本整体编辑".into())
        }
        Some(Value::Array(items)) => {
            let template = items.iter().find(|v| !v.is_null());
            let mut out = Vec::new();
            for (pos, item) in text.split(',').map(str::trim).enumerate() {
                if item.is_empty() {
                    match items.get(pos) {
                        Some(blank @ Value::Null) => out.push(blank.clone()),
                        Some(Value::String(s)) if s.is_empty() => out.push(Value::String(String::new())),
                        _ => {}
                    }
                    continue;
                }
                out.push(convert_scalar(template, item)?);
            }
            Ok(Value::Array(out))
        }
        other => convert_scalar(other, text),
    }
}

fn convert_scalar(template: Option<&Value>, text: &str) -> Result<Value, String> {
    match template {
        Some(Value::Number(_)) => parse_number(text.trim())
            .map(Value::Number)
            .ok_or_else(|| format!("'{}' 不是有效数字", text)),
        Some(Value::Bool(_)) => {
            let trimmed = text.trim();
            if trimmed.eq_ignore_ascii_case("true") {
                Ok(Value::Bool(true))
            } else if trimmed.eq_ignore_ascii_case("false") {
                Ok(Value::Bool(false))
            } else {
                Err(format!("'{}' 不是有效布尔值", text))
            }
        }
        _ => Ok(Value::String(text.to_string())),
    }
}

fn parse_number(text: &str) -> Option<Number> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(Number::from(i));
    }
    if let Ok(u) = text.parse::<u64>() {
        return Some(Number::from(u));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}
