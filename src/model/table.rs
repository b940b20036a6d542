//! 表格派生：从对象数组推断稳定的列集合与每列的展示类型
//!
//! 列按首次出现的位置排序；每列的代表值取第一个定义该键的行，
//! 列类型由代表值一次确定并用于整列，各行实际值不再单独分类。

use serde_json::Value;

use crate::model::classifier::{HeuristicRules, Kind};
use crate::model::value_tree::Path;

/// 内联显示的短数组长度上限
pub const DEFAULT_INLINE_ARRAY_MAX: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub key: String,
    pub kind: Kind,
}

/// 一个对象数组的表格视图（只含结构，不持有数据）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    /// 数组在树中的路径，用于生成单元格的编辑路径
    pub path: Path,
    pub columns: Vec<ColumnSpec>,
    /// 因代表值过于复杂而未进入表格的列，需在总览中展示
    pub dropped: Vec<String>,
    pub row_count: usize,
}

impl TableView {
    /// 单元格的值；行不是对象或缺少该键时为 None（渲染为空，而非 0 或 null）
    pub fn cell<'a>(&self, rows: &'a [Value], row: usize, col: usize) -> Option<&'a Value> {
        let key = &self.columns.get(col)?.key;
        rows.get(row)?.as_object()?.get(key)
    }

    /// 单元格的编辑路径：数组路径 + 行号 + 列键
    pub fn cell_path(&self, row: usize, col: usize) -> Option<Path> {
        let column = self.columns.get(col)?;
        Some(self.path.child(row).child(column.key.as_str()))
    }

    pub fn column_index(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.key == key)
    }
}

/// 使用内置规则派生列
pub fn derive_columns(rows: &[Value]) -> (Vec<ColumnSpec>, Vec<String>) {
    derive_columns_with(rows, &HeuristicRules::default(), DEFAULT_INLINE_ARRAY_MAX)
}

/// 派生列集合，返回 (保留列, 被丢弃的列键)
pub fn derive_columns_with(
    rows: &[Value],
    rules: &HeuristicRules,
    inline_array_max: usize,
) -> (Vec<ColumnSpec>, Vec<String>) {
    // 键按首次出现顺序排列，代表值来自第一个定义它的行
    let mut representatives: Vec<(&str, &Value)> = Vec::new();
    for row in rows {
        let Some(map) = row.as_object() else {
            continue;
        };
        for (key, value) in map {
            if !representatives.iter().any(|(k, _)| *k == key.as_str()) {
                representatives.push((key.as_str(), value));
            }
        }
    }

    let mut columns = Vec::new();
    let mut dropped = Vec::new();
    for (key, value) in representatives {
        if is_tabular(value, inline_array_max) {
            columns.push(ColumnSpec {
                key: key.to_string(),
                kind: rules.classify(key, value),
            });
        } else {
            dropped.push(key.to_string());
        }
    }
    (columns, dropped)
}

/// 代表值是标量，或不超过上限且只含标量的短数组
fn is_tabular(value: &Value, inline_array_max: usize) -> bool {
    match value {
        Value::Object(_) => false,
        Value::Array(items) => items.len() <= inline_array_max && items.iter().all(is_scalar),
        _ => true,
    }
}

fn is_scalar(value: &Value) -> bool {
    !value.is_object() && !value.is_array()
}

/// 为 `path` 处的对象数组构建表格视图；不是数组时返回 None
pub fn derive_table(
    array: &Value,
    path: Path,
    rules: &HeuristicRules,
    inline_array_max: usize,
) -> Option<TableView> {
    let rows = array.as_array()?;
    let (columns, dropped) = derive_columns_with(rows, rules, inline_array_max);
    if !dropped.is_empty() {
        tracing::debug!("表格 {} 丢弃了 {} 个复杂列: {:?}", path, dropped.len(), dropped);
    }
    Some(TableView {
        path,
        columns,
        dropped,
        row_count: rows.len(),
    })
}
