//! 影子树（Shadow Tree）：把树展平成总览用的属性卡片列表
//!
//! 只存结构、路径与轻量预览，不复制大值。对象（Group）向下展开，
//! 长数组只显示数量，其余条目作为叶子。

use serde_json::Value;

use crate::model::classifier::{HeuristicRules, Kind};
use crate::model::value_tree::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct OverviewNode {
    /// 节点在父对象中的键名
    pub name: String,
    /// 精确寻址用的路径（可直接用于编辑）
    pub path: Path,
    pub kind: Kind,
    /// 子元素数量（对象字段数 / 数组长度）
    pub children: usize,
    /// 轻量预览（字符串截断、数字/布尔/空的简短描述）
    pub preview: String,
    /// 节点深度（用于缩进显示），顶层为 0
    pub depth: usize,
}

/// 从 `root` 处构建总览；`base` 为 `root` 在整棵树中的路径
///
/// `root` 为对象时逐个字段展开；为数组（表格分区）时逐行展开，
/// 这样被表格丢弃的复杂列仍能在这里看到和编辑。
pub fn build_overview(root: &Value, base: &Path, rules: &HeuristicRules) -> Vec<OverviewNode> {
    let mut out = Vec::with_capacity(64);
    match root {
        Value::Object(map) => {
            for (key, child) in map {
                walk(&mut out, child, base.child(key.as_str()), key, 0, rules);
            }
        }
        Value::Array(rows) => {
            for (idx, row) in rows.iter().enumerate() {
                walk(&mut out, row, base.child(idx), &idx.to_string(), 0, rules);
            }
        }
        _ => {}
    }
    out
}

fn walk(
    out: &mut Vec<OverviewNode>,
    value: &Value,
    path: Path,
    name: &str,
    depth: usize,
    rules: &HeuristicRules,
) {
    let kind = rules.classify(name, value);
    let children = match value {
        Value::Object(m) => m.len(),
        Value::Array(a) => a.len(),
        _ => 0,
    };
    out.push(OverviewNode {
        name: name.to_string(),
        path: path.clone(),
        kind,
        children,
        preview: preview_of(value, kind),
        depth,
    });

    if let (Kind::Group, Value::Object(map)) = (kind, value) {
        for (key, child) in map {
            walk(out, child, path.child(key.as_str()), key, depth + 1, rules);
        }
    }
}

/// 节点预览文本
pub fn preview_of(value: &Value, kind: Kind) -> String {
    match (kind, value) {
        (Kind::SummarizedCollection, Value::Array(a)) => format!("{} items", a.len()),
        (_, Value::String(s)) => {
            let s = s.trim();
            if s.chars().count() > 32 {
                let truncated: String = s.chars().take(32).collect();
                format!("\"{}...\"", truncated)
            } else {
                format!("\"{}\"", s)
            }
        }
        (_, Value::Number(n)) => n.to_string(),
        (_, Value::Bool(b)) => b.to_string(),
        (_, Value::Null) => "N/A".to_string(),
        (_, Value::Object(m)) => format!("{{..}} ({} keys)", m.len()),
        (_, Value::Array(a)) if a.is_empty() => "Empty array".to_string(),
        (_, Value::Array(a)) => {
            let tags: Vec<String> = a.iter().map(tag_of).collect();
            format!("[{}]", tags.join(", "))
        }
    }
}

fn tag_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "N/A".to_string(),
        Value::Array(a) => format!("[{} items]", a.len()),
        Value::Object(_) => "{...}".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::classifier::StatusClass;
    use serde_json::json;

    fn rules() -> HeuristicRules {
        HeuristicRules::default()
    }

    #[test]
    fn test_simple_object_overview() {
        let json = json!({
            "name": "测试",
            "age": 30
        });

        let nodes = build_overview(&json, &Path::root(), &rules());

        // 应该有2个节点：name、age（根不作为卡片）
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].name, "name");
        assert_eq!(nodes[0].path.to_string(), "$.name");
        assert_eq!(nodes[1].name, "age");
        assert_eq!(nodes[1].depth, 0);
    }

    #[test]
    fn test_groups_recurse() {
        let json = json!({
            "user": {
                "profile": {
                    "name": "张三"
                }
            }
        });

        let nodes = build_overview(&json, &Path::root(), &rules());

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].kind, Kind::Group);
        assert_eq!(nodes[1].path.to_string(), "$.user.profile");
        assert_eq!(nodes[2].path.to_string(), "$.user.profile.name");
        assert_eq!(nodes[2].depth, 2);
    }

    #[test]
    fn test_long_arrays_are_summarized_not_enumerated() {
        let items: Vec<Value> = (0..25).map(|i| json!({"id": i})).collect();
        let json = json!({"items": items, "tags": ["a", "b"]});

        let nodes = build_overview(&json, &Path::root(), &rules());

        assert_eq!(nodes.len(), 2, "长数组不应展开其元素");
        assert_eq!(nodes[0].kind, Kind::SummarizedCollection);
        assert_eq!(nodes[0].preview, "25 items");
        assert_eq!(nodes[0].children, 25);
        assert_eq!(nodes[1].kind, Kind::PlainScalar);
        assert_eq!(nodes[1].preview, "[a, b]");
    }

    #[test]
    fn test_overview_of_section_uses_base_path() {
        let section = json!({"base_url": "https://example.com", "timeout": 503});
        let base = Path::parse("background").unwrap();

        let nodes = build_overview(&section, &base, &rules());

        assert_eq!(nodes[0].path, Path::parse("background.base_url").unwrap());
        assert_eq!(nodes[1].kind, Kind::HttpStatus(StatusClass::Error));
    }

    #[test]
    fn test_array_section_expands_rows() {
        let rows = json!([
            {"endPoint": "v1/", "headers": {"auth": "token"}},
            {"endPoint": "v2/"}
        ]);
        let base = Path::parse("scenarios").unwrap();

        let nodes = build_overview(&rows, &base, &rules());

        let paths: Vec<String> = nodes.iter().map(|n| n.path.to_string()).collect();
        assert_eq!(
            paths,
            [
                "$.scenarios[0]",
                "$.scenarios[0].endPoint",
                "$.scenarios[0].headers",
                "$.scenarios[0].headers.auth",
                "$.scenarios[1]",
                "$.scenarios[1].endPoint",
            ]
        );
        assert_eq!(nodes[0].name, "0");
        assert_eq!(nodes[0].kind, Kind::Group);
    }

    #[test]
    fn test_special_characters_in_keys() {
        let json = json!({
            "normal_key": "value1",
            "key with spaces": "value2",
            "key'with'quotes": "value5"
        });

        let nodes = build_overview(&json, &Path::root(), &rules());

        let paths: Vec<String> = nodes.iter().map(|n| n.path.to_string()).collect();
        assert!(paths.contains(&"$.normal_key".to_string()));
        assert!(paths.contains(&"$['key with spaces']".to_string()));
        assert!(paths.contains(&"$['key\\'with\\'quotes']".to_string()));
    }

    #[test]
    fn test_node_preview_generation() {
        let json = json!({
            "short_string": "短文本",
            "long_string": "这是一个非常长的字符串，应该被截断以便在预览中显示，不应该显示完整内容",
            "number": 42,
            "boolean": true,
            "null_value": null,
            "empty": [],
            "array": [1, null, [2], {"k": 1}]
        });

        let nodes = build_overview(&json, &Path::root(), &rules());

        for node in &nodes {
            match node.name.as_str() {
                "short_string" => assert_eq!(node.preview, "\"短文本\""),
                "long_string" => assert!(node.preview.contains("...")),
                "number" => assert_eq!(node.preview, "42"),
                "boolean" => assert_eq!(node.preview, "true"),
                "null_value" => assert_eq!(node.preview, "N/A"),
                "empty" => assert_eq!(node.preview, "Empty array"),
                "array" => assert_eq!(node.preview, "[1, N/A, [1 items], {...}]"),
                _ => {}
            }
        }
    }
}
