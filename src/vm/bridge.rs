//! VM桥接层：把模型层的分区/总览/表格转换成可显示的纯文本
//!
//! 这里只做展示，不修改数据；所有读取都走调用方给出的当前视图。

use serde_json::Value;

use crate::model::classifier::{status_class, HeuristicRules, Kind, StatusClass, PATH_SEPARATORS};
use crate::model::sections::{SectionShape, SectionSpec};
use crate::model::shadow_tree::OverviewNode;
use crate::model::table::TableView;

// === 常量定义（消除魔法值） ===
pub const STATUS_LOADED: &str = "文件加载完成";
pub const STATUS_EDITING: &str = "编辑中";
pub const STATUS_COMMITTED: &str = "修改已保存";
pub const STATUS_CANCELLED: &str = "修改已取消";
pub const STATUS_SUBMITTED: &str = "已提交";
pub const STATUS_NO_CHANGES: &str = "数据无变化";
pub const STATUS_ERROR_PREFIX: &str = "错误: ";

/// 找不到任何候选字段时的标题
pub const DEFAULT_FEATURE_NAME: &str = "Test Feature";
pub const NOT_AVAILABLE: &str = "N/A";

const FEATURE_NAME_KEYS: [&str; 4] = ["file_name", "name", "title", "feature"];
const BASE_URL_KEYS: [&str; 4] = ["base_url", "baseUrl", "url", "api_url"];

/// 键名的显示形式：首字母大写，下划线换成空格
pub fn display_label(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>().replace('_', " "),
        None => String::new(),
    }
}

/// 路径中最后一个分隔符之后的部分
pub fn extract_filename(path: &str) -> &str {
    match path.rfind(PATH_SEPARATORS) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// 值的一行描述（数组元素、标签等）
pub fn format_value_for_display(value: &Value) -> String {
    match value {
        Value::Null => NOT_AVAILABLE.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(a) => format!("[{} items]", a.len()),
        Value::Object(_) => "{...}".to_string(),
    }
}

/// 编辑状态下每个位置使用的编辑控件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorWidget {
    Text,
    Number,
    Checkbox,
    /// 逗号分隔的多值文本
    TagList,
    /// 对象不整体编辑，提示逐个编辑属性
    PropertiesNote,
}

pub fn editor_for(value: Option<&Value>) -> EditorWidget {
    match value {
        Some(Value::Array(_)) => EditorWidget::TagList,
        Some(Value::Object(_)) => EditorWidget::PropertiesNote,
        Some(Value::Bool(_)) => EditorWidget::Checkbox,
        Some(Value::Number(_)) => EditorWidget::Number,
        _ => EditorWidget::Text,
    }
}

/// 编辑控件的初始文本，可原样交回 `set_text_at_path`；null 显示为空而不是 "N/A"
pub fn editor_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) | Some(Value::Object(_)) => String::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => format_value_for_display(other),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => format_value_for_display(other),
    }
}

/// 单元格文本；缺失的单元格为空串，不显示 0 或 null
///
/// 列类型只决定这一列按什么方式显示，徽标（方法、成功/失败）按单元格自身的值判断。
pub fn render_cell(kind: Kind, value: Option<&Value>, rules: &HeuristicRules) -> String {
    let Some(value) = value else {
        return String::new();
    };
    match (kind, value) {
        (_, Value::Null) => NOT_AVAILABLE.to_string(),
        (Kind::FilePath, Value::String(s)) => format!("📄 {}", extract_filename(s)),
        (Kind::HttpMethod, Value::String(s)) if rules.is_http_method(s) => {
            format!("[{}]", s.to_uppercase())
        }
        (Kind::HttpStatus(_), Value::Number(n)) => match status_class(n) {
            Some(StatusClass::Success) => format!("{} ✓", n),
            Some(StatusClass::Error) => format!("{} ✗", n),
            None => n.to_string(),
        },
        (_, Value::Array(items)) if items.is_empty() => "Empty array".to_string(),
        (_, Value::Array(items)) => items
            .iter()
            .map(format_value_for_display)
            .collect::<Vec<_>>()
            .join(", "),
        (_, other) => format_value_for_display(other),
    }
}

/// 分区列表，当前分区前加 `*`
pub fn render_sections(sections: &[SectionSpec], active: &str) -> String {
    sections
        .iter()
        .map(|s| {
            let marker = if s.name == active { "*" } else { " " };
            let shape = match s.shape {
                SectionShape::Object => "object",
                SectionShape::ArrayOfObjects => "table",
                SectionShape::ArrayOfScalars => "list",
            };
            format!("{} {} ({})", marker, display_label(&s.name), shape)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 属性卡片：按深度缩进，对象只显示标题
pub fn render_overview(nodes: &[OverviewNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        let indent = "  ".repeat(node.depth);
        let label = display_label(&node.name);
        if node.kind.is_group() {
            out.push_str(&format!("{}{}:\n", indent, label));
        } else {
            out.push_str(&format!("{}{}: {}  <{}>\n", indent, label, node.preview, node.path));
        }
    }
    out
}

/// 表格：首行为列标题，按最宽内容对齐
pub fn render_table(table: &TableView, rows: &[Value], rules: &HeuristicRules) -> String {
    let mut grid: Vec<Vec<String>> = Vec::with_capacity(table.row_count + 1);
    let mut header = vec!["#".to_string()];
    header.extend(table.columns.iter().map(|c| display_label(&c.key)));
    grid.push(header);

    for row in 0..table.row_count {
        let mut line = vec![row.to_string()];
        for (col, column) in table.columns.iter().enumerate() {
            line.push(render_cell(column.kind, table.cell(rows, row, col), rules));
        }
        grid.push(line);
    }

    let widths: Vec<usize> = (0..=table.columns.len())
        .map(|col| grid.iter().map(|line| line[col].chars().count()).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    for line in &grid {
        let cells: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        out.push_str(cells.join(" | ").trim_end());
        out.push('\n');
    }
    if !table.dropped.is_empty() {
        out.push_str(&format!("(更多字段见总览: {})\n", table.dropped.join(", ")));
    }
    out
}

// === 标题信息 ===

/// 在顶层或下一层中按候选键查找第一个存在的值
fn find_field<'a>(root: &'a Value, names: &[&str]) -> Option<&'a Value> {
    let map = root.as_object()?;
    names.iter().find_map(|name| {
        map.get(*name)
            .or_else(|| map.values().find_map(|v| v.as_object()?.get(*name)))
    })
}

/// 功能名：常见名称字段的值，去掉 `.feature` 后缀
pub fn feature_name(root: &Value) -> String {
    match find_field(root, &FEATURE_NAME_KEYS) {
        Some(Value::String(s)) => s.strip_suffix(".feature").unwrap_or(s).to_string(),
        _ => DEFAULT_FEATURE_NAME.to_string(),
    }
}

/// 基础地址：先看 `background`，再看顶层
pub fn base_url(root: &Value) -> String {
    let background = root.get("background");
    BASE_URL_KEYS
        .iter()
        .find_map(|name| {
            background
                .and_then(|b| b.get(*name))
                .filter(|v| is_truthy(v))
                .or_else(|| root.get(*name).filter(|v| is_truthy(v)))
        })
        .map_or_else(|| NOT_AVAILABLE.to_string(), format_value_for_display)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        _ => true,
    }
}

/// 顶层某键的条目数：数组长度或对象字段数
pub fn item_count(root: &Value, key: &str) -> usize {
    match root.get(key) {
        Some(Value::Array(a)) => a.len(),
        Some(Value::Object(m)) => m.len(),
        _ => 0,
    }
}

/// 树中所有像文件路径的字符串，按所在目录分组（目录按首次出现排序）
pub fn file_structure(root: &Value, rules: &HeuristicRules) -> Vec<(String, Vec<String>)> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    let mut stack = vec![root];
    while let Some(value) = stack.pop() {
        match value {
            Value::String(s) if rules.is_file_path(s) => {
                let folder = s.rfind('/').map_or("", |idx| &s[..idx]);
                match groups.iter_mut().find(|(f, _)| f == folder) {
                    Some((_, files)) => files.push(s.clone()),
                    None => groups.push((folder.to_string(), vec![s.clone()])),
                }
            }
            // 逆序入栈，保持文档顺序出栈
            Value::Object(map) => stack.extend(map.values().rev()),
            Value::Array(items) => stack.extend(items.iter().rev()),
            _ => {}
        }
    }
    groups
}

/// 文件结构的文本形式
pub fn render_file_structure(groups: &[(String, Vec<String>)]) -> String {
    let mut out = String::new();
    for (folder, files) in groups {
        let name = if folder.is_empty() { "root" } else { extract_filename(folder) };
        out.push_str(&format!("📁 {}\n", name));
        for file in files {
            out.push_str(&format!("   📄 {}\n", extract_filename(file)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::edit_session::EditSession;
    use crate::model::sections::derive_sections;
    use crate::model::shadow_tree::build_overview;
    use crate::model::table::{derive_table, DEFAULT_INLINE_ARRAY_MAX};
    use crate::model::value_tree::{get_at_path, Path};
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "file_name": "features/login.feature",
            "background": {"base_url": "https://example.com", "headers": {"auth": "x"}},
            "scenarios": [
                {"name": "ok", "method": "get", "statuscode": 200, "body": "data/ok.json"},
                {"name": "missing", "method": "POST", "statuscode": 404},
            ],
            "file_save_location": {"report": "out/report.txt", "log": "out/run.log"}
        })
    }

    #[test]
    fn test_display_helpers() {
        assert_eq!(display_label("file_save_location"), "File save location");
        assert_eq!(display_label("scenarios"), "Scenarios");
        assert_eq!(display_label(""), "");

        assert_eq!(extract_filename("a/b/c.feature"), "c.feature");
        assert_eq!(extract_filename(r"dir\file.txt"), "file.txt");
        assert_eq!(extract_filename("plain"), "plain");

        assert_eq!(format_value_for_display(&json!(null)), "N/A");
        assert_eq!(format_value_for_display(&json!([1, 2])), "[2 items]");
        assert_eq!(format_value_for_display(&json!({"a": 1})), "{...}");
    }

    #[test]
    fn test_editor_selection() {
        assert_eq!(editor_for(Some(&json!(["a"]))), EditorWidget::TagList);
        assert_eq!(editor_for(Some(&json!({}))), EditorWidget::PropertiesNote);
        assert_eq!(editor_for(Some(&json!(false))), EditorWidget::Checkbox);
        assert_eq!(editor_for(Some(&json!(3))), EditorWidget::Number);
        assert_eq!(editor_for(None), EditorWidget::Text);

        assert_eq!(editor_text(Some(&json!(["a", "b"]))), "a, b");
        assert_eq!(editor_text(None), "");
    }

    #[test]
    fn test_render_cell_badges() {
        let rules = HeuristicRules::default();
        assert_eq!(render_cell(Kind::PlainScalar, None, &rules), "", "缺失单元格应为空");
        assert_eq!(render_cell(Kind::HttpMethod, Some(&json!("get")), &rules), "[GET]");
        assert_eq!(render_cell(Kind::FilePath, Some(&json!("a/b.json")), &rules), "📄 b.json");
        assert_eq!(
            render_cell(Kind::HttpStatus(StatusClass::Error), Some(&json!(404)), &rules),
            "404 ✗"
        );
        assert_eq!(render_cell(Kind::PlainScalar, Some(&json!([])), &rules), "Empty array");
        assert_eq!(render_cell(Kind::PlainScalar, Some(&json!(null)), &rules), "N/A");
    }

    #[test]
    fn test_badges_follow_each_cell_value() {
        let rules = HeuristicRules::default();
        let success = Kind::HttpStatus(StatusClass::Success);
        assert_eq!(render_cell(success, Some(&json!(404)), &rules), "404 ✗", "徽标按单元格自身的值判断");
        assert_eq!(render_cell(success, Some(&json!(99)), &rules), "99");
        assert_eq!(render_cell(success, Some(&json!("n/a")), &rules), "n/a");
        assert_eq!(
            render_cell(Kind::HttpMethod, Some(&json!("not-a-verb")), &rules),
            "not-a-verb",
            "不是 HTTP 方法的值不显示方法徽标"
        );
    }

    #[test]
    fn test_editor_text_writes_back_unchanged() {
        let original = json!({"tags": [null, "a", ""], "codes": [200, 404], "flags": [true]});
        let mut session = EditSession::new(original.clone()).unwrap();
        session.start_edit();

        for key in ["tags", "codes", "flags"] {
            let path = Path::root().child(key);
            let text = editor_text(get_at_path(session.view(), &path));
            session.set_text_at_path(&path, &text).unwrap();
        }
        assert_eq!(editor_text(Some(&original["tags"])), ", a, ");
        assert_eq!(session.view(), &original, "未修改的编辑文本写回后草稿应不变");
        assert!(!session.has_pending_changes());
    }

    #[test]
    fn test_render_table_with_missing_cells() {
        let root = sample();
        let rows = root["scenarios"].as_array().unwrap();
        let table = derive_table(
            &root["scenarios"],
            Path::parse("scenarios").unwrap(),
            &HeuristicRules::default(),
            DEFAULT_INLINE_ARRAY_MAX,
        )
        .unwrap();

        let text = render_table(&table, rows, &HeuristicRules::default());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("# | Name"));
        assert!(lines[1].contains("200 ✓"));
        assert!(lines[1].contains("📄 ok.json"));
        assert!(lines[2].contains("404 ✗"));
        assert!(!lines[2].contains("N/A"), "缺失的 body 不应显示为 N/A");
    }

    #[test]
    fn test_render_sections_and_overview() {
        let root = sample();
        let sections = derive_sections(&root);
        let text = render_sections(&sections, "scenarios");
        assert!(text.contains("* Scenarios (table)"));
        assert!(text.contains("  Overview (object)"));

        let nodes = build_overview(&root["background"], &Path::parse("background").unwrap(), &HeuristicRules::default());
        let text = render_overview(&nodes);
        assert!(text.contains("Base url: \"https://example.com\"  <$.background.base_url>"));
        assert!(text.contains("Headers:\n  Auth:"));
    }

    #[test]
    fn test_headline_helpers() {
        let root = sample();
        assert_eq!(feature_name(&root), "features/login");
        assert_eq!(base_url(&root), "https://example.com");
        assert_eq!(item_count(&root, "scenarios"), 2);
        assert_eq!(item_count(&root, "background"), 2);
        assert_eq!(item_count(&root, "file_name"), 0);

        let nested = json!({"meta": {"title": "Checkout.feature"}, "url": "http://x"});
        assert_eq!(feature_name(&nested), "Checkout", "应查找下一层");
        assert_eq!(base_url(&nested), "http://x");

        let empty = json!({"count": 1});
        assert_eq!(feature_name(&empty), DEFAULT_FEATURE_NAME);
        assert_eq!(base_url(&empty), NOT_AVAILABLE);
    }

    #[test]
    fn test_file_structure_groups_by_folder() {
        let groups = file_structure(&sample(), &HeuristicRules::default());
        let folders: Vec<&str> = groups.iter().map(|(f, _)| f.as_str()).collect();
        // 含 `/` 的地址同样被视为路径
        assert_eq!(folders, ["features", "https:/", "data", "out"]);
        assert_eq!(groups[3].1, ["out/report.txt", "out/run.log"]);

        let text = render_file_structure(&groups);
        assert!(text.starts_with("📁 features\n   📄 login.feature\n"));
    }
}
