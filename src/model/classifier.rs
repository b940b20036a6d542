//! 启发式分类：按 (键, 值) 判定叶子值的展示/编辑类型
//!
//! 规则按固定优先级依次匹配，只依赖 (键, 值) 本身，与兄弟节点无关，可按值缓存。

use std::sync::OnceLock;

use serde_json::{Number, Value};

/// 超过此长度的数组只显示数量
pub const DEFAULT_SUMMARIZE_THRESHOLD: usize = 10;

pub const DEFAULT_HTTP_METHODS: [&str; 7] =
    ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

pub const DEFAULT_FILE_EXTENSIONS: [&str; 5] = [".txt", ".json", ".feature", ".js", ".ts"];

pub const PATH_SEPARATORS: [char; 2] = ['/', '\\'];

/// HTTP 状态码分档：[200, 400) 为成功，其余为错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    Success,
    Error,
}

/// 展示/编辑类型（派生值，不存储）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    PlainScalar,
    FilePath,
    HttpMethod,
    HttpStatus(StatusClass),
    Flag,
    Group,
    SummarizedCollection,
}

impl Kind {
    /// 需要下钻而不是作为叶子渲染
    pub fn is_group(&self) -> bool {
        matches!(self, Kind::Group)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Kind::PlainScalar => "scalar",
            Kind::FilePath => "file",
            Kind::HttpMethod => "method",
            Kind::HttpStatus(StatusClass::Success) => "status-success",
            Kind::HttpStatus(StatusClass::Error) => "status-error",
            Kind::Flag => "flag",
            Kind::Group => "group",
            Kind::SummarizedCollection => "summary",
        }
    }
}

/// 分类规则的可调参数，默认值即内置规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeuristicRules {
    pub summarize_threshold: usize,
    pub http_methods: Vec<String>,
    pub file_extensions: Vec<String>,
}

impl Default for HeuristicRules {
    fn default() -> Self {
        Self {
            summarize_threshold: DEFAULT_SUMMARIZE_THRESHOLD,
            http_methods: DEFAULT_HTTP_METHODS.iter().map(|m| m.to_string()).collect(),
            file_extensions: DEFAULT_FILE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl HeuristicRules {
    /// 按优先级分类：长数组 → 对象 → 文件路径 → HTTP 方法 → 状态码 → 布尔 → 普通标量
    pub fn classify(&self, _key: &str, value: &Value) -> Kind {
        match value {
            Value::Array(items) if items.len() > self.summarize_threshold => {
                Kind::SummarizedCollection
            }
            Value::Object(_) => Kind::Group,
            Value::String(s) if self.is_file_path(s) => Kind::FilePath,
            Value::String(s) if self.is_http_method(s) => Kind::HttpMethod,
            Value::Number(n) => status_class(n).map_or(Kind::PlainScalar, Kind::HttpStatus),
            Value::Bool(_) => Kind::Flag,
            _ => Kind::PlainScalar,
        }
    }

    pub fn is_file_path(&self, s: &str) -> bool {
        s.contains(PATH_SEPARATORS) || self.file_extensions.iter().any(|ext| s.ends_with(ext.as_str()))
    }

    pub fn is_http_method(&self, s: &str) -> bool {
        self.http_methods.iter().any(|m| m.eq_ignore_ascii_case(s))
    }
}

/// 使用内置规则分类
pub fn classify(key: &str, value: &Value) -> Kind {
    static RULES: OnceLock<HeuristicRules> = OnceLock::new();
    RULES.get_or_init(HeuristicRules::default).classify(key, value)
}

/// 整数值且位于 [100, 599] 时视为 HTTP 状态码
pub fn status_class(n: &Number) -> Option<StatusClass> {
    let code = match n.as_u64() {
        Some(code) => code,
        None => {
            let f = n.as_f64()?;
            if f < 0.0 || f.fract() != 0.0 {
                return None;
            }
            f as u64
        }
    };
    if !(100..=599).contains(&code) {
        return None;
    }
    Some(if (200..400).contains(&code) {
        StatusClass::Success
    } else {
        StatusClass::Error
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_http_method_case_insensitive() {
        assert_eq!(classify("method", &json!("post")), Kind::HttpMethod);
        assert_eq!(classify("method", &json!("OPTIONS")), Kind::HttpMethod);
        assert_eq!(classify("method", &json!("FETCH")), Kind::PlainScalar);
        assert_eq!(classify("method", &json!(" GET")), Kind::PlainScalar, "不做首尾空白裁剪");
    }

    #[test]
    fn test_http_status_classes() {
        assert_eq!(classify("statuscode", &json!(404)), Kind::HttpStatus(StatusClass::Error));
        assert_eq!(classify("statuscode", &json!(201)), Kind::HttpStatus(StatusClass::Success));
        assert_eq!(classify("statuscode", &json!(399)), Kind::HttpStatus(StatusClass::Success));
        assert_eq!(classify("statuscode", &json!(400)), Kind::HttpStatus(StatusClass::Error));
        assert_eq!(classify("statuscode", &json!(100)), Kind::HttpStatus(StatusClass::Error));
        assert_eq!(classify("statuscode", &json!(599)), Kind::HttpStatus(StatusClass::Error));
        assert_eq!(classify("statuscode", &json!(200.0)), Kind::HttpStatus(StatusClass::Success));

        assert_eq!(classify("n", &json!(99)), Kind::PlainScalar);
        assert_eq!(classify("n", &json!(600)), Kind::PlainScalar);
        assert_eq!(classify("n", &json!(404.5)), Kind::PlainScalar, "非整数不视为状态码");
        assert_eq!(classify("n", &json!(-404)), Kind::PlainScalar);
    }

    #[test]
    fn test_file_path_detection() {
        assert_eq!(classify("f", &json!("src/test/resources/a.feature")), Kind::FilePath);
        assert_eq!(classify("f", &json!("C:\\data\\x")), Kind::FilePath);
        assert_eq!(classify("f", &json!("login.feature")), Kind::FilePath);
        assert_eq!(classify("f", &json!("report.json")), Kind::FilePath);
        assert_eq!(classify("f", &json!("v1/")), Kind::FilePath);
        assert_eq!(classify("f", &json!("plain words")), Kind::PlainScalar);
    }

    #[test]
    fn test_priority_order() {
        let long: Vec<Value> = (0..11).map(|i| json!({"id": i})).collect();
        assert_eq!(classify("items", &Value::Array(long)), Kind::SummarizedCollection);

        let ten: Vec<Value> = (0..10).map(|i| json!(i)).collect();
        assert_eq!(classify("items", &Value::Array(ten)), Kind::PlainScalar, "10 个元素不折叠");

        assert_eq!(classify("obj", &json!({})), Kind::Group);
        assert_eq!(classify("m", &json!("GET/users")), Kind::FilePath, "路径规则优先于方法规则");
        assert_eq!(classify("flag", &json!(true)), Kind::Flag);
        assert_eq!(classify("none", &Value::Null), Kind::PlainScalar);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let value = json!("DELETE");
        let first = classify("method", &value);
        for _ in 0..5 {
            assert_eq!(classify("method", &value), first);
        }
    }

    #[test]
    fn test_custom_rules() {
        let rules = HeuristicRules {
            summarize_threshold: 2,
            http_methods: vec!["PURGE".into()],
            file_extensions: vec![".yaml".into()],
        };
        assert_eq!(rules.classify("a", &json!([1, 2, 3])), Kind::SummarizedCollection);
        assert_eq!(rules.classify("a", &json!("purge")), Kind::HttpMethod);
        assert_eq!(rules.classify("a", &json!("GET")), Kind::PlainScalar);
        assert_eq!(rules.classify("a", &json!("conf.yaml")), Kind::FilePath);
    }
}
