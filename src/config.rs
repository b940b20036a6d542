//! 配置：可选的 TOML 文件，缺省字段取内置默认值
//!
//! ```toml
//! summarize_threshold = 10
//! table_inline_array_max = 3
//! pinned_sections = ["scenarios", "background", "file_save_location"]
//! log_level = "debug"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::model::classifier::{
    HeuristicRules, DEFAULT_FILE_EXTENSIONS, DEFAULT_HTTP_METHODS, DEFAULT_SUMMARIZE_THRESHOLD,
};
use crate::model::data_core::AppError;
use crate::model::table::DEFAULT_INLINE_ARRAY_MAX;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// 超过此长度的数组在总览中只显示数量
    pub summarize_threshold: usize,
    /// 表格中可内联显示的短数组长度上限
    pub table_inline_array_max: usize,
    pub file_extensions: Vec<String>,
    pub http_methods: Vec<String>,
    /// 只要是容器就单独成区的顶层键
    pub pinned_sections: Vec<String>,
    pub log_level: String,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            summarize_threshold: DEFAULT_SUMMARIZE_THRESHOLD,
            table_inline_array_max: DEFAULT_INLINE_ARRAY_MAX,
            file_extensions: DEFAULT_FILE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            http_methods: DEFAULT_HTTP_METHODS.iter().map(|m| m.to_string()).collect(),
            pinned_sections: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

impl ReviewConfig {
    /// 从TOML文件加载配置
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("配置已加载: {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, AppError> {
        let config: Self = toml::from_str(text).map_err(|e| AppError::Config(e.to_string()))?;
        if config.log_level.parse::<tracing::Level>().is_err() {
            return Err(AppError::Config(format!("未知的日志级别: {}", config.log_level)));
        }
        Ok(config)
    }

    pub fn rules(&self) -> HeuristicRules {
        HeuristicRules {
            summarize_threshold: self.summarize_threshold,
            http_methods: self.http_methods.clone(),
            file_extensions: self.file_extensions.clone(),
        }
    }

    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_builtin_rules() {
        let config = ReviewConfig::default();
        assert_eq!(config.rules(), HeuristicRules::default());
        assert_eq!(config.table_inline_array_max, 3);
        assert!(config.pinned_sections.is_empty());
        assert_eq!(config.tracing_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ReviewConfig::from_toml_str(
            r#"
            summarize_threshold = 4
            pinned_sections = ["scenarios", "file_save_location"]
            log_level = "debug"
            "#,
        )
        .expect("解析配置失败");

        assert_eq!(config.summarize_threshold, 4);
        assert_eq!(config.pinned_sections, ["scenarios", "file_save_location"]);
        assert_eq!(config.table_inline_array_max, 3, "未配置的字段取默认值");
        assert_eq!(config.http_methods.len(), 7);
        assert_eq!(config.tracing_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(matches!(
            ReviewConfig::from_toml_str("summarize_threshold = \"ten\""),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            ReviewConfig::from_toml_str("log_level = \"loud\""),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().expect("创建临时文件失败");
        file.write_all(b"table_inline_array_max = 5\n").expect("写入临时文件失败");

        let config = ReviewConfig::load(file.path()).expect("加载配置失败");
        assert_eq!(config.table_inline_array_max, 5);
    }
}
