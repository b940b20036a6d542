//! AppState：一次审阅会话的应用核心状态，分区导航、JSONPath读写与提交

use std::path::{Path as FsPath, PathBuf};

use jsonpath_rust::JsonPath; // 提供 query/query_only_path 扩展
use serde_json::Value;
use thiserror::Error;

use crate::config::ReviewConfig;
use crate::model::edit_session::{convert_text, EditSession, SessionError};
use crate::model::sections::{derive_sections_with, SectionShape, SectionSpec};
use crate::model::shadow_tree::{build_overview, OverviewNode};
use crate::model::table::{derive_table, TableView};
use crate::model::value_tree::{get_at_path, Path, TreeError};
use crate::utils::clipboard::ClipboardError;
use crate::utils::fs::{read_json_file, write_json_file};
use crate::utils::submit::SubmitTarget;

#[derive(Debug, Default)]
pub struct AppState {
    pub source_path: Option<PathBuf>,
    pub config: ReviewConfig,
    session: Option<EditSession>,
    /// 当前分区的路径（根路径即总览），分区列表变化后按路径重新定位
    active_section: Path,
    /// 最近一次提交给外部目标的快照，用于判断是否有未提交的修改
    submitted: Option<Value>,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("JSONPath错误: {0}")]
    JsonPath(String),
    #[error("状态错误: {0}")]
    State(String),
    #[error("{0}")]
    Session(#[from] SessionError),
    #[error("{0}")]
    Tree(#[from] TreeError),
    #[error("配置错误: {0}")]
    Config(String),
    #[error("剪贴板错误: {0}")]
    Clipboard(#[from] ClipboardError),
}

impl AppState {
    pub fn with_config(config: ReviewConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// 加载JSON文件并创建会话
    pub fn load_file(&mut self, p: &FsPath) -> Result<(), AppError> {
        let dom = read_json_file(p)?;
        self.load_value(dom)?;
        self.source_path = Some(p.to_path_buf());
        Ok(())
    }

    /// 以外部提供的数据创建会话；数据不合格时保留原有状态
    pub fn load_value(&mut self, value: Value) -> Result<(), AppError> {
        let session = EditSession::new(value)?;
        self.submitted = Some(session.snapshot());
        self.session = Some(session);
        self.active_section = Path::root();
        tracing::info!("数据加载完成，共 {} 个分区", self.sections()?.len());
        Ok(())
    }

    pub fn session(&self) -> Result<&EditSession, AppError> {
        self.session
            .as_ref()
            .ok_or_else(|| AppError::State("数据尚未加载".into()))
    }

    fn session_mut(&mut self) -> Result<&mut EditSession, AppError> {
        self.session
            .as_mut()
            .ok_or_else(|| AppError::State("数据尚未加载".into()))
    }

    /// 当前视图读取的树（编辑中为草稿）
    pub fn view(&self) -> Result<&Value, AppError> {
        Ok(self.session()?.view())
    }

    pub fn is_editing(&self) -> bool {
        self.session.as_ref().is_some_and(EditSession::is_editing)
    }

    // === 分区导航 ===

    pub fn sections(&self) -> Result<Vec<SectionSpec>, AppError> {
        Ok(derive_sections_with(self.view()?, &self.config.pinned_sections))
    }

    /// 按名称切换分区；"overview" 总是指合成的总览
    pub fn select_section(&mut self, name: &str) -> Result<SectionSpec, AppError> {
        let section = self
            .sections()?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| AppError::State(format!("未知分区: {}", name)))?;
        self.active_section = section.path.clone();
        tracing::debug!("切换到分区: {}", name);
        Ok(section)
    }

    /// 当前分区；编辑导致分区消失时回落到总览
    pub fn active_section(&self) -> Result<SectionSpec, AppError> {
        Ok(self
            .sections()?
            .into_iter()
            .find(|s| s.path == self.active_section)
            .unwrap_or_else(SectionSpec::overview))
    }

    /// 当前分区为对象数组时的表格视图
    pub fn active_table(&self) -> Result<Option<TableView>, AppError> {
        let section = self.active_section()?;
        if section.shape != SectionShape::ArrayOfObjects {
            return Ok(None);
        }
        let Some(array) = get_at_path(self.view()?, &section.path) else {
            return Ok(None);
        };
        Ok(derive_table(
            array,
            section.path,
            &self.config.rules(),
            self.config.table_inline_array_max,
        ))
    }

    /// 当前分区的属性卡片（总览为整棵树）
    pub fn overview(&self) -> Result<Vec<OverviewNode>, AppError> {
        let section = self.active_section()?;
        let root = get_at_path(self.view()?, &section.path).unwrap_or(&Value::Null);
        Ok(build_overview(root, &section.path, &self.config.rules()))
    }

    // === JSONPath ===

    /// 按 JSONPath 提取第一个匹配节点的 pretty 字符串
    pub fn extract_subtree_pretty(&self, json_path: &str) -> Result<String, AppError> {
        let dom = self.view()?;
        let hits: Vec<&Value> = dom
            .query(json_path)
            .map_err(|e| AppError::JsonPath(e.to_string()))?;
        let first = hits
            .into_iter()
            .next()
            .ok_or_else(|| AppError::JsonPath("未匹配到任何节点".into()))?;
        Ok(serde_json::to_string_pretty(first)?)
    }

    /// 把 JSONPath 查询解析为具体路径列表
    pub fn resolve_paths(&self, json_path: &str) -> Result<Vec<Path>, AppError> {
        let dom = self.view()?;
        let raw: Vec<String> = dom
            .query_only_path(json_path)
            .map_err(|e| AppError::JsonPath(e.to_string()))?;
        raw.iter()
            .map(|p| Path::parse(p).map_err(AppError::from))
            .collect()
    }

    // === 编辑生命周期 ===

    pub fn start_edit(&mut self) -> Result<(), AppError> {
        self.session_mut()?.start_edit();
        Ok(())
    }

    /// 直接写入一个 JSON 值（自动补全缺失容器）
    pub fn set_value(&mut self, path: &Path, value: Value) -> Result<(), AppError> {
        Ok(self.session_mut()?.set_at_path(path, value)?)
    }

    /// 以文本编辑单个路径，返回实际写入的值
    pub fn set_text(&mut self, path: &Path, text: &str) -> Result<Value, AppError> {
        Ok(self.session_mut()?.set_text_at_path(path, text)?)
    }

    /// 以文本编辑：`$` 开头按 JSONPath 查询（可命中多处），否则按点分路径
    ///
    /// JSONPath 未命中时若本身是合法的规范化路径，则按路径写入（允许新建字段）。
    /// 返回写入的位置数。
    pub fn set_text_by_expr(&mut self, expr: &str, text: &str) -> Result<usize, AppError> {
        let expr = expr.trim();
        if !expr.starts_with('$') {
            let path = Path::parse(expr)?;
            self.set_text(&path, text)?;
            return Ok(1);
        }

        let paths = self.resolve_paths(expr)?;
        if paths.is_empty() {
            let path = Path::parse(expr)
                .map_err(|_| AppError::JsonPath(format!("未匹配到可更新路径: {}", expr)))?;
            self.set_text(&path, text)?;
            return Ok(1);
        }
        self.set_text_by_paths(&paths, text)
    }

    /// 批量编辑：先全部转换，全部成功后一次性写入
    pub fn set_text_by_paths(&mut self, paths: &[Path], text: &str) -> Result<usize, AppError> {
        let session = self.session_mut()?;
        let draft = session.draft().ok_or(SessionError::NotEditing)?;

        let mut edits = Vec::with_capacity(paths.len());
        for path in paths {
            let value = convert_text(get_at_path(draft, path), text).map_err(|reason| {
                tracing::warn!("批量编辑被拒绝 {}: {}", path, reason);
                SessionError::InvalidEdit {
                    path: path.to_string(),
                    reason,
                }
            })?;
            edits.push((path.clone(), value));
        }
        let count = edits.len();
        session.apply_batch(edits)?;
        tracing::info!("批量编辑 {} 处", count);
        Ok(count)
    }

    pub fn commit(&mut self) -> Result<(), AppError> {
        self.session_mut()?.commit()?;
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), AppError> {
        self.session_mut()?.cancel()?;
        Ok(())
    }

    // === 保存与提交 ===

    /// 将当前已提交的数据保存到指定路径（不含未提交的草稿）
    pub fn save_to_file(&self, path: &FsPath) -> Result<(), AppError> {
        write_json_file(path, self.session()?.original())?;
        tracing::info!("JSON文件已保存到: {}", path.display());
        Ok(())
    }

    /// 将当前数据保存到原始文件路径
    pub fn save_to_original_file(&self) -> Result<(), AppError> {
        let original_path = self
            .source_path
            .as_ref()
            .ok_or_else(|| AppError::State("原始文件路径未设置".into()))?;
        self.save_to_file(original_path)
    }

    /// 自上次提交以来当前数据是否有变化
    pub fn has_unsubmitted_changes(&self) -> bool {
        match (&self.session, &self.submitted) {
            (Some(session), Some(submitted)) => session.original() != submitted,
            _ => false,
        }
    }

    /// 把已提交的数据交给外部目标；返回自上次提交以来是否有变化
    ///
    /// 编辑中不允许提交，避免草稿被误认为已确认的数据。
    pub fn submit(&mut self, target: &mut dyn SubmitTarget) -> Result<bool, AppError> {
        if self.is_editing() {
            return Err(AppError::State("仍在编辑中，请先保存或取消".into()));
        }
        let snapshot = self.session()?.snapshot();
        let changed = self.submitted.as_ref() != Some(&snapshot);
        target.submit(&snapshot)?;
        tracing::info!("已提交到{}，数据{}变化", target.describe(), if changed { "有" } else { "无" });
        self.submitted = Some(snapshot);
        Ok(changed)
    }
}
