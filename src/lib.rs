//! JSON审阅工具库
//!
//! 提供无模式JSON文档的分区导航、表格派生、总览卡片、
//! 草稿式编辑（开始/保存/取消）与提交功能

pub mod config;
pub mod model;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use config::ReviewConfig;
pub use model::classifier::{classify, Kind, StatusClass};
pub use model::data_core::{AppError, AppState};
pub use model::edit_session::{EditSession, SessionError, SessionState};
pub use model::sections::{derive_sections, SectionShape, SectionSpec};
pub use model::table::{derive_columns, ColumnSpec, TableView};
pub use model::value_tree::{get_at_path, set_at_path, Path, PathSegment, TreeError};
