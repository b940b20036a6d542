//! 提交目标：提交后的快照交给外部协作方（文件、任意输出流、剪贴板）
//!
//! 目标只会拿到只读快照，拿不到会话内部的可变引用。

use std::io::Write;
use std::path::PathBuf;

use serde_json::Value;

use crate::model::data_core::AppError;
use crate::utils::clipboard::copy_to_clipboard;
use crate::utils::fs::write_json_file;

pub trait SubmitTarget {
    /// 用于日志的目标描述
    fn describe(&self) -> String;

    fn submit(&mut self, snapshot: &Value) -> Result<(), AppError>;
}

/// 写入 JSON 文件（格式化输出）
#[derive(Debug, Clone)]
pub struct FileTarget {
    path: PathBuf,
}

impl FileTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SubmitTarget for FileTarget {
    fn describe(&self) -> String {
        format!("文件 {}", self.path.display())
    }

    fn submit(&mut self, snapshot: &Value) -> Result<(), AppError> {
        write_json_file(&self.path, snapshot)
    }
}

/// 写入任意输出流，例如标准输出
pub struct WriterTarget<W: Write> {
    writer: W,
}

impl<W: Write> WriterTarget<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> SubmitTarget for WriterTarget<W> {
    fn describe(&self) -> String {
        "输出流".to_string()
    }

    fn submit(&mut self, snapshot: &Value) -> Result<(), AppError> {
        serde_json::to_writer_pretty(&mut self.writer, snapshot)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// 复制到系统剪贴板
#[derive(Debug, Default, Clone, Copy)]
pub struct ClipboardTarget;

impl SubmitTarget for ClipboardTarget {
    fn describe(&self) -> String {
        "剪贴板".to_string()
    }

    fn submit(&mut self, snapshot: &Value) -> Result<(), AppError> {
        let text = serde_json::to_string_pretty(snapshot)?;
        copy_to_clipboard(&text)?;
        Ok(())
    }
}
