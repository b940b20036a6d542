//! 剪贴板：把提交的快照文本交给系统剪贴板

use copypasta::{ClipboardContext, ClipboardProvider};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("剪贴板不可用: {0}")]
    Unavailable(String),
    #[error("写入剪贴板失败: {0}")]
    Write(String),
    #[error("没有可复制的内容")]
    Empty,
}

fn open_clipboard() -> Result<ClipboardContext, ClipboardError> {
    ClipboardContext::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))
}

/// 将文本复制到系统剪贴板；空文本直接拒绝，不会清空剪贴板
pub fn copy_to_clipboard(text: &str) -> Result<(), ClipboardError> {
    if text.trim().is_empty() {
        return Err(ClipboardError::Empty);
    }
    let mut ctx = open_clipboard()?;
    ctx.set_contents(text.to_string())
        .map_err(|e| ClipboardError::Write(e.to_string()))?;
    tracing::debug!("已复制 {} 字节到剪贴板", text.len());
    Ok(())
}

#[cfg(test)]
fn get_clipboard_contents() -> Result<String, ClipboardError> {
    open_clipboard()?
        .get_contents()
        .map_err(|e| ClipboardError::Unavailable(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_rejected_before_touching_clipboard() {
        assert!(matches!(copy_to_clipboard(""), Err(ClipboardError::Empty)));
        assert!(matches!(copy_to_clipboard("  \n"), Err(ClipboardError::Empty)));
    }

    #[test]
    #[ignore = "需要图形会话中的系统剪贴板"]
    fn test_clipboard_round_trip_json() {
        let snapshot = "{\n  \"scenarios\": [\n    {\"statuscode\": 200}\n  ]\n}";

        copy_to_clipboard(snapshot).expect("复制到剪贴板应该成功");
        let clipboard_content = get_clipboard_contents().expect("从剪贴板读取应该成功");

        assert_eq!(clipboard_content, snapshot, "剪贴板内容应该与提交的快照一致");
    }
}
