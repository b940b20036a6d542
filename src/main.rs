//! 程序入口：解析命令行、初始化日志，把各子命令交给库中的 AppState

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::fmt::SubscriberBuilder;

use json_review::model::performance::run_performance_suite;
use json_review::model::sections::SectionShape;
use json_review::model::value_tree::get_at_path;
use json_review::utils::submit::{ClipboardTarget, FileTarget, SubmitTarget, WriterTarget};
use json_review::vm::bridge::*;
use json_review::{AppState, ReviewConfig};

/// 审阅和编辑无固定结构的JSON文档
#[derive(Parser, Debug)]
#[command(name = "json_review")]
#[command(about = "Review and edit schema-less JSON documents", long_about = None)]
struct Cli {
    /// TOML 配置文件
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 显示标题信息、分区列表以及某个分区的内容
    Show {
        file: PathBuf,
        /// 分区名，默认为总览
        #[arg(long)]
        section: Option<String>,
    },
    /// 按 JSONPath 输出第一个匹配节点
    Query {
        file: PathBuf,
        #[arg(value_name = "JSONPATH")]
        json_path: String,
    },
    /// 以文本编辑若干位置，保存后提交
    Edit {
        file: PathBuf,
        /// PATH=VALUE，PATH 可以是点分路径或 JSONPath
        #[arg(long = "set", value_name = "PATH=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
        /// 提交到文件（默认输出到标准输出）
        #[arg(long, value_name = "FILE", conflicts_with = "clipboard")]
        output: Option<PathBuf>,
        /// 提交到系统剪贴板
        #[arg(long)]
        clipboard: bool,
        /// 任意一处编辑被拒绝时放弃全部修改
        #[arg(long)]
        strict: bool,
    },
    /// 运行性能基准测试
    Bench,
}

/// 在第一个 `=` 处拆分
fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (path, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("缺少 '=': {}", raw))?;
    if path.trim().is_empty() {
        return Err(format!("路径为空: {}", raw));
    }
    Ok((path.trim().to_string(), value.to_string()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ReviewConfig::load(path)
            .with_context(|| format!("无法加载配置文件 {}", path.display()))?,
        None => ReviewConfig::default(),
    };

    // 日志写到 stderr，stdout 留给数据输出
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        config.tracing_level()
    };
    let _ = SubscriberBuilder::default()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();

    let mut app = AppState::with_config(config);
    match cli.command {
        Command::Show { file, section } => {
            load(&mut app, &file)?;
            show(&mut app, section.as_deref())
        }
        Command::Query { file, json_path } => {
            load(&mut app, &file)?;
            let text = app
                .extract_subtree_pretty(&json_path)
                .with_context(|| format!("查询失败: {}", json_path))?;
            println!("{}", text);
            Ok(())
        }
        Command::Edit {
            file,
            set,
            output,
            clipboard,
            strict,
        } => {
            load(&mut app, &file)?;
            let mut target: Box<dyn SubmitTarget> = if clipboard {
                Box::new(ClipboardTarget)
            } else if let Some(path) = output {
                Box::new(FileTarget::new(path))
            } else {
                Box::new(WriterTarget::new(std::io::stdout()))
            };
            edit(&mut app, &set, strict, &mut *target)
        }
        Command::Bench => {
            bench();
            Ok(())
        }
    }
}

fn load(app: &mut AppState, file: &Path) -> Result<()> {
    app.load_file(file)
        .with_context(|| format!("无法加载 {}", file.display()))?;
    eprintln!("{}: {}", STATUS_LOADED, file.display());
    Ok(())
}

fn show(app: &mut AppState, section: Option<&str>) -> Result<()> {
    if let Some(name) = section {
        app.select_section(name)?;
    }
    let view = app.view()?;
    println!("{}", feature_name(view));
    println!("Base URL: {}", base_url(view));

    let active = app.active_section()?;
    println!("\n{}\n", render_sections(&app.sections()?, &active.name));

    if let Some(table) = app.active_table()? {
        let rows = get_at_path(app.view()?, &table.path)
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default();
        print!("{}", render_table(&table, rows, &app.config.rules()));
        return Ok(());
    }

    if active.shape == SectionShape::ArrayOfScalars {
        println!("{} items", item_count(app.view()?, &active.name));
    }
    print!("{}", render_overview(&app.overview()?));

    if active.is_overview() {
        let files = file_structure(app.view()?, &app.config.rules());
        if !files.is_empty() {
            println!("\nFile structure:");
            print!("{}", render_file_structure(&files));
        }
    }
    Ok(())
}

fn edit(
    app: &mut AppState,
    assignments: &[(String, String)],
    strict: bool,
    target: &mut dyn SubmitTarget,
) -> Result<()> {
    app.start_edit()?;
    eprintln!("{}", STATUS_EDITING);

    let mut rejected = 0;
    for (path, text) in assignments {
        match app.set_text_by_expr(path, text) {
            Ok(count) => tracing::info!("已更新 {} 处: {}", count, path),
            Err(e) => {
                rejected += 1;
                tracing::warn!("编辑被拒绝 {}: {}", path, e);
                eprintln!("{}{}", STATUS_ERROR_PREFIX, e);
            }
        }
    }

    if strict && rejected > 0 {
        app.cancel()?;
        eprintln!("{}", STATUS_CANCELLED);
        bail!("{} 处编辑被拒绝，已放弃全部修改", rejected);
    }

    app.commit()?;
    eprintln!("{}", STATUS_COMMITTED);

    let changed = app
        .submit(target)
        .with_context(|| format!("提交到{}失败", target.describe()))?;
    if changed {
        eprintln!("{}: {}", STATUS_SUBMITTED, target.describe());
    } else {
        eprintln!("{}: {}（{}）", STATUS_SUBMITTED, target.describe(), STATUS_NO_CHANGES);
    }
    Ok(())
}

fn bench() {
    let results = run_performance_suite();
    println!("{:<32} {:>10}  {:<6} 详情", "操作", "耗时(ms)", "结果");
    for r in &results {
        println!(
            "{:<32} {:>10}  {:<6} {}",
            r.operation,
            r.duration_ms,
            if r.success { "ok" } else { "FAIL" },
            r.details
        );
    }
}
