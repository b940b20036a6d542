//! 性能基准测试模块
//!
//! 覆盖加载、分区/表格派生、总览构建与一次完整编辑周期的耗时

use std::time::Instant;

use serde_json::{json, Value};

use crate::model::classifier::HeuristicRules;
use crate::model::data_core::AppState;
use crate::model::edit_session::EditSession;
use crate::model::sections::{derive_sections, SectionShape};
use crate::model::shadow_tree::build_overview;
use crate::model::table::{derive_table, DEFAULT_INLINE_ARRAY_MAX};
use crate::model::value_tree::{deep_clone, get_at_path, Path};

/// 性能测试结果
#[derive(Debug)]
pub struct PerformanceResult {
    pub operation: String,
    pub duration_ms: u128,
    pub success: bool,
    pub details: String,
}

impl PerformanceResult {
    pub fn new(operation: &str, duration_ms: u128, success: bool, details: &str) -> Self {
        Self {
            operation: operation.to_string(),
            duration_ms,
            success,
            details: details.to_string(),
        }
    }
}

/// 生成审阅用的测试数据：`scenarios` 条场景，每条带 `steps` 个步骤
pub fn generate_review_payload(scenarios: usize, steps: usize) -> Value {
    const METHODS: [&str; 4] = ["GET", "POST", "PUT", "DELETE"];
    const CODES: [u16; 4] = [200, 201, 404, 500];

    let rows: Vec<Value> = (0..scenarios)
        .map(|i| {
            json!({
                "name": format!("场景_{}", i),
                "endPoint": format!("v1/resource/{}", i),
                "method": METHODS[i % METHODS.len()],
                "statuscode": CODES[i % CODES.len()],
                "enabled": i % 3 != 0,
                "tags": ["smoke", format!("t{}", i % 5)],
                "headers": {"Content-Type": "application/json", "X-Trace": i},
                "steps": (0..steps).map(|s| format!("步骤 {}", s)).collect::<Vec<_>>(),
            })
        })
        .collect();

    json!({
        "file_name": "generated.feature",
        "background": {
            "base_url": "https://example.com/api",
            "timeout": 30,
            "retries": {"max": 3, "backoff_ms": 250}
        },
        "scenarios": rows,
        "file_save_location": {
            "feature": "out/features/generated.feature",
            "report": "out/reports/generated.json"
        }
    })
}

fn timed<T>(f: impl FnOnce() -> T) -> (T, u128) {
    let start = Instant::now();
    let out = f();
    (out, start.elapsed().as_millis())
}

/// 测试深拷贝（进入编辑状态的主要开销）
pub fn benchmark_deep_clone(data: &Value) -> PerformanceResult {
    let (copy, ms) = timed(|| deep_clone(data));
    PerformanceResult::new("深拷贝", ms, copy == *data, "草稿与原值一致")
}

/// 测试分区与表格派生
pub fn benchmark_section_derivation(data: &Value) -> PerformanceResult {
    let rules = HeuristicRules::default();
    let ((sections, columns), ms) = timed(|| {
        let sections = derive_sections(data);
        let columns: usize = sections
            .iter()
            .filter(|s| s.shape == SectionShape::ArrayOfObjects)
            .filter_map(|s| {
                let array = get_at_path(data, &s.path)?;
                derive_table(array, s.path.clone(), &rules, DEFAULT_INLINE_ARRAY_MAX)
            })
            .map(|t| t.columns.len())
            .sum();
        (sections, columns)
    });
    PerformanceResult::new(
        "分区派生",
        ms,
        !sections.is_empty(),
        &format!("{} 个分区，表格共 {} 列", sections.len(), columns),
    )
}

/// 测试总览构建
pub fn benchmark_overview_build(data: &Value) -> PerformanceResult {
    let (nodes, ms) = timed(|| build_overview(data, &Path::root(), &HeuristicRules::default()));
    PerformanceResult::new(
        "总览构建",
        ms,
        !nodes.is_empty(),
        &format!("构建了 {} 个节点", nodes.len()),
    )
}

/// 测试一次完整编辑周期：开始编辑 → 修改每条场景的状态码 → 保存
pub fn benchmark_edit_cycle(data: &Value) -> PerformanceResult {
    let (result, ms) = timed(|| -> Result<usize, String> {
        let mut session = EditSession::new(deep_clone(data)).map_err(|e| e.to_string())?;
        session.start_edit();
        let count = data["scenarios"].as_array().map_or(0, Vec::len);
        for i in 0..count {
            let path = Path::root().child("scenarios").child(i).child("statuscode");
            session.set_text_at_path(&path, "200").map_err(|e| e.to_string())?;
        }
        session.commit().map_err(|e| e.to_string())?;
        Ok(count)
    });
    match result {
        Ok(count) => PerformanceResult::new("编辑周期", ms, true, &format!("修改了 {} 处", count)),
        Err(e) => PerformanceResult::new("编辑周期", ms, false, &format!("编辑失败: {}", e)),
    }
}

/// 测试JSON解析性能
pub fn benchmark_json_parsing(json_str: &str) -> PerformanceResult {
    let (parse_result, ms) = timed(|| serde_json::from_str::<Value>(json_str));
    match parse_result {
        Ok(_) => PerformanceResult::new(
            "JSON解析",
            ms,
            true,
            &format!("解析了 {} 字节的JSON", json_str.len()),
        ),
        Err(e) => PerformanceResult::new("JSON解析", ms, false, &format!("解析失败: {}", e)),
    }
}

/// 测试节点提取性能
pub fn benchmark_node_extraction(app_state: &AppState, paths: &[&str]) -> Vec<PerformanceResult> {
    paths
        .iter()
        .map(|path| {
            let (extract_result, ms) = timed(|| app_state.extract_subtree_pretty(path));
            let operation = format!("节点提取: {}", path);
            match extract_result {
                Ok(json_str) => PerformanceResult::new(
                    &operation,
                    ms,
                    true,
                    &format!("提取了 {} 字符", json_str.len()),
                ),
                Err(e) => PerformanceResult::new(&operation, ms, false, &format!("提取失败: {}", e)),
            }
        })
        .collect()
}

/// 运行综合性能测试
pub fn run_performance_suite() -> Vec<PerformanceResult> {
    let mut results = Vec::new();

    // (场景数, 每场景步骤数)
    let test_cases = [(50, 5), (500, 10), (5000, 20)];

    for (scenarios, steps) in test_cases {
        tracing::info!("测试规模：{} 个场景，每个 {} 步", scenarios, steps);

        let (data, ms) = timed(|| generate_review_payload(scenarios, steps));
        results.push(PerformanceResult::new(
            &format!("数据生成({}x{})", scenarios, steps),
            ms,
            true,
            &format!("生成了 {} 个场景", scenarios),
        ));

        let (json_str, ms) = timed(|| serde_json::to_string(&data));
        match json_str {
            Ok(json_str) => {
                results.push(PerformanceResult::new(
                    &format!("JSON序列化({}x{})", scenarios, steps),
                    ms,
                    true,
                    &format!("序列化了 {} 字节", json_str.len()),
                ));
                results.push(benchmark_json_parsing(&json_str));
            }
            Err(e) => results.push(PerformanceResult::new(
                "JSON序列化",
                ms,
                false,
                &format!("序列化失败: {}", e),
            )),
        }

        results.push(benchmark_deep_clone(&data));
        results.push(benchmark_section_derivation(&data));
        results.push(benchmark_overview_build(&data));
        results.push(benchmark_edit_cycle(&data));

        let mut app_state = AppState::default();
        let (loaded, ms) = timed(|| app_state.load_value(data));
        results.push(PerformanceResult::new(
            &format!("AppState加载({}x{})", scenarios, steps),
            ms,
            loaded.is_ok(),
            "创建编辑会话",
        ));

        let test_paths = ["$", "$.background", "$.scenarios[0]", "$.file_save_location"];
        results.extend(benchmark_node_extraction(&app_state, &test_paths));
    }

    results
}
