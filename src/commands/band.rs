//! # band 命令实现
//!
//! 批量计算 HB 色散模型的能带边与有效质量。
//!
//! ## 功能
//! - 单文件或目录输入（glob 模式、可递归）
//! - rayon 并行处理每个参数文件
//! - 导出路径能带、能带面、有效质量报告与 PNG 能带图
//! - 汇总 `effective_masses.csv`，终端表格显示
//! - 优化失败的记录以 `failed` 写入汇总并在最后列出
//!
//! ## 依赖关系
//! - 使用 `cli/band.rs` 定义的参数
//! - 使用 `batch/`, `band/`, `parsers/ti_param.rs`
//! - 使用 `utils/output.rs`

use crate::band::export::{self, BandOutputs, MassRecord};
use crate::band::{self, plot, DeConfig};
use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::cli::band::BandArgs;
use crate::error::{OscreenError, Result};
use crate::parsers::ti_param;
use crate::utils::output;

use std::fs;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// 批处理汇总文件名
pub const MASS_CSV: &str = "effective_masses.csv";

/// 结果表格行
#[derive(Debug, Clone, Tabled)]
struct MassRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Band")]
    band: String,
    #[tabled(rename = "Edge (meV)")]
    edge: String,
    #[tabled(rename = "m1 (me)")]
    m1: String,
    #[tabled(rename = "m2 (me)")]
    m2: String,
    #[tabled(rename = "Source")]
    provenance: String,
}

impl From<&MassRecord> for MassRow {
    fn from(r: &MassRecord) -> Self {
        let fmt = |v: Option<f64>, prec: usize| {
            v.map(|x| format!("{:.*}", prec, x))
                .unwrap_or_else(|| "-".to_string())
        };
        MassRow {
            label: r.label.clone(),
            band: r.band.clone(),
            edge: fmt(r.edge_mev, 4),
            m1: fmt(r.m1, 4),
            m2: fmt(r.m2, 4),
            provenance: r.provenance.clone(),
        }
    }
}

/// 执行 band 命令
pub fn execute(args: BandArgs) -> Result<()> {
    output::print_header("Band Dispersion & Effective Masses");

    if !args.input.exists() {
        return Err(OscreenError::FileNotFound {
            path: args.input.display().to_string(),
        });
    }

    let collector = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive);
    let files = collector.collect();

    if files.is_empty() {
        return Err(OscreenError::NoFilesFound {
            pattern: args.pattern.clone(),
        });
    }

    let summary_dir = match &args.output {
        Some(dir) => dir.clone(),
        None if collector.is_directory() => args.input.clone(),
        None => parent_dir(&args.input),
    };
    fs::create_dir_all(&summary_dir).map_err(|e| OscreenError::write(&summary_dir, e))?;

    let config = DeConfig {
        population: args.population,
        max_generations: args.max_generations,
        seed: args.seed,
        ..DeConfig::default()
    };

    let runner = BatchRunner::new(args.jobs);
    output::print_info(&format!(
        "Found {} parameter file(s), using {} thread(s)",
        files.len(),
        runner.jobs()
    ));

    let result = runner.run(&files, |path| {
        let name = path.display().to_string();
        match process_file(path, &args, config) {
            Ok(Some(record)) => ProcessResult::Success(name, record),
            Ok(None) => ProcessResult::Skipped(name),
            Err(e) => ProcessResult::Failed(name, e.to_string()),
        }
    })?;

    if result.outputs.is_empty() && result.failures.is_empty() {
        output::print_skip(&format!(
            "All {} file(s) already processed (use --overwrite to recompute)",
            result.skipped
        ));
        return Ok(());
    }

    let mut records = result.outputs;
    records.sort_by(|a, b| a.label.cmp(&b.label));

    if !records.is_empty() {
        let rows: Vec<MassRow> = records.iter().map(MassRow::from).collect();
        println!("{}", Table::new(&rows));

        let csv_path = summary_dir.join(MASS_CSV);
        export::write_mass_csv(&records, &csv_path)?;
        output::print_output("summary", &csv_path);
    }

    output::print_done(&format!(
        "{} processed, {} skipped, {} failed",
        records.len(),
        result.skipped,
        result.failures.len()
    ));

    for record in records.iter().filter(|r| r.m1.is_none()) {
        output::print_warning(&failure_message(record));
    }

    if !result.failures.is_empty() {
        output::print_separator();
        for (path, err) in &result.failures {
            output::print_error(&format!("{}: {}", path, err));
        }
    }

    Ok(())
}

/// 处理单个参数文件；输出已存在且未要求覆盖时返回 None
fn process_file(path: &Path, args: &BandArgs, config: DeConfig) -> Result<Option<MassRecord>> {
    let input = ti_param::parse_ti_file(path)?;

    let out_dir = args.output.clone().unwrap_or_else(|| parent_dir(path));
    fs::create_dir_all(&out_dir).map_err(|e| OscreenError::write(&out_dir, e))?;

    let outputs = BandOutputs::new(&out_dir, &input.label);
    if outputs.exist() && !args.overwrite {
        log::debug!("{}: outputs exist, skipping", input.label);
        return Ok(None);
    }

    let analysis = band::analyze(input, config);
    let input = &analysis.input;

    export::write_band_path(&analysis.path, &outputs.band)?;
    export::write_surface(&analysis.surface, &outputs.surface)?;

    if !args.no_plot {
        let edge = analysis.search.success().then_some(analysis.search.edge.energy);
        let title = format!("{} ({})", input.label, input.kind);
        plot::generate_band_plot(&analysis.path, &title, edge, &outputs.plot)?;
    }

    let record = match &analysis.mass {
        Some(mass) => {
            export::write_effmass(input, &analysis.search, mass, &outputs.effmass)?;
            MassRecord::success(input, &analysis.search, mass)
        }
        None => MassRecord::failed(&input.label, Some(input.kind), analysis.search.failure),
    };

    Ok(Some(record))
}

fn failure_message(record: &MassRecord) -> String {
    let cause = record
        .failure
        .map(|f| f.to_string())
        .unwrap_or_else(|| "band-edge search failed".to_string());
    OscreenError::OptimizerFailed {
        label: record.label.clone(),
        reason: format!("{}, effective mass skipped", cause),
    }
    .to_string()
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
