use crate::{
    ConfigAggregate, EDP_PIVOT_FILE, MAX_SLOWDOWN_PIVOT_FILE, NUM_CORES, RunExtractor, RunRecord,
    SUMMARY_FILE, TOTAL_CYCLES_PIVOT_FILE, WORKLOADS, collect_results, get_config_report_path,
};
use anyhow::{Context, anyhow};
use csv::{Terminator, Writer, WriterBuilder};
use indicatif::ProgressBar;
use log::info;
use std::{fs::File, io::BufWriter, path::Path};

fn new_writer() -> Writer<Vec<u8>> {
    WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(vec![])
}

fn into_string(writer: Writer<Vec<u8>>) -> anyhow::Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow!("Failed to flush csv writer: {}", err))?;
    Ok(String::from_utf8(bytes)?)
}

/// Whole numbers keep a trailing .0 so float columns read as floats
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Per workload cycles and slowdowns of one configuration, followed by its totals and EDP.
/// The three sections have different widths and are separated by an empty line.
pub fn render_config_detail(config: &ConfigAggregate) -> anyhow::Result<String> {
    let mut runs = new_writer();
    let mut header = vec!["Benchmark".to_string()];
    for core in 0..NUM_CORES {
        header.push(format!("Core{} Cycles", core));
    }
    header.push("Max Slowdown".to_string());
    for core in 0..NUM_CORES {
        header.push(format!("Core{} Slowdown", core));
    }
    runs.write_record(&header)?;
    for benchmark in &config.benchmarks {
        let run = &benchmark.run;
        let mut row = vec![benchmark.workload.to_string()];
        row.extend(run.cycles.iter().map(|cycles| cycles.to_string()));
        row.push(format_float(run.max_slowdown));
        row.extend(run.slowdown.iter().map(|slowdown| format_float(*slowdown)));
        runs.write_record(&row)?;
    }

    let mut totals = new_writer();
    totals.write_record([
        "TOTAL_NUM_CYCLES".to_string(),
        config.total_cycles.to_string(),
    ])?;
    totals.write_record([
        "AVG_MAX_SLOWDOWN".to_string(),
        format_float(config.avg_max_slowdown),
    ])?;
    totals.write_record(["PFP".to_string(), format_float(config.pfp)])?;

    let mut edp = new_writer();
    edp.write_record(["Benchmark", "EDP"])?;
    for benchmark in &config.benchmarks {
        edp.write_record([
            benchmark.workload.to_string(),
            format_float(benchmark.run.edp),
        ])?;
    }
    edp.write_record(["Total".to_string(), format_float(config.total_edp)])?;

    Ok([into_string(runs)?, into_string(totals)?, into_string(edp)?].join("\n"))
}

/// One row per configuration, sorted by name whatever the processing order
pub fn render_summary(configs: &[ConfigAggregate]) -> anyhow::Result<String> {
    let mut writer = new_writer();
    writer.write_record([
        "Scheduler",
        "Total Num Cycles",
        "Avg. Max Slowdown",
        "PFP",
        "Total EDP",
    ])?;

    let mut sorted: Vec<&ConfigAggregate> = configs.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    for config in sorted {
        writer.write_record([
            config.name.clone(),
            config.total_cycles.to_string(),
            format_float(config.avg_max_slowdown),
            format_float(config.pfp),
            format_float(config.total_edp),
        ])?;
    }
    into_string(writer)
}

/// Workloads as rows, configurations as columns in processing order
pub fn render_pivot<F>(title: &str, configs: &[ConfigAggregate], value: F) -> anyhow::Result<String>
where
    F: Fn(&RunRecord) -> String,
{
    let mut writer = new_writer();

    let mut header = vec![title.to_string()];
    header.extend(configs.iter().map(|config| config.name.clone()));
    writer.write_record(&header)?;

    for workload in &WORKLOADS {
        let mut row = vec![workload.to_string()];
        for config in configs {
            // every aggregate holds all workloads, a hole renders as an empty cell
            row.push(config.get(workload).map(&value).unwrap_or_default());
        }
        writer.write_record(&row)?;
    }
    into_string(writer)
}

pub fn render_edp_pivot(configs: &[ConfigAggregate]) -> anyhow::Result<String> {
    render_pivot("Workload (EDP)", configs, |run| format_float(run.edp))
}

pub fn render_max_slowdown_pivot(configs: &[ConfigAggregate]) -> anyhow::Result<String> {
    render_pivot("Workload (Max Slowdown)", configs, |run| {
        format_float(run.max_slowdown)
    })
}

pub fn render_total_cycles_pivot(configs: &[ConfigAggregate]) -> anyhow::Result<String> {
    render_pivot("Workload (Total Num Cycles)", configs, |run| {
        run.total_cycles.to_string()
    })
}

fn write_report<P: AsRef<Path>>(path: P, content: &str) -> anyhow::Result<()> {
    let path = path.as_ref();
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    info!("Report written to {}", path.display());
    Ok(())
}

/// Write all reports: one detail table inside each configuration directory,
/// the summary and the three pivots directly under root.
/// configs must be in processing order.
pub fn write_reports<P: AsRef<Path>>(root: P, configs: &[ConfigAggregate]) -> anyhow::Result<()> {
    let root = root.as_ref();

    // render everything first so a failure leaves no report behind
    let mut reports = vec![];
    for config in configs {
        reports.push((
            get_config_report_path(root, &config.name),
            render_config_detail(config)?,
        ));
    }
    reports.push((root.join(SUMMARY_FILE), render_summary(configs)?));
    reports.push((root.join(EDP_PIVOT_FILE), render_edp_pivot(configs)?));
    reports.push((
        root.join(MAX_SLOWDOWN_PIVOT_FILE),
        render_max_slowdown_pivot(configs)?,
    ));
    reports.push((
        root.join(TOTAL_CYCLES_PIVOT_FILE),
        render_total_cycles_pivot(configs)?,
    ));

    for (path, content) in reports {
        write_report(path, &content)?;
    }
    Ok(())
}

/// Dump every aggregate with its per workload detail as json
pub fn write_json<P: AsRef<Path>>(path: P, configs: &[ConfigAggregate]) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), configs)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Parsed results written to {}", path.display());
    Ok(())
}

/// Parse every configuration, then write the reports.
/// Nothing is written unless every log of every configuration parsed.
pub fn generate_reports<E: RunExtractor, P: AsRef<Path>>(
    extractor: &E,
    root: P,
    config_names: &[String],
    pbar: &ProgressBar,
) -> anyhow::Result<Vec<ConfigAggregate>> {
    let root = root.as_ref();
    let configs = collect_results(extractor, root, config_names, pbar)?;
    write_reports(root, &configs)?;
    Ok(configs)
}

#[cfg(test)]
mod tests {
    use crate::{
        BenchmarkDetail, ConfigAggregate, LogExtractor, NUM_CORES, RunRecord, WORKLOADS,
        format_float, generate_reports, get_log_file_name, render_config_detail, render_edp_pivot,
        render_max_slowdown_pivot, render_summary, render_total_cycles_pivot, write_json,
        write_reports,
    };
    use indicatif::ProgressBar;
    use std::path::{Path, PathBuf};

    /// A configuration whose every run took `cycles` per core with the given EDP
    fn make_config(name: &str, cycles: u64, edp: f64) -> ConfigAggregate {
        let benchmarks = WORKLOADS
            .iter()
            .map(|workload| {
                let mut slowdown = [0.0; NUM_CORES];
                for (core, trace) in workload.core_map().iter().enumerate() {
                    slowdown[core] = cycles as f64 / trace.baseline_cycles() as f64;
                }
                BenchmarkDetail {
                    workload: *workload,
                    log_path: PathBuf::new(),
                    run: RunRecord {
                        cycles: [cycles; NUM_CORES],
                        slowdown,
                        max_slowdown: slowdown.iter().cloned().fold(0.0, f64::max),
                        total_cycles: cycles * NUM_CORES as u64,
                        edp,
                    },
                }
            })
            .collect();
        ConfigAggregate::from_benchmarks(name, benchmarks)
    }

    /// Simulator logs of every workload of a configuration, optionally leaving one out
    fn write_logs(root: &Path, config_name: &str, skip: Option<&str>) {
        for workload in &WORKLOADS {
            let dir = root.join(config_name).join(workload.to_string());
            std::fs::create_dir_all(&dir).unwrap();
            if skip == Some(workload.to_string().as_str()) {
                continue;
            }
            let mut content = String::new();
            for (core, trace) in workload.core_map().iter().enumerate() {
                content.push_str(&format!(
                    "Done: Core {}: Fetched 1 : Committed 1 : At time : {}\n",
                    core,
                    trace.baseline_cycles()
                ));
            }
            content.push_str("Energy Delay product (EDP) = 0.5 J.s\n");
            std::fs::write(dir.join(get_log_file_name(config_name, workload)), content).unwrap();
        }
    }

    fn column(report: &str, index: usize) -> Vec<String> {
        report
            .lines()
            .map(|line| line.split(',').nth(index).unwrap_or("").to_string())
            .collect()
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(5.0), "5.0");
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(2.5), "2.5");
        assert_eq!(format_float(0.005), "0.005");
        assert_eq!(format_float(23000000000.0), "23000000000.0");
    }

    #[test]
    fn test_summary_sorted() {
        let configs = vec![
            make_config("zeta", 3, 0.5),
            make_config("alpha", 1, 1.5),
            make_config("mid", 2, 2.5),
        ];
        let summary = render_summary(&configs).unwrap();
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(
            lines[0],
            "Scheduler,Total Num Cycles,Avg. Max Slowdown,PFP,Total EDP"
        );
        assert_eq!(column(&summary, 0)[1..], ["alpha", "mid", "zeta"]);
        assert_eq!(
            lines[1],
            format!(
                "alpha,{},{},{},{}",
                configs[1].total_cycles,
                format_float(configs[1].avg_max_slowdown),
                format_float(configs[1].pfp),
                format_float(configs[1].total_edp)
            )
        );
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_pivot_processing_order() {
        let configs = vec![make_config("zeta", 3, 0.5), make_config("alpha", 1, 1.5)];
        let edp = render_edp_pivot(&configs).unwrap();
        let lines: Vec<&str> = edp.lines().collect();
        assert_eq!(lines[0], "Workload (EDP),zeta,alpha");
        assert_eq!(lines[1], "AAAA,0.5,1.5");

        let cycles = render_total_cycles_pivot(&configs).unwrap();
        assert_eq!(
            cycles.lines().next().unwrap(),
            "Workload (Total Num Cycles),zeta,alpha"
        );
        assert_eq!(cycles.lines().nth(10).unwrap(), "BCDE,12,4");

        let slowdown = render_max_slowdown_pivot(&configs).unwrap();
        assert_eq!(
            slowdown.lines().next().unwrap(),
            "Workload (Max Slowdown),zeta,alpha"
        );
        assert_eq!(
            slowdown.lines().nth(6).unwrap(),
            format!(
                "ABCD,{},{}",
                format_float(configs[0].benchmarks[5].run.max_slowdown),
                format_float(configs[1].benchmarks[5].run.max_slowdown)
            )
        );
    }

    #[test]
    fn test_pivot_row_order() {
        let expected = [
            "AAAA", "BBBB", "CCCC", "DDDD", "EEEE", "ABCD", "ABCE", "ABDE", "ACDE", "BCDE",
        ];
        for count in 0..3 {
            let configs: Vec<_> = (0..count)
                .map(|i| make_config(&format!("config{}", i), 10, 1.0))
                .collect();
            for report in [
                render_edp_pivot(&configs).unwrap(),
                render_max_slowdown_pivot(&configs).unwrap(),
                render_total_cycles_pivot(&configs).unwrap(),
            ] {
                assert_eq!(column(&report, 0)[1..], expected);
                assert_eq!(report.lines().count(), 11);
            }
        }
    }

    #[test]
    fn test_config_detail() {
        let config = make_config("base", 1000, 0.5);
        let detail = render_config_detail(&config).unwrap();
        let lines: Vec<&str> = detail.lines().collect();
        assert_eq!(
            lines[0],
            "Benchmark,Core0 Cycles,Core1 Cycles,Core2 Cycles,Core3 Cycles,Max Slowdown,\
             Core0 Slowdown,Core1 Slowdown,Core2 Slowdown,Core3 Slowdown"
        );
        let run = &config.benchmarks[0].run;
        assert_eq!(
            lines[1],
            format!(
                "AAAA,1000,1000,1000,1000,{},{},{},{},{}",
                format_float(run.max_slowdown),
                format_float(run.slowdown[0]),
                format_float(run.slowdown[1]),
                format_float(run.slowdown[2]),
                format_float(run.slowdown[3])
            )
        );
        assert!(lines[10].starts_with("BCDE,"));
        assert_eq!(lines[11], "");
        assert_eq!(lines[12], "TOTAL_NUM_CYCLES,40000");
        assert_eq!(
            lines[13],
            format!("AVG_MAX_SLOWDOWN,{}", format_float(config.avg_max_slowdown))
        );
        assert_eq!(lines[14], format!("PFP,{}", format_float(config.pfp)));
        assert_eq!(lines[15], "");
        assert_eq!(lines[16], "Benchmark,EDP");
        assert_eq!(lines[17], "AAAA,0.5");
        assert_eq!(lines[26], "BCDE,0.5");
        assert_eq!(lines[27], "Total,5.0");
        assert_eq!(lines.len(), 28);
        assert!(detail.ends_with("Total,5.0\n"));
    }

    #[test]
    fn test_quoting() {
        let config = make_config("a,b", 1, 0.0);
        let summary = render_summary(&[config]).unwrap();
        assert!(summary.lines().nth(1).unwrap().starts_with("\"a,b\","));
    }

    #[test]
    fn test_write_reports() {
        let root = tempfile::tempdir().unwrap();
        for name in ["mid", "alpha"] {
            std::fs::create_dir(root.path().join(name)).unwrap();
        }
        let configs = vec![make_config("mid", 2, 1.0), make_config("alpha", 1, 2.0)];
        write_reports(root.path(), &configs).unwrap();

        for name in [
            "results.csv",
            "edp_results.csv",
            "max_slow_results.csv",
            "tot_num_cycle_results.csv",
            "mid/mid_results.csv",
            "alpha/alpha_results.csv",
        ] {
            assert!(root.path().join(name).is_file(), "missing {}", name);
        }
        assert!(!root.path().join("mid_results.csv").exists());

        let summary = std::fs::read_to_string(root.path().join("results.csv")).unwrap();
        assert_eq!(summary, render_summary(&configs).unwrap());
        let edp = std::fs::read_to_string(root.path().join("edp_results.csv")).unwrap();
        assert!(edp.starts_with("Workload (EDP),mid,alpha\n"));
    }

    #[test]
    fn test_write_reports_missing_config_dir() {
        let root = tempfile::tempdir().unwrap();
        let configs = vec![make_config("gone", 2, 1.0)];
        assert!(write_reports(root.path(), &configs).is_err());
        assert!(!root.path().join("results.csv").exists());
    }

    #[test]
    fn test_write_json() {
        let root = tempfile::tempdir().unwrap();
        let configs = vec![make_config("base", 2, 1.0)];
        let path = root.path().join("results.json");
        write_json(&path, &configs).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed[0]["name"], "base");
        assert_eq!(parsed[0]["total_cycles"], 80);
        assert_eq!(parsed[0]["benchmarks"][5]["workload"], "ABCD");

        let missing = root.path().join("no-such-dir").join("results.json");
        let err = write_json(&missing, &configs).unwrap_err();
        assert!(format!("{}", err).contains("no-such-dir"));
    }

    #[test]
    fn test_generate_reports() {
        let root = tempfile::tempdir().unwrap();
        write_logs(root.path(), "beta", None);
        write_logs(root.path(), "alpha", None);

        let extractor = LogExtractor::new().unwrap();
        let names = vec!["beta".to_string(), "alpha".to_string()];
        let configs =
            generate_reports(&extractor, root.path(), &names, &ProgressBar::hidden()).unwrap();
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].name, "beta");
        assert_eq!(configs[0].avg_max_slowdown, 1.0);

        let edp = std::fs::read_to_string(root.path().join("edp_results.csv")).unwrap();
        assert!(edp.starts_with("Workload (EDP),beta,alpha\n"));
        assert!(root.path().join("beta/beta_results.csv").is_file());
    }

    #[test]
    fn test_missing_log_writes_nothing() {
        let root = tempfile::tempdir().unwrap();
        write_logs(root.path(), "first", None);
        write_logs(root.path(), "second", Some("ABDE"));

        let extractor = LogExtractor::new().unwrap();
        let names = vec!["first".to_string(), "second".to_string()];
        let result = generate_reports(&extractor, root.path(), &names, &ProgressBar::hidden());
        assert!(result.is_err());

        for name in [
            "results.csv",
            "edp_results.csv",
            "max_slow_results.csv",
            "tot_num_cycle_results.csv",
            "first/first_results.csv",
            "second/second_results.csv",
        ] {
            assert!(!root.path().join(name).exists(), "unexpected {}", name);
        }
    }
}
