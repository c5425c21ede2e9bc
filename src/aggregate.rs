use crate::{RunExtractor, RunRecord, WORKLOADS, WorkloadCode, get_config_dir, get_log_path};
use anyhow::Context;
use indicatif::ProgressBar;
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Result of one workload under one configuration
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkDetail {
    pub workload: WorkloadCode,
    /// simulator output the run was parsed from
    pub log_path: PathBuf,
    pub run: RunRecord,
}

/// Totals of one configuration over all workloads
#[derive(Debug, Clone, Serialize)]
pub struct ConfigAggregate {
    pub name: String,
    /// sum of total_cycles over all runs
    pub total_cycles: u64,
    /// sum of max_slowdown divided by the number of workloads
    pub avg_max_slowdown: f64,
    /// performance-fairness product: avg_max_slowdown * total_cycles
    pub pfp: f64,
    /// sum of edp over all runs
    pub total_edp: f64,
    /// per workload results in WORKLOADS order
    pub benchmarks: Vec<BenchmarkDetail>,
}

impl ConfigAggregate {
    pub fn from_benchmarks(name: &str, benchmarks: Vec<BenchmarkDetail>) -> Self {
        let mut total_cycles = 0;
        let mut slowdown_sum = 0.0;
        let mut total_edp = 0.0;
        for benchmark in &benchmarks {
            total_cycles += benchmark.run.total_cycles;
            slowdown_sum += benchmark.run.max_slowdown;
            total_edp += benchmark.run.edp;
        }

        // Always divide by the full workload count, not by benchmarks.len().
        // Runs with missing data drag the average down; this is the accepted
        // accuracy trade-off of the metric and must not be corrected here.
        let avg_max_slowdown = slowdown_sum / WORKLOADS.len() as f64;
        let pfp = avg_max_slowdown * total_cycles as f64;

        Self {
            name: name.to_string(),
            total_cycles,
            avg_max_slowdown,
            pfp,
            total_edp,
            benchmarks,
        }
    }

    pub fn get(&self, workload: &WorkloadCode) -> Option<&RunRecord> {
        self.benchmarks
            .iter()
            .find(|benchmark| benchmark.workload == *workload)
            .map(|benchmark| &benchmark.run)
    }
}

/// Parse the run of one workload under the configuration stored at config_dir
pub fn aggregate_benchmark<E: RunExtractor, P: AsRef<Path>>(
    extractor: &E,
    config_dir: P,
    config_name: &str,
    workload: &WorkloadCode,
) -> anyhow::Result<BenchmarkDetail> {
    let log_path = get_log_path(config_dir, config_name, workload);
    let run = extractor
        .extract(&log_path, workload.core_map())
        .with_context(|| format!("Failed to collect {} of {}", workload, config_name))?;
    Ok(BenchmarkDetail {
        workload: *workload,
        log_path,
        run,
    })
}

/// Parse every workload of the configuration under root
pub fn aggregate_config<E: RunExtractor, P: AsRef<Path>>(
    extractor: &E,
    root: P,
    config_name: &str,
) -> anyhow::Result<ConfigAggregate> {
    let config_dir = get_config_dir(root, config_name);
    info!("Collecting results of {}", config_dir.display());

    let mut benchmarks = vec![];
    for workload in &WORKLOADS {
        benchmarks.push(aggregate_benchmark(
            extractor,
            &config_dir,
            config_name,
            workload,
        )?);
    }

    let aggregate = ConfigAggregate::from_benchmarks(config_name, benchmarks);
    info!(
        "{}: {} cycles, {} avg. max slowdown, {} PFP, {} J.s EDP",
        aggregate.name,
        aggregate.total_cycles,
        aggregate.avg_max_slowdown,
        aggregate.pfp,
        aggregate.total_edp
    );
    Ok(aggregate)
}

/// Parse every configuration in order, stopping at the first failure
pub fn collect_results<E: RunExtractor, P: AsRef<Path>>(
    extractor: &E,
    root: P,
    config_names: &[String],
    pbar: &ProgressBar,
) -> anyhow::Result<Vec<ConfigAggregate>> {
    let root = root.as_ref();
    pbar.set_length(config_names.len() as u64);

    let mut configs = vec![];
    for name in config_names {
        pbar.set_message(name.clone());
        configs.push(aggregate_config(extractor, root, name)?);
        pbar.inc(1);
    }
    pbar.finish_and_clear();
    Ok(configs)
}

/// Configurations to process, in processing order.
/// Explicit names are kept as given, otherwise every subdirectory of root in sorted order.
pub fn discover_configs<P: AsRef<Path>>(
    root: P,
    explicit: &[String],
) -> anyhow::Result<Vec<String>> {
    if !explicit.is_empty() {
        let mut configs: Vec<String> = vec![];
        for name in explicit {
            if configs.contains(name) {
                warn!("Configuration {} given more than once, ignoring repeat", name);
            } else {
                configs.push(name.clone());
            }
        }
        return Ok(configs);
    }

    let root = root.as_ref();
    let mut configs = vec![];
    for entry in std::fs::read_dir(root)
        .with_context(|| format!("Failed to list configurations in {}", root.display()))?
    {
        let entry = entry?;
        // follows symlinks, like a plain directory test
        if entry.path().is_dir() {
            configs.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    configs.sort();
    Ok(configs)
}
