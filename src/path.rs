// results folder structure:
// {root}/
// |- results.csv
// |- edp_results.csv
// |- max_slow_results.csv
// |- tot_num_cycle_results.csv
// \- {config-name}/
//    |- {config-name}_results.csv
//    \- {workload-code}/
//       \- c{trace0}-c{trace1}-c{trace2}-c{trace3}-4_{config-name}

use crate::WorkloadCode;
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE: &str = "results.csv";
pub const EDP_PIVOT_FILE: &str = "edp_results.csv";
pub const MAX_SLOWDOWN_PIVOT_FILE: &str = "max_slow_results.csv";
pub const TOTAL_CYCLES_PIVOT_FILE: &str = "tot_num_cycle_results.csv";

/// Name of the simulator output, e.g. cA-cB-cC-cD-4_base
pub fn get_log_file_name(config_name: &str, workload: &WorkloadCode) -> String {
    let mut name = String::new();
    for trace in workload.core_map() {
        name.push('c');
        name.push(trace.letter());
        name.push('-');
    }
    name.push_str("4_");
    name.push_str(config_name);
    name
}

pub fn get_config_dir<P: AsRef<Path>>(root: P, config_name: &str) -> PathBuf {
    root.as_ref().join(config_name)
}

pub fn get_log_path<P: AsRef<Path>>(
    config_dir: P,
    config_name: &str,
    workload: &WorkloadCode,
) -> PathBuf {
    config_dir
        .as_ref()
        .join(workload.to_string())
        .join(get_log_file_name(config_name, workload))
}

pub fn get_config_report_path<P: AsRef<Path>>(root: P, config_name: &str) -> PathBuf {
    get_config_dir(root, config_name).join(format!("{}_results.csv", config_name))
}
