use crate::{NUM_CORES, Trace};
use anyhow::{Context, bail};
use log::{debug, warn};
use regex::bytes::Regex;
use serde::Serialize;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    str::FromStr,
};

/// Metrics parsed from the simulator output of a single run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunRecord {
    /// cycle at which each core finished, 0 if it never reported
    pub cycles: [u64; NUM_CORES],
    /// cycles divided by the single-thread baseline of the trace on that core
    pub slowdown: [f64; NUM_CORES],
    /// maximum of slowdown
    pub max_slowdown: f64,
    /// sum of cycles
    pub total_cycles: u64,
    /// energy delay product in J.s, 0 if absent
    pub edp: f64,
}

impl RunRecord {
    fn from_cycles(cycles: [u64; NUM_CORES], slowdown: [f64; NUM_CORES], edp: f64) -> Self {
        // strict comparison: the first of equal slowdowns wins
        let mut max_slowdown = 0.0;
        for value in slowdown {
            if value > max_slowdown {
                max_slowdown = value;
            }
        }
        Self {
            cycles,
            slowdown,
            max_slowdown,
            total_cycles: cycles.iter().sum(),
            edp,
        }
    }
}

/// Turns one log file into a run record
pub trait RunExtractor {
    /// core_map[i] is the trace running on core i
    fn extract(&self, path: &Path, core_map: &[Trace]) -> anyhow::Result<RunRecord>;
}

/// Extracts metrics from the text output of the memory simulator
pub struct LogExtractor {
    done_regex: Regex,
    edp_regex: Regex,
}

impl LogExtractor {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            done_regex: Regex::new(
                r"^Done: Core ([0-9]+): Fetched [0-9]+ : Committed [0-9]+ : At time : ([0-9]+)",
            )?,
            edp_regex: Regex::new(r"^Energy Delay product \(EDP\) = ([0-9]*\.?[0-9]+) J\.s")?,
        })
    }

    /// Scan log lines, lines matching neither pattern are skipped.
    /// Lines are matched as raw bytes, the log may hold text in any encoding.
    pub fn parse<R: BufRead>(&self, reader: R, core_map: &[Trace]) -> anyhow::Result<RunRecord> {
        let mut cycles = [0u64; NUM_CORES];
        let mut slowdown = [0f64; NUM_CORES];
        let mut reported = [false; NUM_CORES];
        let mut edp = None;

        for line in reader.split(b'\n') {
            let line = line?;

            if let Some(caps) = self.done_regex.captures(&line) {
                let core: usize = parse_field(&caps[1], &line)?;
                let cycle: u64 = parse_field(&caps[2], &line)?;
                if core >= NUM_CORES {
                    bail!(
                        "Core {} out of range in {:?}",
                        core,
                        String::from_utf8_lossy(&line)
                    );
                }
                let Some(trace) = core_map.get(core) else {
                    bail!(
                        "No trace assigned to core {} in {:?}",
                        core,
                        String::from_utf8_lossy(&line)
                    );
                };
                if reported[core] {
                    warn!("Core {} reported completion more than once", core);
                }
                reported[core] = true;
                cycles[core] = cycle;
                slowdown[core] = cycle as f64 / trace.baseline_cycles() as f64;
            }

            if let Some(caps) = self.edp_regex.captures(&line) {
                edp = Some(parse_field::<f64>(&caps[1], &line)?);
            }
        }

        for core in 0..core_map.len().min(NUM_CORES) {
            if !reported[core] {
                warn!("Core {} never reported completion, counting 0 cycles", core);
            }
        }
        if edp.is_none() {
            warn!("No EDP line found, counting 0 J.s");
        }

        Ok(RunRecord::from_cycles(cycles, slowdown, edp.unwrap_or(0.0)))
    }
}

/// Parse a captured number, the patterns only capture ascii digits and dots
fn parse_field<T>(field: &[u8], line: &[u8]) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    std::str::from_utf8(field)?
        .parse()
        .with_context(|| format!("Invalid number in {:?}", String::from_utf8_lossy(line)))
}

impl RunExtractor for LogExtractor {
    fn extract(&self, path: &Path, core_map: &[Trace]) -> anyhow::Result<RunRecord> {
        debug!("Parsing simulator log {}", path.display());
        let file = File::open(path)
            .with_context(|| format!("Failed to open simulator log {}", path.display()))?;
        self.parse(BufReader::new(file), core_map)
            .with_context(|| format!("Failed to parse simulator log {}", path.display()))
    }
}
