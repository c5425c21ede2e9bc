use anyhow::bail;
use serde::{Serialize, Serializer};
use std::{fmt, str::FromStr};

/// number of cores in every simulated system
pub const NUM_CORES: usize = 4;

/// Input trace, each with its single-thread run length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Trace {
    A,
    B,
    C,
    D,
    E,
}

impl Trace {
    pub const ALL: [Trace; 5] = [Trace::A, Trace::B, Trace::C, Trace::D, Trace::E];

    /// cycles taken by the trace when running alone
    pub fn baseline_cycles(&self) -> u64 {
        match self {
            Trace::A => 424330872,
            Trace::B => 357830245,
            Trace::C => 645730097,
            Trace::D => 362998160,
            Trace::E => 377036457,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            Trace::A => 'A',
            Trace::B => 'B',
            Trace::C => 'C',
            Trace::D => 'D',
            Trace::E => 'E',
        }
    }

    pub fn from_letter(letter: char) -> Option<Trace> {
        Trace::ALL.into_iter().find(|trace| trace.letter() == letter)
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Assignment of traces to cores: position i runs on core i
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkloadCode([Trace; NUM_CORES]);

impl WorkloadCode {
    pub const fn new(traces: [Trace; NUM_CORES]) -> Self {
        Self(traces)
    }

    /// core id -> trace running on it
    pub fn core_map(&self) -> &[Trace; NUM_CORES] {
        &self.0
    }
}

impl fmt::Display for WorkloadCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for trace in &self.0 {
            write!(f, "{}", trace)?;
        }
        Ok(())
    }
}

impl FromStr for WorkloadCode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let letters: Vec<char> = s.chars().collect();
        if letters.len() != NUM_CORES {
            bail!("Workload code {:?} must have exactly {} traces", s, NUM_CORES);
        }
        let mut traces = [Trace::A; NUM_CORES];
        for (core, letter) in letters.into_iter().enumerate() {
            match Trace::from_letter(letter) {
                Some(trace) => traces[core] = trace,
                None => bail!("Unknown trace {:?} in workload code {:?}", letter, s),
            }
        }
        Ok(Self(traces))
    }
}

impl Serialize for WorkloadCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Every workload each configuration is evaluated against, in report order
pub const WORKLOADS: [WorkloadCode; 10] = {
    use Trace::*;
    [
        WorkloadCode::new([A, A, A, A]),
        WorkloadCode::new([B, B, B, B]),
        WorkloadCode::new([C, C, C, C]),
        WorkloadCode::new([D, D, D, D]),
        WorkloadCode::new([E, E, E, E]),
        WorkloadCode::new([A, B, C, D]),
        WorkloadCode::new([A, B, C, E]),
        WorkloadCode::new([A, B, D, E]),
        WorkloadCode::new([A, C, D, E]),
        WorkloadCode::new([B, C, D, E]),
    ]
};
