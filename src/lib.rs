//! Collect memory scheduler simulation results into comparison reports
mod aggregate;
mod extract;
mod path;
mod report;
mod utils;
mod workload;

pub use aggregate::*;
pub use extract::*;
pub use path::*;
pub use report::*;
pub use utils::*;
pub use workload::*;
