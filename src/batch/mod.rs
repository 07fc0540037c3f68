//! Dataset generation runs: configuration, job planning, cancellation and reporting.

pub(crate) mod cancel;
pub(crate) mod config;
pub(crate) mod driver;
pub(crate) mod report;

pub use cancel::CancelToken;
pub use config::{BatchThreading, InputPaths, MosaicConfig, WebBackgroundConfig};
pub use driver::{BatchDriver, BatchInputs, PlannedJob, RunMode, layout_stem, plan_jobs};
pub use report::BatchReport;
