pub mod config;
pub mod runner;

pub use config::{AlgorithmMode, HdrMode, InputKind, OutputResolution, StitchJobBuilder, StitchJobConfig};
pub use runner::{EngineError, JobHandle, JobOutcome, StitchEngine, StitchJobRunner};
