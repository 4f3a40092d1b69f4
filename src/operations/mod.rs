pub mod console;
pub mod stitch_op;

pub use console::{Intent, IntentOutcome, OperatorConsole};
pub use stitch_op::StitchRequest;
