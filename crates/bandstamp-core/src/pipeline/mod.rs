pub mod config;
mod orchestrator;
mod output;
mod source;
mod types;

pub use orchestrator::{
    align_and_stamp, align_and_stamp_from_source, align_and_stamp_from_source_reported,
    check_registration,
};
pub use output::{StampWriter, WriteOutcome};
pub use source::{DirectoryFrameSource, FrameSource};
pub use types::{
    AlignmentOutput, BandStamp, PipelineStage, ProgressReporter, RegistrationResidual,
    StampOptions,
};
