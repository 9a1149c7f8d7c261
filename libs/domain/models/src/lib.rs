
pub mod artifact;
pub mod config;
pub mod events;
pub mod job;
pub mod stage;
pub mod verdict;

pub use artifact::{AlgorithmTag, ArtifactRef, DeletionProof};
pub use config::{EngineConfig, GaParameterTuple, StageDeadlines};
pub use events::PipelineEvent;
pub use job::{Job, JobState, JobView};
pub use stage::{
    AdmitDetail, AlphabetViolation, AmlDetail, AnalyzeDetail, FormatDetail, IdsDetail,
    PersistDetail, StageDetail, StageName, StageOutcome, StageRecord,
};
pub use verdict::{AnalysisResult, FailureReason, Verdict};
