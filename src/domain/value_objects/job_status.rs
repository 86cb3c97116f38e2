use serde::{Deserialize, Serialize};

/// Lifecycle of an ingestion job.
///
/// `Completed` and `Failed` are terminal; a job never leaves a terminal
/// status. Re-entry into `Queued` via the retry path carries the same job id
/// and a higher attempt count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Queued,
    ProcessingStructure,
    ProcessingEmbeddings,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn is_queued(&self) -> bool {
        matches!(self, JobStatus::Queued)
    }

    pub fn can_transition_to(&self, next: &JobStatus) -> bool {
        match (self, next) {
            (JobStatus::Queued, JobStatus::ProcessingStructure) => true,
            (JobStatus::ProcessingStructure, JobStatus::ProcessingEmbeddings) => true,
            // An empty or all-unsupported job completes straight out of the
            // structuring stage.
            (JobStatus::ProcessingStructure, JobStatus::Completed) => true,
            (JobStatus::ProcessingEmbeddings, JobStatus::Completed) => true,
            // Retry re-entry and terminal failure.
            (JobStatus::ProcessingStructure, JobStatus::Queued) => true,
            (JobStatus::ProcessingEmbeddings, JobStatus::Queued) => true,
            (JobStatus::ProcessingStructure, JobStatus::Failed) => true,
            (JobStatus::ProcessingEmbeddings, JobStatus::Failed) => true,
            // Writing the current non-terminal status again is a no-op the
            // processor relies on when several documents produce chunks.
            (a, b) if a == b && !a.is_terminal() => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::ProcessingStructure => "processing_structure",
            JobStatus::ProcessingEmbeddings => "processing_embeddings",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "processing_structure" => Ok(JobStatus::ProcessingStructure),
            "processing_embeddings" => Ok(JobStatus::ProcessingEmbeddings),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(format!("Invalid job status: {}", s)),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::ProcessingStructure.is_terminal());
        assert!(!JobStatus::ProcessingEmbeddings.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn claim_and_stage_transitions() {
        assert!(JobStatus::Queued.can_transition_to(&JobStatus::ProcessingStructure));
        assert!(JobStatus::ProcessingStructure.can_transition_to(&JobStatus::ProcessingEmbeddings));
        assert!(JobStatus::ProcessingEmbeddings.can_transition_to(&JobStatus::Completed));
        assert!(JobStatus::ProcessingStructure.can_transition_to(&JobStatus::Completed));
    }

    #[test]
    fn retry_transitions() {
        assert!(JobStatus::ProcessingStructure.can_transition_to(&JobStatus::Queued));
        assert!(JobStatus::ProcessingEmbeddings.can_transition_to(&JobStatus::Queued));
        assert!(JobStatus::ProcessingEmbeddings.can_transition_to(&JobStatus::Failed));
    }

    #[test]
    fn terminal_statuses_are_one_way() {
        for next in [
            JobStatus::Queued,
            JobStatus::ProcessingStructure,
            JobStatus::ProcessingEmbeddings,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert!(!JobStatus::Completed.can_transition_to(&next));
            assert!(!JobStatus::Failed.can_transition_to(&next));
        }
    }

    #[test]
    fn repeated_non_terminal_write_is_legal() {
        assert!(
            JobStatus::ProcessingEmbeddings.can_transition_to(&JobStatus::ProcessingEmbeddings)
        );
    }

    #[test]
    fn string_round_trip() {
        for status in [
            JobStatus::Queued,
            JobStatus::ProcessingStructure,
            JobStatus::ProcessingEmbeddings,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(JobStatus::parse("paused").is_err());
    }
}
