use serde::{Deserialize, Serialize};

/// Per-document structuring lifecycle.
///
/// `Structured`, `Unsupported` and `Failed` are terminal. A document may be
/// revisited on a job retry, so re-entering `Processing` from `Processing`
/// is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructuredStatus {
    Pending,
    Processing,
    Structured,
    Unsupported,
    Failed,
}

impl StructuredStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StructuredStatus::Structured | StructuredStatus::Unsupported | StructuredStatus::Failed
        )
    }

    pub fn can_transition_to(&self, next: &StructuredStatus) -> bool {
        match (self, next) {
            (StructuredStatus::Pending, StructuredStatus::Processing) => true,
            (StructuredStatus::Processing, StructuredStatus::Processing) => true,
            (StructuredStatus::Processing, StructuredStatus::Structured) => true,
            (StructuredStatus::Processing, StructuredStatus::Unsupported) => true,
            (StructuredStatus::Processing, StructuredStatus::Failed) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StructuredStatus::Pending => "pending",
            StructuredStatus::Processing => "processing",
            StructuredStatus::Structured => "structured",
            StructuredStatus::Unsupported => "unsupported",
            StructuredStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "pending" => Ok(StructuredStatus::Pending),
            "processing" => Ok(StructuredStatus::Processing),
            "structured" => Ok(StructuredStatus::Structured),
            "unsupported" => Ok(StructuredStatus::Unsupported),
            "failed" => Ok(StructuredStatus::Failed),
            _ => Err(format!("Invalid structured status: {}", s)),
        }
    }
}

impl std::fmt::Display for StructuredStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
