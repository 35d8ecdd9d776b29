use uuid::Uuid;

use crate::core::engine::EngineError;
use crate::models::{ActionKind, RecordActionRequest};

/// A swipe whose fields have been checked and parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSubmission {
    pub from_profile: Uuid,
    pub to_profile: Uuid,
    pub kind: ActionKind,
}

impl ActionSubmission {
    pub fn new(from_profile: Uuid, to_profile: Uuid, kind: ActionKind) -> Self {
        Self {
            from_profile,
            to_profile,
            kind,
        }
    }

    /// Parse raw request fields, rejecting empty values, malformed ids,
    /// unknown kinds and self-directed actions.
    pub fn parse(from_dog: &str, to_dog: &str, action: &str) -> Result<Self, EngineError> {
        let from_profile = parse_profile_id("fromDog", from_dog)?;
        let to_profile = parse_profile_id("toDog", to_dog)?;

        if action.trim().is_empty() {
            return Err(EngineError::Validation("action is required".to_string()));
        }
        let kind = action.parse::<ActionKind>().map_err(EngineError::Validation)?;

        let submission = Self::new(from_profile, to_profile, kind);
        submission.check()?;
        Ok(submission)
    }

    /// Invariants that hold regardless of how the submission was built
    pub fn check(&self) -> Result<(), EngineError> {
        if self.from_profile == self.to_profile {
            return Err(EngineError::Validation(
                "a dog cannot like or pass itself".to_string(),
            ));
        }
        Ok(())
    }
}

impl TryFrom<&RecordActionRequest> for ActionSubmission {
    type Error = EngineError;

    fn try_from(req: &RecordActionRequest) -> Result<Self, Self::Error> {
        Self::parse(&req.from_dog, &req.to_dog, &req.action)
    }
}

/// Parse a profile id path or body field
pub fn parse_profile_id(field: &str, raw: &str) -> Result<Uuid, EngineError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(EngineError::Validation(format!("{} is required", field)));
    }
    Uuid::parse_str(raw)
        .map_err(|_| EngineError::Validation(format!("{} is not a valid dog id", field)))
}
