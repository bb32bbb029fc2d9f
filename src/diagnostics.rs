use thiserror::Error;

/// Recovered faults in catalog data. None of these abort a rebuild; they are
/// logged and handed back next to the graph they were found in.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Diagnostic {
    #[error("skill {skill}: dropped unlock record ({reason})")]
    MalformedUnlockRecord { skill: String, reason: String },
    #[error("skill {skill}: unlock record has no user id")]
    MissingUserId { skill: String },
    #[error("catalog entry #{position} is not a skill ({reason}) and was dropped")]
    MalformedSkillEntry { position: usize, reason: String },
    #[error("catalog entry #{position} ({name:?}) has no id and was dropped")]
    MissingSkillId { position: usize, name: String },
    #[error("duplicate skill id {id}; keeping the first entry")]
    DuplicateSkillId { id: String },
    #[error("candidate count changed from {seeded} to {kept} after dropping entries without ids")]
    CandidateCountMismatch { seeded: usize, kept: usize },
    #[error("parent cycle through {members:?}; affected skills were excluded")]
    ParentCycle { members: Vec<String> },
    #[error("skill {skill} references unknown parent {parent}")]
    DanglingParent { skill: String, parent: String },
}

pub fn report(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        tracing::warn!(%diagnostic, "recovered malformed catalog data");
    }
}
