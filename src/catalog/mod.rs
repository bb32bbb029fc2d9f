mod skill;
mod source;
mod unlock;

pub use skill::SkillDefinition;
pub use source::{CatalogFetch, FetchError, JsonFileSource, SkillSource, fetch_all};
pub use unlock::{UnlockRecord, UnlockSet, parse_unlock_records};

use crate::diagnostics::Diagnostic;

/// A fetched catalog with every unlock payload decoded once. Unlock decoding
/// does not depend on the acting user, so it is not repeated per rebuild.
#[derive(Clone, Debug, Default)]
pub struct SkillCatalog {
    skills: Vec<SkillDefinition>,
    unlocks: Vec<UnlockSet>,
}

impl SkillCatalog {
    pub fn new(skills: Vec<SkillDefinition>, diagnostics: &mut Vec<Diagnostic>) -> Self {
        let unlocks = skills
            .iter()
            .enumerate()
            .map(|(position, skill)| {
                parse_unlock_records(&skill.label(position), &skill.unlocks, diagnostics)
            })
            .collect();

        Self { skills, unlocks }
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn skills(&self) -> &[SkillDefinition] {
        &self.skills
    }

    pub fn entries(&self) -> impl Iterator<Item = (&SkillDefinition, &UnlockSet)> {
        self.skills.iter().zip(self.unlocks.iter())
    }
}
