use std::sync::Arc;

use crate::{
    groups::{Group, Sequence},
    metadata::typesystem::TypeName,
    Error, Result,
};

/// The execution plan of one validation call.
///
/// A validation order holds single groups and sequences. Single groups are validated first, each
/// one independently; sequences are validated afterwards, position by position, stopping a
/// sequence at the first position that produced violations. Groups and sequences are
/// de-duplicated on insertion and keep the order of their first insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOrder {
    groups: Vec<Group>,
    sequences: Vec<Arc<Sequence>>,
}

impl ValidationOrder {
    /// The plan validating the `Default` group only.
    #[must_use]
    pub fn default_group() -> Self {
        ValidationOrder {
            groups: vec![Group::default_group()],
            sequences: Vec::new(),
        }
    }

    /// The plan validating the sequence `[Default]`.
    #[must_use]
    pub fn default_sequence() -> Self {
        ValidationOrder {
            groups: Vec::new(),
            sequences: vec![Arc::new(Sequence::default_sequence())],
        }
    }

    pub(crate) fn insert_group(&mut self, group: Group) {
        if !self.groups.contains(&group) {
            self.groups.push(group);
        }
    }

    pub(crate) fn insert_sequence(&mut self, sequence: Arc<Sequence>) {
        if !self.sequences.iter().any(|s| s.name() == sequence.name()) {
            self.sequences.push(sequence);
        }
    }

    /// The single groups, in insertion order.
    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// The sequences, in insertion order.
    #[must_use]
    pub fn sequences(&self) -> &[Arc<Sequence>] {
        &self.sequences
    }

    /// Returns `true` if the plan validates nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.sequences.is_empty()
    }

    /// Checks that a redefined default group sequence can replace `Default` inside every
    /// sequence of this plan.
    ///
    /// When a sequence contains `Default`, the groups of `default_sequence` that the sequence also
    /// lists must sit directly around the `Default` position: the first group of the default
    /// sequence right before it, the last one right after it. Other placements would validate
    /// those groups twice at different positions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpandableDefaultGroupSequence`] if a sequence violates this.
    pub fn assert_default_group_sequence_is_expandable(
        &self,
        default_sequence: &[TypeName],
    ) -> Result<()> {
        for sequence in &self.sequences {
            let groups = sequence.composing_groups();
            let Some(default_index) = groups.iter().position(Group::is_default_group) else {
                continue;
            };

            let last = default_sequence.len().saturating_sub(1);
            for (i, member) in default_sequence.iter().enumerate() {
                if member.is_default_group() {
                    continue;
                }
                let Some(index) = groups.iter().position(|g| g.name() == member) else {
                    continue;
                };
                if (i == 0 && index + 1 == default_index) || (i == last && index == default_index + 1)
                {
                    continue;
                }

                return Err(Error::UnexpandableDefaultGroupSequence {
                    default_sequence: default_sequence.to_vec(),
                    sequence: groups.iter().map(|g| g.name().clone()).collect(),
                });
            }
        }

        Ok(())
    }
}
