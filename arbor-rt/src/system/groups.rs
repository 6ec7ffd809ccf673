//! Actor groups for broadcast delivery.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::util::{ActorId, GroupId};

/// Group configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Member cap; `0` means unlimited.
    pub max_members: usize,
}

/// A named set of actors addressed collectively.
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    /// Group id.
    pub id: GroupId,
    /// Group name.
    pub name: String,
    /// Free-form group type label.
    pub group_type: String,
    /// Members in join order.
    pub members: Vec<ActorId>,
    /// Optional leader.
    pub leader: Option<ActorId>,
    /// Configuration.
    pub config: GroupConfig,
}

impl Group {
    /// Create an empty group.
    pub fn new(
        id: GroupId,
        name: impl Into<String>,
        group_type: impl Into<String>,
        config: GroupConfig,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            group_type: group_type.into(),
            members: Vec::new(),
            leader: None,
            config,
        }
    }

    /// Add a member. Returns `false` when the member cap is hit or the
    /// actor is already a member.
    pub fn add_member(&mut self, actor: ActorId) -> bool {
        if self.members.contains(&actor) {
            return false;
        }
        if self.config.max_members > 0 && self.members.len() >= self.config.max_members {
            return false;
        }
        self.members.push(actor);
        true
    }

    /// Remove a member; clears the leader slot if it pointed at them.
    pub fn remove_member(&mut self, actor: ActorId) {
        self.members.retain(|m| *m != actor);
        if self.leader == Some(actor) {
            self.leader = None;
        }
    }

    /// Whether `actor` is a member.
    pub fn contains(&self, actor: ActorId) -> bool {
        self.members.contains(&actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(max_members: usize) -> Group {
        Group::new(
            GroupId::from_raw(1),
            "workers",
            "pool",
            GroupConfig { max_members },
        )
    }

    #[test]
    fn test_add_and_remove() {
        let mut g = group(0);
        assert!(g.add_member(ActorId::from_raw(1)));
        assert!(g.add_member(ActorId::from_raw(2)));
        assert!(g.contains(ActorId::from_raw(1)));

        g.remove_member(ActorId::from_raw(1));
        assert!(!g.contains(ActorId::from_raw(1)));
        assert_eq!(g.members.len(), 1);
    }

    #[test]
    fn test_duplicate_add_refused() {
        let mut g = group(0);
        assert!(g.add_member(ActorId::from_raw(1)));
        assert!(!g.add_member(ActorId::from_raw(1)));
        assert_eq!(g.members.len(), 1);
    }

    #[test]
    fn test_member_cap() {
        let mut g = group(2);
        assert!(g.add_member(ActorId::from_raw(1)));
        assert!(g.add_member(ActorId::from_raw(2)));
        assert!(!g.add_member(ActorId::from_raw(3)));
    }

    #[test]
    fn test_leader_cleared_on_removal() {
        let mut g = group(0);
        g.add_member(ActorId::from_raw(1));
        g.leader = Some(ActorId::from_raw(1));

        g.remove_member(ActorId::from_raw(1));
        assert_eq!(g.leader, None);
    }
}
