//! Command classification: static membership predicates over the
//! configured command sets.
//!
//! Categories are not exclusive. A command can be both group-admin-only
//! and group-only, and the engine checks each predicate independently.

use std::collections::{BTreeSet, HashSet};

use crate::config::{Commands, normalize_name};

/// Immutable command registry built once from configuration.
#[derive(Debug, Clone, Default)]
pub struct CommandClassifier {
    owner_only: HashSet<String>,
    group_admin: HashSet<String>,
    group_only: HashSet<String>,
    general: HashSet<String>,
}

fn to_set(names: &[String]) -> HashSet<String> {
    names.iter().map(|n| normalize_name(n)).collect()
}

impl CommandClassifier {
    /// Build the registry from the `[commands]` section.
    pub fn from_config(commands: &Commands) -> Self {
        Self {
            owner_only: to_set(&commands.owner_only),
            group_admin: to_set(&commands.group_admin),
            group_only: to_set(&commands.group_only),
            general: to_set(&commands.general),
        }
    }

    /// Only the owner may run this command.
    pub fn is_owner_only(&self, cmd: &str) -> bool {
        self.owner_only.contains(cmd)
    }

    /// The sender must hold an admin role in the group.
    pub fn is_group_admin_only(&self, cmd: &str) -> bool {
        self.group_admin.contains(cmd)
    }

    /// Only valid inside a group chat.
    pub fn is_group_only(&self, cmd: &str) -> bool {
        self.group_only.contains(cmd)
    }

    pub fn is_general(&self, cmd: &str) -> bool {
        self.general.contains(cmd)
    }

    /// Whether the command appears in any set.
    pub fn is_known(&self, cmd: &str) -> bool {
        self.is_owner_only(cmd)
            || self.is_group_admin_only(cmd)
            || self.is_group_only(cmd)
            || self.is_general(cmd)
    }

    /// Commands a menu should list for a sender in the given context.
    ///
    /// General commands are always listed. Group-scoped commands are listed
    /// only inside groups, and owner-only commands only to the owner.
    /// The result is sorted and deduplicated.
    pub fn visible(&self, in_group: bool, is_owner: bool) -> Vec<&str> {
        let all = self
            .general
            .iter()
            .chain(&self.group_only)
            .chain(&self.group_admin)
            .chain(&self.owner_only);

        let shown: BTreeSet<&str> = all
            .map(String::as_str)
            .filter(|cmd| {
                if self.is_owner_only(cmd) && !is_owner {
                    return false;
                }
                if (self.is_group_only(cmd) || self.is_group_admin_only(cmd)) && !in_group {
                    return false;
                }
                true
            })
            .collect();
        shown.into_iter().collect()
    }
}
