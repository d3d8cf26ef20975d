//! Domain event types.

use serde::{Deserialize, Serialize};

/// Domain events emitted by the ledger after successful mutations.
///
/// These events represent facts about ledger data changes. Runtime adapters
/// translate them into platform-specific actions (re-render, push to clients).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// Goals were created, updated, or deleted.
    GoalsChanged { goal_ids: Vec<String> },

    /// Contributions were added or removed.
    ContributionsChanged {
        goal_ids: Vec<String>,
        /// Originating expenses of the affected contributions
        expense_ids: Vec<String>,
    },

    /// A recalculation pass finished. `repaired_goal_ids` lists goals whose
    /// stored amount had drifted from their contributions.
    LedgerRecalculated { repaired_goal_ids: Vec<String> },

    /// The whole ledger was replaced from a snapshot.
    LedgerImported {
        goal_count: usize,
        contribution_count: usize,
    },
}

impl DomainEvent {
    /// Creates a GoalsChanged event.
    pub fn goals_changed(goal_ids: Vec<String>) -> Self {
        Self::GoalsChanged { goal_ids }
    }

    /// Creates a ContributionsChanged event.
    pub fn contributions_changed(goal_ids: Vec<String>, expense_ids: Vec<String>) -> Self {
        Self::ContributionsChanged {
            goal_ids,
            expense_ids,
        }
    }

    /// Creates a LedgerRecalculated event.
    pub fn ledger_recalculated(repaired_goal_ids: Vec<String>) -> Self {
        Self::LedgerRecalculated { repaired_goal_ids }
    }

    /// Creates a LedgerImported event.
    pub fn ledger_imported(goal_count: usize, contribution_count: usize) -> Self {
        Self::LedgerImported {
            goal_count,
            contribution_count,
        }
    }
}
