use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::job::{JobState, JobStore};

/// Aggregate state of a batch: `Processing` until every member job is
/// terminal, then `Complete` (even when some members failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupState {
    Processing,
    Complete,
}

/// A batch of jobs submitted together (explicit list or expanded playlist).
#[derive(Debug, Clone)]
pub struct BatchGroup {
    pub id: String,
    /// Member job ids in submission order.
    pub member_job_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A failed member, reported as part of a partial-success result.
#[derive(Debug, Clone, Serialize)]
pub struct MemberFailure {
    pub job_id: String,
    pub video_id: String,
    pub error: String,
}

/// On-demand aggregate status for a group.
#[derive(Debug, Clone, Serialize)]
pub struct GroupStatus {
    pub group_id: String,
    pub state: GroupState,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    /// Members the retention sweep already dropped from the job store.
    /// Only terminal jobs are swept, so these count toward completion.
    pub retired: usize,
    /// Rounded mean of member job percentages.
    pub percent: u8,
    pub failures: Vec<MemberFailure>,
}

/// Registry of batch groups.
///
/// Aggregate status is computed by scanning member job snapshots at query
/// time rather than maintained incrementally, so there is no counter to
/// drift out of sync with the job store.
pub struct BatchCoordinator {
    groups: DashMap<String, BatchGroup>,
}

impl BatchCoordinator {
    pub fn new() -> Self {
        Self { groups: DashMap::new() }
    }

    pub fn create_group(&self, id: String) {
        self.groups.insert(
            id.clone(),
            BatchGroup {
                id,
                member_job_ids: Vec::new(),
                created_at: Utc::now(),
            },
        );
    }

    pub fn add_member(&self, group_id: &str, job_id: String) {
        if let Some(mut group) = self.groups.get_mut(group_id) {
            group.member_job_ids.push(job_id);
        }
    }

    pub fn group(&self, id: &str) -> Option<BatchGroup> {
        self.groups.get(id).map(|g| g.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.groups.contains_key(id)
    }

    /// Computes the aggregate status of a group by scanning its member
    /// jobs.
    pub fn status(&self, id: &str, store: &JobStore) -> Option<GroupStatus> {
        let group = self.group(id)?;
        let members = store.snapshots(&group.member_job_ids);

        let total = group.member_job_ids.len();
        // A member missing from the store was terminal when the retention
        // sweep dropped it; a finished group must not regress to
        // Processing just because its jobs aged out.
        let retired = total - members.len();
        let completed = members.iter().filter(|j| j.state == JobState::Complete).count();
        let failed = members.iter().filter(|j| j.state == JobState::Failed).count();

        let percent = if total == 0 {
            0
        } else {
            let sum: u32 =
                members.iter().map(|j| j.percent as u32).sum::<u32>() + retired as u32 * 100;
            ((sum as f64 / total as f64).round()) as u8
        };

        let state = if completed + failed + retired == total && total > 0 {
            GroupState::Complete
        } else {
            GroupState::Processing
        };

        let failures = members
            .iter()
            .filter(|j| j.state == JobState::Failed)
            .map(|j| MemberFailure {
                job_id: j.id.clone(),
                video_id: j.video_id.clone(),
                error: j
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown failure".to_string()),
            })
            .collect();

        Some(GroupStatus {
            group_id: group.id,
            state,
            total,
            completed,
            failed,
            retired,
            percent,
            failures,
        })
    }
}

impl Default for BatchCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
