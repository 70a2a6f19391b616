use crate::models::{ClientStatus, CrmData, StatsResponse, TaskStatus};
use crate::store::compare_due;

const RECENT_LIMIT: usize = 5;

pub fn build_stats(data: &CrmData) -> StatsResponse {
    let clients = &data.clients.rows;
    let tasks = &data.tasks.rows;

    let mut recent_activities = data.activities.rows.clone();
    recent_activities.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
    recent_activities.truncate(RECENT_LIMIT);

    let mut upcoming_tasks: Vec<_> = tasks
        .iter()
        .filter(|task| task.status == TaskStatus::Pending)
        .cloned()
        .collect();
    upcoming_tasks.sort_by(|a, b| compare_due(a, b).then_with(|| a.id.cmp(&b.id)));
    upcoming_tasks.truncate(RECENT_LIMIT);

    StatsResponse {
        total_clients: clients.len(),
        active_clients: clients
            .iter()
            .filter(|client| client.status == ClientStatus::Active)
            .count(),
        total_contacts: data.contacts.len(),
        total_activities: data.activities.len(),
        pending_tasks: tasks
            .iter()
            .filter(|task| task.status == TaskStatus::Pending)
            .count(),
        completed_tasks: tasks
            .iter()
            .filter(|task| task.status == TaskStatus::Completed)
            .count(),
        recent_activities,
        upcoming_tasks,
    }
}
