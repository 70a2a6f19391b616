use crate::dates;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

pub type Id = u64;

pub trait Record {
    fn id(&self) -> Id;
}

/// One persisted collection. Ids come from `next_id` and are never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table<T> {
    pub next_id: Id,
    pub rows: Vec<T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: Vec::new(),
        }
    }
}

impl<T: Record> Table<T> {
    pub fn get(&self, id: Id) -> Option<&T> {
        self.rows.iter().find(|row| row.id() == id)
    }

    pub fn contains(&self, id: Id) -> bool {
        self.get(id).is_some()
    }

    pub fn allocate_id(&mut self) -> Id {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    pub fn insert(&mut self, row: T) {
        self.rows.push(row);
    }

    pub fn replace(&mut self, row: T) -> bool {
        match self.rows.iter_mut().find(|existing| existing.id() == row.id()) {
            Some(slot) => {
                *slot = row;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: Id) -> Option<T> {
        let index = self.rows.iter().position(|row| row.id() == id)?;
        Some(self.rows.remove(index))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CrmData {
    #[serde(default)]
    pub clients: Table<Client>,
    #[serde(default)]
    pub contacts: Table<Contact>,
    #[serde(default)]
    pub activities: Table<Activity>,
    #[serde(default)]
    pub tasks: Table<Task>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    #[default]
    Active,
    Inactive,
    Lead,
}

impl ClientStatus {
    pub const VALUES: &'static [&'static str] = &["active", "inactive", "lead"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Lead => "lead",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Call,
    Email,
    Meeting,
    Note,
}

impl ActivityType {
    pub const VALUES: &'static [&'static str] = &["call", "email", "meeting", "note"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Email => "email",
            Self::Meeting => "meeting",
            Self::Note => "note",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub const VALUES: &'static [&'static str] = &["low", "medium", "high"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl TaskStatus {
    pub const VALUES: &'static [&'static str] = &["pending", "completed"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: Id,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub status: ClientStatus,
    #[serde(with = "dates::timestamp")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Id,
    pub client_id: Id,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub notes: Option<String>,
    #[serde(with = "dates::timestamp")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Id,
    pub client_id: Id,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub subject: String,
    pub description: Option<String>,
    #[serde(with = "dates::timestamp")]
    pub date: NaiveDateTime,
    #[serde(with = "dates::timestamp")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
    #[serde(default, with = "dates::optional_date")]
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(with = "dates::timestamp")]
    pub created_at: NaiveDateTime,
}

macro_rules! impl_record {
    ($($ty:ty),*) => {
        $(impl Record for $ty {
            fn id(&self) -> Id {
                self.id
            }
        })*
    };
}

impl_record!(Client, Contact, Activity, Task);

/// Distinguishes a key that is absent (`None`) from one sent as `null`
/// (`Some(None)`) in partial updates.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub status: ClientStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub company: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub address: Option<Option<String>>,
    pub status: Option<ClientStatus>,
}

#[derive(Debug, Deserialize)]
pub struct NewContact {
    pub client_id: Id,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactPatch {
    pub client_id: Option<Id>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub position: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct NewActivity {
    pub client_id: Id,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub subject: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivityPatch {
    pub client_id: Option<Id>,
    #[serde(rename = "type")]
    pub kind: Option<ActivityType>,
    pub subject: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientQuery {
    pub search: Option<String>,
    pub status: Option<String>,
}

/// Query for collections scoped to a client. The id stays a string so a
/// blank or malformed value means "no filter" rather than a rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientScopeQuery {
    pub client_id: Option<String>,
}

impl ClientScopeQuery {
    pub fn client_id(&self) -> Option<Id> {
        self.client_id.as_deref().and_then(|raw| raw.trim().parse().ok())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskQuery {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_clients: usize,
    pub active_clients: usize,
    pub total_contacts: usize,
    pub total_activities: usize,
    pub pending_tasks: usize,
    pub completed_tasks: usize,
    pub recent_activities: Vec<Activity>,
    pub upcoming_tasks: Vec<Task>,
}
