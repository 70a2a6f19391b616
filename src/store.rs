//! Per-resource rules over [`CrmData`]: validation, filtering, ordering and
//! partial updates. Handlers stay generic over [`Resource`].

use crate::dates;
use crate::errors::AppError;
use crate::models::{
    Activity, ActivityPatch, Client, ClientPatch, ClientQuery, ClientScopeQuery, Contact,
    ContactPatch, CrmData, Id, NewActivity, NewClient, NewContact, NewTask, Record, Table, Task,
    TaskPatch, TaskQuery,
};
use chrono::NaiveDateTime;
use serde::{de::DeserializeOwned, Serialize};
use std::cmp::Ordering;

pub trait Resource: Record + Serialize + Clone + Send + Sync + Sized + 'static {
    /// Singular name used in log lines and error messages.
    const NAME: &'static str;

    type New: DeserializeOwned + Send + 'static;
    type Patch: DeserializeOwned + Send + 'static;
    type Query: DeserializeOwned + Default + Send + 'static;

    fn table(data: &CrmData) -> &Table<Self>;
    fn table_mut(data: &mut CrmData) -> &mut Table<Self>;

    fn build(data: &CrmData, id: Id, input: Self::New, now: NaiveDateTime) -> Result<Self, AppError>;
    fn apply(&mut self, data: &CrmData, patch: Self::Patch) -> Result<(), AppError>;

    fn matches(&self, query: &Self::Query) -> bool;
    fn order(a: &Self, b: &Self) -> Ordering;
}

pub fn list<R: Resource>(data: &CrmData, query: &R::Query) -> Vec<R> {
    let mut rows: Vec<R> = R::table(data)
        .rows
        .iter()
        .filter(|row| row.matches(query))
        .cloned()
        .collect();
    rows.sort_by(|a, b| R::order(a, b).then_with(|| b.id().cmp(&a.id())));
    rows
}

pub fn get<R: Resource>(data: &CrmData, id: Id) -> Result<R, AppError> {
    R::table(data)
        .get(id)
        .cloned()
        .ok_or_else(|| AppError::not_found(R::NAME, id))
}

pub fn create<R: Resource>(data: &mut CrmData, input: R::New) -> Result<R, AppError> {
    let id = R::table(data).next_id;
    let record = R::build(data, id, input, dates::now())?;
    let table = R::table_mut(data);
    table.allocate_id();
    table.insert(record.clone());
    Ok(record)
}

pub fn update<R: Resource>(data: &mut CrmData, id: Id, patch: R::Patch) -> Result<R, AppError> {
    let mut record = get::<R>(data, id)?;
    record.apply(data, patch)?;
    R::table_mut(data).replace(record.clone());
    Ok(record)
}

pub fn delete<R: Resource>(data: &mut CrmData, id: Id) -> Result<(), AppError> {
    R::table_mut(data)
        .remove(id)
        .map(|_| ())
        .ok_or_else(|| AppError::not_found(R::NAME, id))
}

fn required(field: &str, value: String) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn ensure_client(data: &CrmData, client_id: Id) -> Result<(), AppError> {
    if data.clients.contains(client_id) {
        Ok(())
    } else {
        Err(AppError::bad_request(format!("client {client_id} does not exist")))
    }
}

fn checked_email(data: &CrmData, email: String, own_id: Id) -> Result<String, AppError> {
    let email = required("email", email)?;
    let taken = data
        .clients
        .rows
        .iter()
        .any(|client| client.id != own_id && client.email.eq_ignore_ascii_case(&email));
    if taken {
        return Err(AppError::conflict(format!("a client with email {email} already exists")));
    }
    Ok(email)
}

fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|text| text.to_lowercase().contains(needle))
}

fn status_filter(filter: Option<&str>) -> Option<&str> {
    filter.map(str::trim).filter(|status| !status.is_empty())
}

impl Resource for Client {
    const NAME: &'static str = "client";

    type New = NewClient;
    type Patch = ClientPatch;
    type Query = ClientQuery;

    fn table(data: &CrmData) -> &Table<Self> {
        &data.clients
    }

    fn table_mut(data: &mut CrmData) -> &mut Table<Self> {
        &mut data.clients
    }

    fn build(data: &CrmData, id: Id, input: NewClient, now: NaiveDateTime) -> Result<Self, AppError> {
        Ok(Client {
            id,
            name: required("name", input.name)?,
            email: checked_email(data, input.email, id)?,
            phone: optional(input.phone),
            company: optional(input.company),
            address: optional(input.address),
            status: input.status,
            created_at: now,
        })
    }

    fn apply(&mut self, data: &CrmData, patch: ClientPatch) -> Result<(), AppError> {
        if let Some(name) = patch.name {
            self.name = required("name", name)?;
        }
        if let Some(email) = patch.email {
            self.email = checked_email(data, email, self.id)?;
        }
        if let Some(phone) = patch.phone {
            self.phone = optional(phone);
        }
        if let Some(company) = patch.company {
            self.company = optional(company);
        }
        if let Some(address) = patch.address {
            self.address = optional(address);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        Ok(())
    }

    fn matches(&self, query: &ClientQuery) -> bool {
        if let Some(status) = status_filter(query.status.as_deref()) {
            if self.status.as_str() != status {
                return false;
            }
        }
        match query.search.as_deref().map(str::trim) {
            Some(search) if !search.is_empty() => {
                let needle = search.to_lowercase();
                contains_ignore_case(Some(self.name.as_str()), &needle)
                    || contains_ignore_case(Some(self.email.as_str()), &needle)
                    || contains_ignore_case(self.company.as_deref(), &needle)
            }
            _ => true,
        }
    }

    fn order(a: &Self, b: &Self) -> Ordering {
        b.created_at.cmp(&a.created_at)
    }
}

impl Resource for Contact {
    const NAME: &'static str = "contact";

    type New = NewContact;
    type Patch = ContactPatch;
    type Query = ClientScopeQuery;

    fn table(data: &CrmData) -> &Table<Self> {
        &data.contacts
    }

    fn table_mut(data: &mut CrmData) -> &mut Table<Self> {
        &mut data.contacts
    }

    fn build(data: &CrmData, id: Id, input: NewContact, now: NaiveDateTime) -> Result<Self, AppError> {
        ensure_client(data, input.client_id)?;
        Ok(Contact {
            id,
            client_id: input.client_id,
            name: required("name", input.name)?,
            email: optional(input.email),
            phone: optional(input.phone),
            position: optional(input.position),
            notes: optional(input.notes),
            created_at: now,
        })
    }

    fn apply(&mut self, data: &CrmData, patch: ContactPatch) -> Result<(), AppError> {
        if let Some(client_id) = patch.client_id {
            ensure_client(data, client_id)?;
            self.client_id = client_id;
        }
        if let Some(name) = patch.name {
            self.name = required("name", name)?;
        }
        if let Some(email) = patch.email {
            self.email = optional(email);
        }
        if let Some(phone) = patch.phone {
            self.phone = optional(phone);
        }
        if let Some(position) = patch.position {
            self.position = optional(position);
        }
        if let Some(notes) = patch.notes {
            self.notes = optional(notes);
        }
        Ok(())
    }

    fn matches(&self, query: &ClientScopeQuery) -> bool {
        query.client_id().is_none_or(|client_id| self.client_id == client_id)
    }

    fn order(a: &Self, b: &Self) -> Ordering {
        b.created_at.cmp(&a.created_at)
    }
}

impl Resource for Activity {
    const NAME: &'static str = "activity";

    type New = NewActivity;
    type Patch = ActivityPatch;
    type Query = ClientScopeQuery;

    fn table(data: &CrmData) -> &Table<Self> {
        &data.activities
    }

    fn table_mut(data: &mut CrmData) -> &mut Table<Self> {
        &mut data.activities
    }

    fn build(data: &CrmData, id: Id, input: NewActivity, now: NaiveDateTime) -> Result<Self, AppError> {
        ensure_client(data, input.client_id)?;
        let date = input
            .date
            .as_deref()
            .and_then(dates::parse_datetime)
            .unwrap_or(now);
        Ok(Activity {
            id,
            client_id: input.client_id,
            kind: input.kind,
            subject: required("subject", input.subject)?,
            description: optional(input.description),
            date,
            created_at: now,
        })
    }

    fn apply(&mut self, data: &CrmData, patch: ActivityPatch) -> Result<(), AppError> {
        if let Some(client_id) = patch.client_id {
            ensure_client(data, client_id)?;
            self.client_id = client_id;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(subject) = patch.subject {
            self.subject = required("subject", subject)?;
        }
        if let Some(description) = patch.description {
            self.description = optional(description);
        }
        // An unreadable date keeps the stored one.
        if let Some(date) = patch.date.as_deref().and_then(dates::parse_datetime) {
            self.date = date;
        }
        Ok(())
    }

    fn matches(&self, query: &ClientScopeQuery) -> bool {
        query.client_id().is_none_or(|client_id| self.client_id == client_id)
    }

    fn order(a: &Self, b: &Self) -> Ordering {
        b.date.cmp(&a.date)
    }
}

impl Resource for Task {
    const NAME: &'static str = "task";

    type New = NewTask;
    type Patch = TaskPatch;
    type Query = TaskQuery;

    fn table(data: &CrmData) -> &Table<Self> {
        &data.tasks
    }

    fn table_mut(data: &mut CrmData) -> &mut Table<Self> {
        &mut data.tasks
    }

    fn build(_data: &CrmData, id: Id, input: NewTask, now: NaiveDateTime) -> Result<Self, AppError> {
        Ok(Task {
            id,
            title: required("title", input.title)?,
            description: optional(input.description),
            due_date: input.due_date.as_deref().and_then(dates::parse_date),
            status: input.status,
            priority: input.priority,
            created_at: now,
        })
    }

    fn apply(&mut self, _data: &CrmData, patch: TaskPatch) -> Result<(), AppError> {
        if let Some(title) = patch.title {
            self.title = required("title", title)?;
        }
        if let Some(description) = patch.description {
            self.description = optional(description);
        }
        match patch.due_date {
            Some(Some(raw)) if !raw.trim().is_empty() => {
                if let Some(due_date) = dates::parse_date(&raw) {
                    self.due_date = Some(due_date);
                }
            }
            Some(_) => self.due_date = None,
            None => {}
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        Ok(())
    }

    fn matches(&self, query: &TaskQuery) -> bool {
        status_filter(query.status.as_deref()).is_none_or(|status| self.status.as_str() == status)
    }

    fn order(a: &Self, b: &Self) -> Ordering {
        compare_due(a, b).then_with(|| b.created_at.cmp(&a.created_at))
    }
}

/// Earliest due date first; tasks without one sort last.
pub fn compare_due(a: &Task, b: &Task) -> Ordering {
    match (a.due_date, b.due_date) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
