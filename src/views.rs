//! Per-entity screen configuration and the shared list renderer.
//!
//! Each entity implements [`EntityView`] once: endpoint, columns, form
//! fields, filters and how a record becomes table cells and form values.
//! Both the server-rendered pages and [`crate::controller::Controller`] go
//! through [`render_table`], so a list looks the same however it was loaded.

use crate::dates::{DATE_FORMAT, INPUT_DATETIME_FORMAT};
use crate::format::{
    escape_html, format_date, format_timestamp, or_missing, truncate, MISSING, TRUNCATE_LENGTH,
};
use crate::models::{
    Activity, ActivityType, Client, ClientStatus, Contact, Id, Record, StatsResponse, Task,
    TaskPriority, TaskStatus,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub type FormValues = BTreeMap<String, String>;

pub const UNKNOWN_CLIENT: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    TextArea,
    Choice(&'static [&'static str]),
    /// A `<select>` over the loaded clients; submitted as a number.
    ClientRef,
    DateTime,
    Date,
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn field(name: &'static str, label: &'static str, kind: FieldKind, required: bool) -> Field {
    Field {
        name,
        label,
        kind,
        required,
    }
}

#[derive(Debug, Clone, Copy)]
pub enum FilterKind {
    Search,
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
pub struct FilterControl {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FilterKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Badge(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Complete,
    Edit,
    Delete,
}

impl RowAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Complete => "Complete",
            Self::Edit => "Edit",
            Self::Delete => "Delete",
        }
    }

    fn class(&self) -> &'static str {
        match self {
            Self::Complete => "btn-success",
            Self::Edit => "btn-primary",
            Self::Delete => "btn-danger",
        }
    }
}

pub trait EntityView: Record + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Capitalized name used in titles and flash messages.
    const LABEL: &'static str;
    const SINGULAR: &'static str;
    const PLURAL: &'static str;
    /// JSON collection endpoint.
    const ENDPOINT: &'static str;
    /// Page path of the screen.
    const SCREEN: &'static str;
    const COLUMNS: &'static [&'static str];
    const FIELDS: &'static [Field];
    const FILTERS: &'static [FilterControl] = &[];
    /// Whether rows show a client name and the form offers a client picker.
    const REFERENCES_CLIENTS: bool = false;

    fn cells(&self, clients: &[Client]) -> Vec<Cell>;

    fn actions(&self) -> Vec<RowAction> {
        vec![RowAction::Edit, RowAction::Delete]
    }

    fn form_values(&self) -> FormValues;

    fn form_defaults() -> FormValues {
        FormValues::new()
    }
}

pub fn client_name(clients: &[Client], id: Id) -> &str {
    clients
        .iter()
        .find(|client| client.id == id)
        .map_or(UNKNOWN_CLIENT, |client| client.name.as_str())
}

fn text(value: impl Into<String>) -> Cell {
    Cell::Text(value.into())
}

fn excerpt(value: Option<&str>) -> Cell {
    match value {
        Some(body) if !body.is_empty() => Cell::Text(truncate(body, TRUNCATE_LENGTH)),
        _ => text(MISSING),
    }
}

fn form(pairs: &[(&str, String)]) -> FormValues {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

pub fn empty_message<E: EntityView>() -> String {
    format!("<p class=\"empty-message\">No {} found</p>", E::PLURAL)
}

pub fn load_failure_message<E: EntityView>() -> String {
    format!("<p class=\"empty-message\">Failed to load {}</p>", E::PLURAL)
}

fn render_cell(cell: &Cell) -> String {
    match cell {
        Cell::Text(value) => escape_html(value),
        Cell::Badge(value) => format!("<span class=\"badge badge-{value}\">{value}</span>"),
    }
}

/// Renders a list as an HTML table, or the empty-state message when there
/// is nothing to show.
pub fn render_table<E: EntityView>(items: &[E], clients: &[Client]) -> String {
    if items.is_empty() {
        return empty_message::<E>();
    }

    let mut html = String::from("<table>\n<thead>\n<tr>");
    for column in E::COLUMNS {
        html.push_str(&format!("<th>{column}</th>"));
    }
    html.push_str("<th>Actions</th></tr>\n</thead>\n<tbody>\n");

    for item in items {
        html.push_str(&format!("<tr data-id=\"{}\">", item.id()));
        for cell in item.cells(clients) {
            html.push_str(&format!("<td>{}</td>", render_cell(&cell)));
        }
        html.push_str("<td>");
        for action in item.actions() {
            html.push_str(&format!(
                "<button type=\"button\" data-action=\"{}\" data-id=\"{}\" class=\"btn {} action-btn\">{}</button>",
                action.name(),
                item.id(),
                action.class(),
                action.label()
            ));
        }
        html.push_str("</td></tr>\n");
    }

    html.push_str("</tbody>\n</table>");
    html
}

/// Turns submitted form fields into the JSON body sent to the API.
/// Client references become numbers; a blank one becomes `null`. A blank
/// choice is left out so the server keeps its default or stored value.
pub fn form_payload<E: EntityView>(values: &FormValues) -> Value {
    let mut body = Map::new();
    for field in E::FIELDS {
        let raw = values.get(field.name).map(String::as_str).unwrap_or_default();
        let value = match field.kind {
            FieldKind::ClientRef => raw
                .trim()
                .parse::<Id>()
                .map(Value::from)
                .unwrap_or(Value::Null),
            FieldKind::Choice(_) if raw.trim().is_empty() => continue,
            _ => Value::String(raw.to_string()),
        };
        body.insert(field.name.to_string(), value);
    }
    Value::Object(body)
}

/// The dashboard count cards.
pub fn render_stat_cards(stats: &StatsResponse) -> String {
    [
        ("Total clients", "total-clients", stats.total_clients),
        ("Active clients", "active-clients", stats.active_clients),
        ("Contacts", "total-contacts", stats.total_contacts),
        ("Activities", "total-activities", stats.total_activities),
        ("Pending tasks", "pending-tasks", stats.pending_tasks),
        ("Completed tasks", "completed-tasks", stats.completed_tasks),
    ]
    .iter()
    .map(|(label, id, count)| {
        format!(
            "<div class=\"card stat\"><span class=\"label\">{label}</span><span class=\"value\" id=\"{id}\">{count}</span></div>"
        )
    })
    .collect()
}

pub fn render_recent_activities(activities: &[Activity]) -> String {
    if activities.is_empty() {
        return "<p class=\"empty-message\">No recent activities</p>".to_string();
    }
    activities
        .iter()
        .map(|activity| {
            format!(
                "<div class=\"list-item\"><div><strong>{}</strong></div><div>{}</div><div><small>{}</small></div></div>",
                escape_html(&activity.subject),
                render_cell(&Cell::Badge(activity.kind.as_str())),
                format_timestamp(Some(&activity.date))
            )
        })
        .collect()
}

pub fn render_upcoming_tasks(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "<p class=\"empty-message\">No upcoming tasks</p>".to_string();
    }
    tasks
        .iter()
        .map(|task| {
            format!(
                "<div class=\"list-item\"><div><strong>{}</strong></div><div>{}</div><div><small>Due: {}</small></div></div>",
                escape_html(&task.title),
                render_cell(&Cell::Badge(task.priority.as_str())),
                format_date(task.due_date)
            )
        })
        .collect()
}

impl EntityView for Client {
    const LABEL: &'static str = "Client";
    const SINGULAR: &'static str = "client";
    const PLURAL: &'static str = "clients";
    const ENDPOINT: &'static str = "/api/clients";
    const SCREEN: &'static str = "/clients";
    const COLUMNS: &'static [&'static str] = &["Name", "Email", "Phone", "Company", "Status", "Created"];
    const FIELDS: &'static [Field] = &[
        field("name", "Name", FieldKind::Text, true),
        field("email", "Email", FieldKind::Email, true),
        field("phone", "Phone", FieldKind::Tel, false),
        field("company", "Company", FieldKind::Text, false),
        field("address", "Address", FieldKind::TextArea, false),
        field("status", "Status", FieldKind::Choice(ClientStatus::VALUES), true),
    ];
    const FILTERS: &'static [FilterControl] = &[
        FilterControl {
            name: "search",
            label: "Search clients...",
            kind: FilterKind::Search,
        },
        FilterControl {
            name: "status",
            label: "All statuses",
            kind: FilterKind::Choice(ClientStatus::VALUES),
        },
    ];

    fn cells(&self, _clients: &[Client]) -> Vec<Cell> {
        vec![
            text(&self.name),
            text(&self.email),
            text(or_missing(self.phone.as_deref())),
            text(or_missing(self.company.as_deref())),
            Cell::Badge(self.status.as_str()),
            text(format_timestamp(Some(&self.created_at))),
        ]
    }

    fn form_values(&self) -> FormValues {
        form(&[
            ("name", self.name.clone()),
            ("email", self.email.clone()),
            ("phone", opt(&self.phone)),
            ("company", opt(&self.company)),
            ("address", opt(&self.address)),
            ("status", self.status.as_str().to_string()),
        ])
    }

    fn form_defaults() -> FormValues {
        form(&[("status", ClientStatus::default().as_str().to_string())])
    }
}

impl EntityView for Contact {
    const LABEL: &'static str = "Contact";
    const SINGULAR: &'static str = "contact";
    const PLURAL: &'static str = "contacts";
    const ENDPOINT: &'static str = "/api/contacts";
    const SCREEN: &'static str = "/contacts";
    const COLUMNS: &'static [&'static str] = &["Name", "Email", "Phone", "Position", "Client", "Created"];
    const FIELDS: &'static [Field] = &[
        field("client_id", "Client", FieldKind::ClientRef, true),
        field("name", "Name", FieldKind::Text, true),
        field("email", "Email", FieldKind::Email, false),
        field("phone", "Phone", FieldKind::Tel, false),
        field("position", "Position", FieldKind::Text, false),
        field("notes", "Notes", FieldKind::TextArea, false),
    ];
    const REFERENCES_CLIENTS: bool = true;

    fn cells(&self, clients: &[Client]) -> Vec<Cell> {
        vec![
            text(&self.name),
            text(or_missing(self.email.as_deref())),
            text(or_missing(self.phone.as_deref())),
            text(or_missing(self.position.as_deref())),
            text(client_name(clients, self.client_id)),
            text(format_timestamp(Some(&self.created_at))),
        ]
    }

    fn form_values(&self) -> FormValues {
        form(&[
            ("client_id", self.client_id.to_string()),
            ("name", self.name.clone()),
            ("email", opt(&self.email)),
            ("phone", opt(&self.phone)),
            ("position", opt(&self.position)),
            ("notes", opt(&self.notes)),
        ])
    }
}

impl EntityView for Activity {
    const LABEL: &'static str = "Activity";
    const SINGULAR: &'static str = "activity";
    const PLURAL: &'static str = "activities";
    const ENDPOINT: &'static str = "/api/activities";
    const SCREEN: &'static str = "/activities";
    const COLUMNS: &'static [&'static str] = &["Type", "Subject", "Client", "Date", "Description"];
    const FIELDS: &'static [Field] = &[
        field("client_id", "Client", FieldKind::ClientRef, true),
        field("type", "Type", FieldKind::Choice(ActivityType::VALUES), true),
        field("subject", "Subject", FieldKind::Text, true),
        field("description", "Description", FieldKind::TextArea, false),
        field("date", "Date", FieldKind::DateTime, true),
    ];
    const REFERENCES_CLIENTS: bool = true;

    fn cells(&self, clients: &[Client]) -> Vec<Cell> {
        vec![
            Cell::Badge(self.kind.as_str()),
            text(&self.subject),
            text(client_name(clients, self.client_id)),
            text(format_timestamp(Some(&self.date))),
            excerpt(self.description.as_deref()),
        ]
    }

    fn form_values(&self) -> FormValues {
        form(&[
            ("client_id", self.client_id.to_string()),
            ("type", self.kind.as_str().to_string()),
            ("subject", self.subject.clone()),
            ("description", opt(&self.description)),
            ("date", self.date.format(INPUT_DATETIME_FORMAT).to_string()),
        ])
    }

    fn form_defaults() -> FormValues {
        form(&[
            ("type", ActivityType::Call.as_str().to_string()),
            ("date", crate::dates::now().format(INPUT_DATETIME_FORMAT).to_string()),
        ])
    }
}

impl EntityView for Task {
    const LABEL: &'static str = "Task";
    const SINGULAR: &'static str = "task";
    const PLURAL: &'static str = "tasks";
    const ENDPOINT: &'static str = "/api/tasks";
    const SCREEN: &'static str = "/tasks";
    const COLUMNS: &'static [&'static str] = &["Title", "Description", "Due Date", "Priority", "Status"];
    const FIELDS: &'static [Field] = &[
        field("title", "Title", FieldKind::Text, true),
        field("description", "Description", FieldKind::TextArea, false),
        field("due_date", "Due Date", FieldKind::Date, false),
        field("priority", "Priority", FieldKind::Choice(TaskPriority::VALUES), true),
        field("status", "Status", FieldKind::Choice(TaskStatus::VALUES), true),
    ];
    const FILTERS: &'static [FilterControl] = &[FilterControl {
        name: "status",
        label: "All tasks",
        kind: FilterKind::Choice(TaskStatus::VALUES),
    }];

    fn cells(&self, _clients: &[Client]) -> Vec<Cell> {
        vec![
            text(&self.title),
            excerpt(self.description.as_deref()),
            text(format_date(self.due_date)),
            Cell::Badge(self.priority.as_str()),
            Cell::Badge(self.status.as_str()),
        ]
    }

    fn actions(&self) -> Vec<RowAction> {
        if self.status == TaskStatus::Pending {
            vec![RowAction::Complete, RowAction::Edit, RowAction::Delete]
        } else {
            vec![RowAction::Edit, RowAction::Delete]
        }
    }

    fn form_values(&self) -> FormValues {
        form(&[
            ("title", self.title.clone()),
            ("description", opt(&self.description)),
            (
                "due_date",
                self.due_date
                    .map(|day| day.format(DATE_FORMAT).to_string())
                    .unwrap_or_default(),
            ),
            ("priority", self.priority.as_str().to_string()),
            ("status", self.status.as_str().to_string()),
        ])
    }

    fn form_defaults() -> FormValues {
        form(&[
            ("priority", TaskPriority::default().as_str().to_string()),
            ("status", TaskStatus::default().as_str().to_string()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn acme() -> Client {
        Client {
            id: 1,
            name: "Acme".into(),
            email: "a@acme.com".into(),
            phone: None,
            company: Some("Acme & Sons".into()),
            address: None,
            status: ClientStatus::Active,
            created_at: NaiveDate::from_ymd_opt(2026, 1, 5)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        }
    }

    fn jane(client_id: Id) -> Contact {
        Contact {
            id: 3,
            client_id,
            name: "Jane".into(),
            email: None,
            phone: None,
            position: Some("CTO".into()),
            notes: None,
            created_at: acme().created_at,
        }
    }

    #[test]
    fn empty_list_renders_placeholder_not_table() {
        let html = render_table::<Task>(&[], &[]);
        assert_eq!(html, "<p class=\"empty-message\">No tasks found</p>");
        assert!(!html.contains("<table"));
        assert_eq!(
            render_table::<Activity>(&[], &[]),
            "<p class=\"empty-message\">No activities found</p>"
        );
    }

    #[test]
    fn client_rows_escape_text_and_badge_status() {
        let html = render_table(&[acme()], &[]);
        assert!(html.contains("<th>Company</th>"));
        assert!(html.contains("<td>Acme &amp; Sons</td>"));
        assert!(html.contains("<span class=\"badge badge-active\">active</span>"));
        assert!(html.contains("<td>N/A</td>"));
        assert!(html.contains("data-action=\"edit\" data-id=\"1\""));
    }

    #[test]
    fn contact_rows_resolve_client_names() {
        let html = render_table(&[jane(1)], &[acme()]);
        assert!(html.contains("<td>Jane</td>"));
        assert!(html.contains("<td>Acme</td>"));

        let dangling = render_table(&[jane(1)], &[]);
        assert!(dangling.contains("<td>Unknown</td>"));
    }

    #[test]
    fn only_pending_tasks_offer_complete() {
        let mut task = Task {
            id: 9,
            title: "Send quote".into(),
            description: Some("d".repeat(80)),
            due_date: None,
            status: TaskStatus::Pending,
            priority: TaskPriority::High,
            created_at: acme().created_at,
        };
        let pending = render_table(&[task.clone()], &[]);
        assert!(pending.contains("data-action=\"complete\""));
        assert!(pending.contains(&format!("<td>{}...</td>", "d".repeat(50))));

        task.status = TaskStatus::Completed;
        let done = render_table(&[task], &[]);
        assert!(!done.contains("data-action=\"complete\""));
    }

    #[test]
    fn activity_form_uses_datetime_local_format() {
        let activity = Activity {
            id: 2,
            client_id: 1,
            kind: ActivityType::Email,
            subject: "Proposal".into(),
            description: None,
            date: NaiveDate::from_ymd_opt(2026, 2, 10)
                .unwrap()
                .and_hms_opt(16, 45, 0)
                .unwrap(),
            created_at: acme().created_at,
        };
        let values = activity.form_values();
        assert_eq!(values["date"], "2026-02-10T16:45");
        assert_eq!(values["type"], "email");
        assert_eq!(values["description"], "");
    }

    #[test]
    fn payload_numbers_client_refs() {
        let mut values = FormValues::new();
        values.insert("client_id".into(), "4".into());
        values.insert("name".into(), "Jane".into());
        let body = form_payload::<Contact>(&values);
        assert_eq!(body["client_id"], 4);
        assert_eq!(body["name"], "Jane");
        assert_eq!(body["notes"], "");

        values.insert("client_id".into(), String::new());
        assert!(form_payload::<Contact>(&values)["client_id"].is_null());
    }

    #[test]
    fn payload_skips_blank_choices() {
        let mut values = FormValues::new();
        values.insert("name".into(), "Acme".into());
        values.insert("email".into(), "a@acme.com".into());
        let body = form_payload::<Client>(&values);
        assert!(body.get("status").is_none());
        assert_eq!(body["phone"], "");

        values.insert("status".into(), "lead".into());
        assert_eq!(form_payload::<Client>(&values)["status"], "lead");
    }

    #[test]
    fn stat_cards_show_each_count() {
        let stats = StatsResponse {
            total_clients: 4,
            pending_tasks: 2,
            ..StatsResponse::default()
        };
        let html = render_stat_cards(&stats);
        assert!(html.contains("id=\"total-clients\">4</span>"));
        assert!(html.contains("id=\"pending-tasks\">2</span>"));
        assert!(html.contains("id=\"completed-tasks\">0</span>"));
        assert_eq!(html.matches("card stat").count(), 6);
    }

    #[test]
    fn dashboard_lists_have_empty_states() {
        assert!(render_recent_activities(&[]).contains("No recent activities"));
        assert!(render_upcoming_tasks(&[]).contains("No upcoming tasks"));
    }
}
