//! Screen controllers: the list/modal/form lifecycle of one entity screen.
//!
//! A [`Controller`] owns everything its screen needs (loaded items, the
//! client lookup, which record is being edited, the modal and its form, and
//! pending flash messages). It is created when the screen opens and dropped
//! when it closes. Failures never propagate out: they are logged and turned
//! into a generic flash message, and the previous list stays rendered.

use crate::api::{ApiError, CrmApi};
use crate::models::{Client, Id, StatsResponse, Task, TaskStatus};
use crate::views::{
    self, load_failure_message, render_recent_activities, render_stat_cards, render_table,
    render_upcoming_tasks, EntityView, FormValues,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct Modal {
    pub open: bool,
    pub title: String,
    pub form: FormValues,
}

pub struct Controller<E: EntityView, A: CrmApi> {
    api: A,
    items: Vec<E>,
    clients: Vec<Client>,
    editing_id: Option<Id>,
    filter: Vec<(String, String)>,
    list_html: String,
    modal: Modal,
    flashes: Vec<Flash>,
}

fn decode<T: DeserializeOwned>(body: Option<Value>) -> Result<T, ApiError> {
    let body = body.ok_or_else(|| ApiError::Decode("empty response".to_string()))?;
    Ok(serde_json::from_value(body)?)
}

impl<E: EntityView, A: CrmApi> Controller<E, A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            items: Vec::new(),
            clients: Vec::new(),
            editing_id: None,
            filter: Vec::new(),
            list_html: String::new(),
            modal: Modal::default(),
            flashes: Vec::new(),
        }
    }

    pub fn items(&self) -> &[E] {
        &self.items
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn editing_id(&self) -> Option<Id> {
        self.editing_id
    }

    pub fn list_html(&self) -> &str {
        &self.list_html
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    /// Drains the messages shown since the last call.
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }

    /// Sets one filter control. A blank value removes it from the query.
    pub fn set_filter(&mut self, name: &str, value: &str) {
        self.filter.retain(|(key, _)| key != name);
        if !value.is_empty() {
            self.filter.push((name.to_string(), value.to_string()));
        }
    }

    /// Screen start-up: the client lookup first when rows reference clients.
    pub async fn init(&mut self) {
        if E::REFERENCES_CLIENTS {
            self.load_clients().await;
        }
        self.load().await;
    }

    pub async fn load_clients(&mut self) {
        match self.fetch::<Vec<Client>>(Client::ENDPOINT, &[]).await {
            Ok(clients) => self.clients = clients,
            Err(err) => error!("Failed to load clients: {err}"),
        }
    }

    pub async fn load(&mut self) {
        let filter = self.filter.clone();
        match self.fetch::<Vec<E>>(E::ENDPOINT, &filter).await {
            Ok(items) => {
                self.items = items;
                self.render();
            }
            Err(err) => {
                error!("Failed to load {}: {err}", E::PLURAL);
                self.list_html = load_failure_message::<E>();
            }
        }
    }

    pub fn render(&mut self) -> &str {
        self.list_html = render_table(&self.items, &self.clients);
        &self.list_html
    }

    pub fn open_create(&mut self) {
        self.editing_id = None;
        self.modal = Modal {
            open: true,
            title: format!("Add {}", E::LABEL),
            form: E::form_defaults(),
        };
    }

    /// Opens the edit form for a loaded record. Unknown ids are ignored.
    pub fn open_edit(&mut self, id: Id) {
        let Some(item) = self.items.iter().find(|item| item.id() == id) else {
            return;
        };
        let form = item.form_values();
        self.editing_id = Some(id);
        self.modal = Modal {
            open: true,
            title: format!("Edit {}", E::LABEL),
            form,
        };
    }

    pub fn close_modal(&mut self) {
        self.modal.open = false;
    }

    /// Creates or updates depending on `editing_id`, then reloads. Submitted
    /// values override what the modal was opened with. On failure the modal
    /// stays open with the merged values.
    pub async fn submit(&mut self, form: FormValues) {
        self.modal.form.extend(form);
        let payload = views::form_payload::<E>(&self.modal.form);

        let outcome = match self.editing_id {
            Some(id) => self
                .send(Method::PUT, &format!("{}/{id}", E::ENDPOINT), Some(&payload))
                .await
                .map(|_| "updated"),
            None => self
                .send(Method::POST, E::ENDPOINT, Some(&payload))
                .await
                .map(|_| "added"),
        };

        match outcome {
            Ok(verb) => {
                self.flash(FlashKind::Success, format!("{} {verb} successfully", E::LABEL));
                self.close_modal();
                self.load().await;
            }
            Err(err) => {
                error!("Failed to save {}: {err}", E::SINGULAR);
                self.flash(FlashKind::Error, format!("Failed to save {}", E::SINGULAR));
            }
        }
    }

    /// Deletes after `confirm` agrees to the prompt it is given.
    pub async fn remove(&mut self, id: Id, confirm: impl FnOnce(&str) -> bool) {
        let prompt = format!("Are you sure you want to delete this {}?", E::SINGULAR);
        if !confirm(&prompt) {
            return;
        }

        match self.send(Method::DELETE, &format!("{}/{id}", E::ENDPOINT), None).await {
            Ok(_) => {
                self.flash(FlashKind::Success, format!("{} deleted successfully", E::LABEL));
                self.load().await;
            }
            Err(err) => {
                error!("Failed to delete {}: {err}", E::SINGULAR);
                self.flash(FlashKind::Error, format!("Failed to delete {}", E::SINGULAR));
            }
        }
    }

    fn flash(&mut self, kind: FlashKind, message: String) {
        self.flashes.push(Flash { kind, message });
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ApiError> {
        decode(self.api.call(Method::GET, path, query, None).await?)
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Option<Value>, ApiError> {
        self.api.call(method, path, &[], body).await
    }
}

impl<A: CrmApi> Controller<Task, A> {
    pub async fn complete(&mut self, id: Id) {
        let body = json!({ "status": TaskStatus::Completed.as_str() });
        match self.send(Method::PUT, &format!("{}/{id}", Task::ENDPOINT), Some(&body)).await {
            Ok(_) => {
                self.flash(FlashKind::Success, "Task marked as completed".to_string());
                self.load().await;
            }
            Err(err) => {
                error!("Failed to complete task: {err}");
                self.flash(FlashKind::Error, "Failed to complete task".to_string());
            }
        }
    }
}

/// Dashboard counters and the two short lists from `/api/stats`.
pub struct Dashboard<A: CrmApi> {
    api: A,
    stats: Option<StatsResponse>,
}

impl<A: CrmApi> Dashboard<A> {
    pub fn new(api: A) -> Self {
        Self { api, stats: None }
    }

    pub fn stats(&self) -> Option<&StatsResponse> {
        self.stats.as_ref()
    }

    /// Keeps the previous numbers when the request fails.
    pub async fn load(&mut self) {
        let response = self.api.call(Method::GET, "/api/stats", &[], None).await;
        match response.and_then(decode::<StatsResponse>) {
            Ok(stats) => self.stats = Some(stats),
            Err(err) => error!("Failed to load stats: {err}"),
        }
    }

    /// Count cards; zeros until the first successful load.
    pub fn stat_cards_html(&self) -> String {
        match &self.stats {
            Some(stats) => render_stat_cards(stats),
            None => render_stat_cards(&StatsResponse::default()),
        }
    }

    pub fn recent_activities_html(&self) -> String {
        render_recent_activities(
            self.stats
                .as_ref()
                .map(|stats| stats.recent_activities.as_slice())
                .unwrap_or_default(),
        )
    }

    pub fn upcoming_tasks_html(&self) -> String {
        render_upcoming_tasks(
            self.stats
                .as_ref()
                .map(|stats| stats.upcoming_tasks.as_slice())
                .unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    type Call = (Method, String, Vec<(String, String)>, Option<Value>);

    #[derive(Default)]
    struct ScriptedApi {
        replies: Mutex<VecDeque<Result<Option<Value>, ApiError>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl ScriptedApi {
        fn reply(self, reply: Result<Option<Value>, ApiError>) -> Self {
            self.replies.lock().unwrap().push_back(reply);
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CrmApi for ScriptedApi {
        async fn call(
            &self,
            method: Method,
            path: &str,
            query: &[(String, String)],
            body: Option<&Value>,
        ) -> Result<Option<Value>, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push((method, path.to_string(), query.to_vec(), body.cloned()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ApiError::Network("no scripted reply".into())))
        }
    }

    fn acme() -> Value {
        json!({
            "id": 1, "name": "Acme", "email": "a@acme.com", "phone": null,
            "company": null, "address": null, "status": "active",
            "created_at": "2026-01-05 09:00"
        })
    }

    fn jane() -> Value {
        json!({
            "id": 7, "client_id": 1, "name": "Jane", "email": null, "phone": null,
            "position": null, "notes": null, "created_at": "2026-01-06 10:30"
        })
    }

    fn task(id: u64, status: &str) -> Value {
        json!({
            "id": id, "title": "Send quote", "description": null, "due_date": "2026-02-01",
            "status": status, "priority": "high", "created_at": "2026-01-06 10:30"
        })
    }

    #[tokio::test]
    async fn init_loads_clients_before_contacts() {
        let api = ScriptedApi::default()
            .reply(Ok(Some(json!([acme()]))))
            .reply(Ok(Some(json!([jane()]))));
        let mut screen: Controller<crate::models::Contact, _> = Controller::new(api);

        screen.init().await;

        let paths: Vec<_> = screen.api.calls().into_iter().map(|call| call.1).collect();
        assert_eq!(paths, vec!["/api/clients", "/api/contacts"]);
        assert!(screen.list_html().contains("<td>Jane</td>"));
        assert!(screen.list_html().contains("<td>Acme</td>"));
    }

    #[tokio::test]
    async fn failed_load_renders_placeholder_and_keeps_items() {
        let api = ScriptedApi::default()
            .reply(Ok(Some(json!([acme()]))))
            .reply(Err(ApiError::Status(500)));
        let mut screen: Controller<Client, _> = Controller::new(api);

        screen.load().await;
        assert_eq!(screen.items().len(), 1);
        screen.load().await;

        assert_eq!(screen.list_html(), "<p class=\"empty-message\">Failed to load clients</p>");
        assert_eq!(screen.items().len(), 1);
        assert!(screen.take_flashes().is_empty());
    }

    #[tokio::test]
    async fn filters_are_sent_and_blanks_dropped() {
        let api = ScriptedApi::default().reply(Ok(Some(json!([]))));
        let mut screen: Controller<Client, _> = Controller::new(api);
        screen.set_filter("search", "acme");
        screen.set_filter("status", "lead");
        screen.set_filter("status", "");

        screen.load().await;

        let calls = screen.api.calls();
        assert_eq!(calls[0].2, vec![("search".to_string(), "acme".to_string())]);
        assert_eq!(screen.list_html(), "<p class=\"empty-message\">No clients found</p>");
    }

    #[tokio::test]
    async fn open_edit_ignores_unknown_ids() {
        let api = ScriptedApi::default().reply(Ok(Some(json!([acme()]))));
        let mut screen: Controller<Client, _> = Controller::new(api);
        screen.load().await;

        screen.open_edit(99);
        assert!(!screen.modal().open);
        assert_eq!(screen.editing_id(), None);

        screen.open_edit(1);
        assert!(screen.modal().open);
        assert_eq!(screen.modal().title, "Edit Client");
        assert_eq!(screen.modal().form["email"], "a@acme.com");
        assert_eq!(screen.editing_id(), Some(1));

        screen.open_create();
        assert_eq!(screen.editing_id(), None);
        assert_eq!(screen.modal().title, "Add Client");
        assert_eq!(screen.modal().form["status"], "active");
    }

    #[tokio::test]
    async fn submit_posts_when_creating_and_puts_when_editing() {
        let api = ScriptedApi::default()
            .reply(Ok(Some(acme())))
            .reply(Ok(Some(json!([acme()]))))
            .reply(Ok(Some(acme())))
            .reply(Ok(Some(json!([acme()]))));
        let mut screen: Controller<Client, _> = Controller::new(api);

        screen.open_create();
        let mut form = FormValues::new();
        form.insert("name".into(), "Acme".into());
        form.insert("email".into(), "a@acme.com".into());
        screen.submit(form.clone()).await;
        assert!(!screen.modal().open);

        screen.open_edit(1);
        screen.submit(form).await;

        let calls = screen.api.calls();
        assert_eq!((calls[0].0.clone(), calls[0].1.as_str()), (Method::POST, "/api/clients"));
        let created = calls[0].3.as_ref().unwrap();
        assert_eq!(created["name"], "Acme");
        assert_eq!(created["status"], "active");
        assert_eq!(calls[2].3.as_ref().unwrap()["status"], "active");
        assert_eq!((calls[2].0.clone(), calls[2].1.as_str()), (Method::PUT, "/api/clients/1"));
        let messages: Vec<_> = screen.take_flashes().into_iter().map(|f| f.message).collect();
        assert_eq!(messages, vec!["Client added successfully", "Client updated successfully"]);
    }

    #[tokio::test]
    async fn failed_submit_keeps_modal_open() {
        let api = ScriptedApi::default().reply(Err(ApiError::Status(400)));
        let mut screen: Controller<Client, _> = Controller::new(api);
        screen.open_create();

        screen.submit(FormValues::new()).await;

        assert!(screen.modal().open);
        assert_eq!(
            screen.take_flashes(),
            vec![Flash { kind: FlashKind::Error, message: "Failed to save client".into() }]
        );
        assert_eq!(screen.api.calls().len(), 1);
    }

    #[tokio::test]
    async fn remove_asks_first() {
        let api = ScriptedApi::default()
            .reply(Ok(None))
            .reply(Ok(Some(json!([]))));
        let mut screen: Controller<Client, _> = Controller::new(api);

        let mut prompt = String::new();
        screen
            .remove(1, |question| {
                prompt = question.to_string();
                false
            })
            .await;
        assert_eq!(prompt, "Are you sure you want to delete this client?");
        assert!(screen.api.calls().is_empty());

        screen.remove(1, |_| true).await;
        let calls = screen.api.calls();
        assert_eq!((calls[0].0.clone(), calls[0].1.as_str()), (Method::DELETE, "/api/clients/1"));
        assert_eq!(screen.list_html(), "<p class=\"empty-message\">No clients found</p>");
        assert_eq!(screen.take_flashes()[0].message, "Client deleted successfully");
    }

    #[tokio::test]
    async fn remove_failure_is_reported() {
        let api = ScriptedApi::default().reply(Err(ApiError::NotFound));
        let mut screen: Controller<Task, _> = Controller::new(api);
        screen.remove(3, |_| true).await;
        assert_eq!(screen.take_flashes()[0].message, "Failed to delete task");
    }

    #[tokio::test]
    async fn complete_marks_task_done() {
        let api = ScriptedApi::default()
            .reply(Ok(Some(task(3, "completed"))))
            .reply(Ok(Some(json!([task(3, "completed")]))));
        let mut screen: Controller<Task, _> = Controller::new(api);

        screen.complete(3).await;

        let calls = screen.api.calls();
        assert_eq!(calls[0].1, "/api/tasks/3");
        assert_eq!(calls[0].3, Some(json!({ "status": "completed" })));
        assert!(!screen.list_html().contains("data-action=\"complete\""));
        assert_eq!(screen.take_flashes()[0].message, "Task marked as completed");
    }

    #[tokio::test]
    async fn dashboard_renders_loaded_stats() {
        let activity = json!({
            "id": 2, "client_id": 1, "type": "meeting", "subject": "Kickoff",
            "description": null, "date": "2026-01-07 15:00", "created_at": "2026-01-06 10:30"
        });
        let api = ScriptedApi::default().reply(Ok(Some(json!({
            "total_clients": 3, "active_clients": 2, "total_contacts": 5,
            "total_activities": 1, "pending_tasks": 1, "completed_tasks": 4,
            "recent_activities": [activity], "upcoming_tasks": [task(3, "pending")]
        }))));
        let mut dashboard = Dashboard::new(api);

        dashboard.load().await;

        assert_eq!(dashboard.stats().map(|stats| stats.completed_tasks), Some(4));
        let cards = dashboard.stat_cards_html();
        assert!(cards.contains("id=\"total-clients\">3</span>"));
        assert!(cards.contains("id=\"total-contacts\">5</span>"));
        assert!(dashboard.recent_activities_html().contains("<strong>Kickoff</strong>"));
        assert!(dashboard.recent_activities_html().contains("badge-meeting"));
        let upcoming = dashboard.upcoming_tasks_html();
        assert!(upcoming.contains("<strong>Send quote</strong>"));
        assert!(upcoming.contains("Due: Feb 1, 2026"));
    }

    #[tokio::test]
    async fn dashboard_keeps_empty_states_on_failure() {
        let mut dashboard = Dashboard::new(ScriptedApi::default());
        dashboard.load().await;
        assert!(dashboard.stats().is_none());
        assert!(dashboard.stat_cards_html().contains("id=\"pending-tasks\">0</span>"));
        assert!(dashboard.recent_activities_html().contains("No recent activities"));
        assert!(dashboard.upcoming_tasks_html().contains("No upcoming tasks"));
    }
}
