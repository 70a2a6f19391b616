use crate::format::escape_html;
use crate::models::{Client, StatsResponse};
use crate::views::{
    render_recent_activities, render_stat_cards, render_upcoming_tasks, EntityView, Field,
    FieldKind, FilterControl, FilterKind, FormValues,
};

const NAV: &[(&str, &str)] = &[
    ("/", "Dashboard"),
    ("/clients", "Clients"),
    ("/contacts", "Contacts"),
    ("/activities", "Activities"),
    ("/tasks", "Tasks"),
];

pub fn render_dashboard(stats: &StatsResponse) -> String {
    let body = DASHBOARD_HTML
        .replace("{{STATS}}", &render_stat_cards(stats))
        .replace("{{RECENT_ACTIVITIES}}", &render_recent_activities(&stats.recent_activities))
        .replace("{{UPCOMING_TASKS}}", &render_upcoming_tasks(&stats.upcoming_tasks));
    layout("Dashboard", "/", &body, "")
}

/// Full page for one entity screen. `table` is the already rendered list.
pub fn render_screen<E: EntityView>(table: &str, clients: &[Client]) -> String {
    let defaults = E::form_defaults();
    let fields: String = E::FIELDS
        .iter()
        .map(|field| render_field(field, clients, &defaults))
        .collect();
    let filters: String = E::FILTERS.iter().map(render_filter).collect();

    let body = SCREEN_HTML
        .replace("{{ENDPOINT}}", E::ENDPOINT)
        .replace("{{SCREEN}}", E::SCREEN)
        .replace("{{LABEL}}", E::LABEL)
        .replace("{{SINGULAR}}", E::SINGULAR)
        .replace("{{PLURAL}}", E::PLURAL)
        .replace("{{FILTERS}}", &filters)
        .replace("{{FIELDS}}", &fields)
        .replace("{{TABLE}}", table);
    layout(&title_case(E::PLURAL), E::SCREEN, &body, SCREEN_SCRIPT)
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn layout(title: &str, active: &str, body: &str, script: &str) -> String {
    let nav: String = NAV
        .iter()
        .map(|(href, label)| {
            let class = if *href == active { " class=\"active\"" } else { "" };
            format!("<a href=\"{href}\"{class}>{label}</a>")
        })
        .collect();
    LAYOUT_HTML
        .replace("{{TITLE}}", title)
        .replace("{{NAV}}", &nav)
        .replace("{{SCRIPT}}", script)
        .replace("{{BODY}}", body)
}

fn options(values: &[&str], selected: Option<&str>) -> String {
    values
        .iter()
        .map(|value| {
            let mark = if Some(*value) == selected { " selected" } else { "" };
            format!("<option value=\"{value}\"{mark}>{value}</option>")
        })
        .collect()
}

fn render_field(field: &Field, clients: &[Client], defaults: &FormValues) -> String {
    let required = if field.required { " required" } else { "" };
    let name = field.name;
    let control = match field.kind {
        FieldKind::Text => format!("<input type=\"text\" id=\"field-{name}\" name=\"{name}\"{required}>"),
        FieldKind::Email => format!("<input type=\"email\" id=\"field-{name}\" name=\"{name}\"{required}>"),
        FieldKind::Tel => format!("<input type=\"tel\" id=\"field-{name}\" name=\"{name}\"{required}>"),
        FieldKind::TextArea => {
            format!("<textarea id=\"field-{name}\" name=\"{name}\" rows=\"3\"{required}></textarea>")
        }
        FieldKind::Date => format!("<input type=\"date\" id=\"field-{name}\" name=\"{name}\"{required}>"),
        FieldKind::DateTime => format!(
            "<input type=\"datetime-local\" id=\"field-{name}\" name=\"{name}\" data-default-now{required}>"
        ),
        FieldKind::Choice(values) => format!(
            "<select id=\"field-{name}\" name=\"{name}\"{required}>{}</select>",
            options(values, defaults.get(name).map(String::as_str))
        ),
        FieldKind::ClientRef => {
            let choices: String = clients
                .iter()
                .map(|client| {
                    format!("<option value=\"{}\">{}</option>", client.id, escape_html(&client.name))
                })
                .collect();
            format!(
                "<select id=\"field-{name}\" name=\"{name}\" data-number{required}><option value=\"\">Select a client</option>{choices}</select>"
            )
        }
    };
    format!(
        "<div class=\"form-group\"><label for=\"field-{name}\">{}</label>{control}</div>",
        field.label
    )
}

fn render_filter(filter: &FilterControl) -> String {
    match filter.kind {
        FilterKind::Search => format!(
            "<input type=\"search\" data-filter=\"{}\" placeholder=\"{}\">",
            filter.name, filter.label
        ),
        FilterKind::Choice(values) => format!(
            "<select data-filter=\"{}\"><option value=\"\">{}</option>{}</select>",
            filter.name,
            filter.label,
            options(values, None)
        ),
    }
}

const LAYOUT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}} · CRM</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #f4f1ea;
      --ink: #2b2a28;
      --muted: #6f6a65;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --ok: #2d7a4b;
      --danger: #c63b2b;
      --card: rgba(255, 255, 255, 0.9);
      --shadow: 0 18px 40px rgba(47, 72, 88, 0.14);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, var(--bg-1), #ffe9d4 70%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
    }

    nav {
      display: flex;
      gap: 8px;
      padding: 16px 32px;
      background: var(--accent-2);
    }

    nav a {
      color: rgba(255, 255, 255, 0.78);
      text-decoration: none;
      padding: 8px 14px;
      border-radius: 999px;
      font-weight: 500;
    }

    nav a.active {
      background: white;
      color: var(--accent-2);
    }

    main {
      width: min(1100px, 100%);
      margin: 32px auto;
      padding: 0 18px 48px;
      display: grid;
      gap: 24px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      margin: 0;
    }

    .toolbar {
      display: flex;
      flex-wrap: wrap;
      gap: 12px;
      align-items: center;
      justify-content: space-between;
    }

    .filters {
      display: flex;
      gap: 10px;
    }

    .card {
      background: var(--card);
      border-radius: 20px;
      box-shadow: var(--shadow);
      padding: 20px;
      overflow-x: auto;
    }

    .stats {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
      gap: 16px;
    }

    .stat .label {
      display: block;
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
    }

    .stat .value {
      display: block;
      font-size: 1.9rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    .panels {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(320px, 1fr));
      gap: 16px;
    }

    .list-item {
      display: grid;
      grid-template-columns: 1fr auto auto;
      gap: 12px;
      padding: 10px 0;
      border-bottom: 1px solid rgba(47, 72, 88, 0.08);
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    th, td {
      text-align: left;
      padding: 10px 12px;
      border-bottom: 1px solid rgba(47, 72, 88, 0.08);
    }

    th {
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.08em;
      color: var(--muted);
    }

    .badge {
      display: inline-block;
      padding: 3px 10px;
      border-radius: 999px;
      font-size: 0.8rem;
      font-weight: 600;
      background: rgba(47, 72, 88, 0.1);
      color: var(--accent-2);
    }

    .badge-active, .badge-completed, .badge-low { background: #dff3e6; color: var(--ok); }
    .badge-inactive { background: #ececec; color: #6b645d; }
    .badge-lead, .badge-medium, .badge-pending { background: #fff1d6; color: #a36a00; }
    .badge-high { background: #fde2dd; color: var(--danger); }
    .badge-call { background: #e1ecf7; color: #2a5d8f; }
    .badge-email { background: #efe4f7; color: #6b3a8f; }
    .badge-meeting { background: #ffe6dc; color: #b04a24; }
    .badge-note { background: #ececec; color: #55504a; }

    .btn, button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 10px 18px;
      font: inherit;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent);
      color: white;
    }

    .action-btn {
      padding: 6px 12px;
      font-size: 0.85rem;
      margin-right: 4px;
    }

    .btn-primary { background: var(--accent-2); }
    .btn-success { background: var(--ok); }
    .btn-danger { background: var(--danger); }
    .btn-secondary { background: #d8d3cc; color: var(--ink); }

    input, select, textarea {
      font: inherit;
      padding: 9px 12px;
      border-radius: 12px;
      border: 1px solid rgba(47, 72, 88, 0.2);
      background: white;
      width: 100%;
    }

    .filters input, .filters select {
      width: auto;
    }

    .empty-message {
      color: var(--muted);
      text-align: center;
      padding: 24px 0;
      margin: 0;
    }

    .modal {
      display: none;
      position: fixed;
      inset: 0;
      background: rgba(43, 42, 40, 0.45);
      padding: 48px 18px;
      overflow-y: auto;
    }

    .modal-content {
      width: min(520px, 100%);
      margin: 0 auto;
      background: white;
      border-radius: 20px;
      padding: 24px;
      display: grid;
      gap: 14px;
    }

    .form-group {
      display: grid;
      gap: 6px;
    }

    .form-actions {
      display: flex;
      justify-content: flex-end;
      gap: 10px;
    }

    .flash-message {
      position: fixed;
      right: 24px;
      bottom: 24px;
      padding: 12px 18px;
      border-radius: 14px;
      color: white;
      background: var(--ok);
      box-shadow: var(--shadow);
    }

    .flash-message.error {
      background: var(--danger);
    }
  </style>
</head>
<body>
  <nav>{{NAV}}</nav>
  {{BODY}}
  <script>{{SCRIPT}}</script>
</body>
</html>
"#;

const DASHBOARD_HTML: &str = r#"<main>
    <h1>Dashboard</h1>
    <section class="stats">{{STATS}}</section>
    <section class="panels">
      <div class="card">
        <h2>Recent activities</h2>
        <div id="recent-activities">{{RECENT_ACTIVITIES}}</div>
      </div>
      <div class="card">
        <h2>Upcoming tasks</h2>
        <div id="upcoming-tasks">{{UPCOMING_TASKS}}</div>
      </div>
    </section>
  </main>"#;

const SCREEN_HTML: &str = r#"<main id="screen" data-endpoint="{{ENDPOINT}}" data-page="{{SCREEN}}" data-label="{{LABEL}}" data-singular="{{SINGULAR}}" data-plural="{{PLURAL}}">
    <div class="toolbar">
      <h1>{{LABEL}} list</h1>
      <div class="filters">{{FILTERS}}</div>
      <button type="button" id="add-btn">Add {{LABEL}}</button>
    </div>
    <section class="card" id="list">{{TABLE}}</section>
  </main>
  <div class="modal" id="modal">
    <form class="modal-content" id="entity-form">
      <h2 id="modal-title">Add {{LABEL}}</h2>
      {{FIELDS}}
      <div class="form-actions">
        <button type="button" class="btn-secondary" data-close>Cancel</button>
        <button type="submit" class="btn-primary">Save</button>
      </div>
    </form>
  </div>"#;

const SCREEN_SCRIPT: &str = r#"
    const screen = document.getElementById('screen');
    const { endpoint, page, label, singular, plural } = screen.dataset;
    const list = document.getElementById('list');
    const modal = document.getElementById('modal');
    const modalTitle = document.getElementById('modal-title');
    const form = document.getElementById('entity-form');
    const filters = Array.from(document.querySelectorAll('[data-filter]'));
    let editingId = null;

    const showMessage = (message, type = 'success') => {
      const div = document.createElement('div');
      div.className = `flash-message ${type}`;
      div.textContent = message;
      document.body.appendChild(div);
      setTimeout(() => div.remove(), 3000);
    };

    const apiCall = async (url, options = {}) => {
      const res = await fetch(url, {
        ...options,
        headers: { 'Content-Type': 'application/json' }
      });
      if (!res.ok) {
        throw new Error(`HTTP error! status: ${res.status}`);
      }
      if (res.status === 204) {
        return null;
      }
      return res.json();
    };

    const filterQuery = () => {
      const params = new URLSearchParams();
      filters.forEach((el) => {
        if (el.value) params.append(el.dataset.filter, el.value);
      });
      const query = params.toString();
      return query ? `?${query}` : '';
    };

    const load = async () => {
      try {
        const res = await fetch(`${page}/table${filterQuery()}`);
        if (!res.ok) {
          throw new Error(`HTTP error! status: ${res.status}`);
        }
        list.innerHTML = await res.text();
      } catch (err) {
        console.error(`Failed to load ${plural}:`, err);
        list.innerHTML = `<p class="empty-message">Failed to load ${plural}</p>`;
      }
    };

    const localNow = () => {
      const now = new Date();
      now.setMinutes(now.getMinutes() - now.getTimezoneOffset());
      return now.toISOString().slice(0, 16);
    };

    const openModal = () => {
      modal.style.display = 'block';
    };

    const closeModal = () => {
      modal.style.display = 'none';
    };

    const openCreate = () => {
      editingId = null;
      modalTitle.textContent = `Add ${label}`;
      form.reset();
      form.querySelectorAll('[data-default-now]').forEach((el) => {
        el.value = localNow();
      });
      openModal();
    };

    const openEdit = async (id) => {
      const res = await fetch(`${page}/${id}/form`);
      if (!res.ok) return;
      const values = await res.json();
      editingId = id;
      modalTitle.textContent = `Edit ${label}`;
      Object.entries(values).forEach(([name, value]) => {
        if (form.elements[name]) form.elements[name].value = value;
      });
      openModal();
    };

    const collect = () => {
      const data = {};
      Array.from(form.elements).forEach((el) => {
        if (!el.name) return;
        if (el.dataset.number !== undefined) {
          data[el.name] = el.value ? parseInt(el.value, 10) : null;
        } else {
          data[el.name] = el.value;
        }
      });
      return data;
    };

    const submit = async (event) => {
      event.preventDefault();
      const body = JSON.stringify(collect());
      try {
        if (editingId) {
          await apiCall(`${endpoint}/${editingId}`, { method: 'PUT', body });
          showMessage(`${label} updated successfully`);
        } else {
          await apiCall(endpoint, { method: 'POST', body });
          showMessage(`${label} added successfully`);
        }
        closeModal();
        load();
      } catch (err) {
        console.error(`Failed to save ${singular}:`, err);
        showMessage(`Failed to save ${singular}`, 'error');
      }
    };

    const remove = async (id) => {
      if (!confirm(`Are you sure you want to delete this ${singular}?`)) return;
      try {
        await apiCall(`${endpoint}/${id}`, { method: 'DELETE' });
        showMessage(`${label} deleted successfully`);
        load();
      } catch (err) {
        console.error(`Failed to delete ${singular}:`, err);
        showMessage(`Failed to delete ${singular}`, 'error');
      }
    };

    const complete = async (id) => {
      try {
        await apiCall(`${endpoint}/${id}`, {
          method: 'PUT',
          body: JSON.stringify({ status: 'completed' })
        });
        showMessage('Task marked as completed');
        load();
      } catch (err) {
        console.error('Failed to complete task:', err);
        showMessage('Failed to complete task', 'error');
      }
    };

    list.addEventListener('click', (event) => {
      const button = event.target.closest('[data-action]');
      if (!button) return;
      const id = Number(button.dataset.id);
      if (button.dataset.action === 'edit') openEdit(id);
      if (button.dataset.action === 'delete') remove(id);
      if (button.dataset.action === 'complete') complete(id);
    });

    filters.forEach((el) => {
      el.addEventListener(el.type === 'search' ? 'input' : 'change', load);
    });

    document.getElementById('add-btn').addEventListener('click', openCreate);
    form.querySelectorAll('[data-close]').forEach((el) => el.addEventListener('click', closeModal));
    form.addEventListener('submit', submit);
    window.addEventListener('click', (event) => {
      if (event.target === modal) closeModal();
    });
"#;
