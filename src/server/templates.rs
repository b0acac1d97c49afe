//! HTML templates for the web interface.
//!
//! Pages are static shells; data is fetched from the JSON API with the
//! token kept in `localStorage` after logging in.

use crate::utils::html_escape;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #f6f7f9; color: #222; }
header { background: #1f2937; color: #fff; padding: 0.75rem 1.5rem; display: flex; gap: 1.5rem; align-items: center; }
header a { color: #cbd5e1; text-decoration: none; }
header .logo { color: #fff; font-weight: 600; }
main { max-width: 960px; margin: 1.5rem auto; padding: 0 1rem; }
section { background: #fff; border: 1px solid #e5e7eb; border-radius: 6px; padding: 1rem; margin-bottom: 1rem; }
table { width: 100%; border-collapse: collapse; font-size: 0.9rem; }
th, td { text-align: left; padding: 0.4rem; border-bottom: 1px solid #e5e7eb; vertical-align: top; }
pre { white-space: pre-wrap; margin: 0; font-size: 0.8rem; }
.error { color: #b91c1c; }
.muted { color: #6b7280; }
"#;

/// Login form and token helpers shared by every page.
const AUTH_SCRIPT: &str = r#"
function token() { return localStorage.getItem('access_token'); }
function authHeaders() { return { 'Authorization': 'Bearer ' + token() }; }
function showStatus(text, isError) {
    const el = document.getElementById('status');
    el.textContent = text;
    el.className = isError ? 'error' : 'muted';
}
async function apiError(res) {
    try { return (await res.json()).detail; } catch (e) { return res.statusText; }
}
document.getElementById('login-form').addEventListener('submit', async (e) => {
    e.preventDefault();
    const form = new FormData(e.target);
    const res = await fetch('/api/auth/login', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({ username: form.get('username'), password: form.get('password') }),
    });
    if (!res.ok) { showStatus(await apiError(res), true); return; }
    localStorage.setItem('access_token', (await res.json()).access_token);
    showStatus('Logged in', false);
    if (typeof refresh === 'function') refresh();
});
function escapeHtml(s) {
    return String(s ?? '').replace(/[&<>"]/g, c => ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;' }[c]));
}
"#;

const DOCUMENTS_SCRIPT: &str = r#"
async function refresh() {
    if (!token()) return;
    const type = document.getElementById('type-filter').value;
    const res = await fetch('/api/documents' + (type ? '?document_type=' + type : ''), { headers: authHeaders() });
    if (!res.ok) { showStatus(await apiError(res), true); return; }
    const rows = (await res.json()).map(d => `<tr>
        <td>${d.id}</td><td>${escapeHtml(d.filename)}</td><td>${d.document_type}</td>
        <td>${escapeHtml(d.sentiment)}</td><td>${d.created_at}</td>
        <td><pre>${escapeHtml(JSON.stringify(d.extracted_data, null, 2))}</pre></td></tr>`);
    document.getElementById('documents').innerHTML = rows.join('');
}
document.getElementById('type-filter').addEventListener('change', refresh);
document.getElementById('analyze-form').addEventListener('submit', async (e) => {
    e.preventDefault();
    showStatus('Analyzing...', false);
    const res = await fetch('/api/documents/analyze', {
        method: 'POST', headers: authHeaders(), body: new FormData(e.target),
    });
    if (!res.ok) { showStatus(await apiError(res), true); return; }
    const body = await res.json();
    showStatus('Document ' + body.document_id + ' analyzed as ' + body.document_type, false);
    refresh();
});
refresh();
"#;

const HISTORY_SCRIPT: &str = r#"
function query() {
    const params = new URLSearchParams();
    for (const [key, value] of new FormData(document.getElementById('filter-form'))) {
        if (value) params.set(key, value);
    }
    return params;
}
async function refresh() {
    if (!token()) return;
    const res = await fetch('/api/history/events?' + query(), { headers: authHeaders() });
    if (!res.ok) { showStatus(await apiError(res), true); return; }
    const rows = (await res.json()).map(ev => `<tr>
        <td>${ev.id}</td><td>${ev.event_type}</td><td>${escapeHtml(ev.description)}</td>
        <td>${ev.user_id ?? ''}</td><td>${ev.created_at}</td>
        <td><pre>${escapeHtml(JSON.stringify(ev.metadata))}</pre></td></tr>`);
    document.getElementById('events').innerHTML = rows.join('');
}
document.getElementById('filter-form').addEventListener('submit', (e) => { e.preventDefault(); refresh(); });
async function exportEvents(format) {
    const params = query();
    params.set('format', format);
    const res = await fetch('/api/history/events/export?' + params, { headers: authHeaders() });
    if (!res.ok) { showStatus(await apiError(res), true); return; }
    const disposition = res.headers.get('Content-Disposition') || '';
    const match = disposition.match(/filename="([^"]+)"/);
    const link = document.createElement('a');
    link.href = URL.createObjectURL(await res.blob());
    link.download = match ? match[1] : 'events.' + format;
    link.click();
}
refresh();
"#;

/// Base HTML template.
pub fn base_template(app_name: &str, title: &str, content: &str, script: &str) -> String {
    let app_name = html_escape(app_name);
    let title = html_escape(title);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - {app_name}</title>
    <style>{style}</style>
</head>
<body>
    <header>
        <a href="/web/documents" class="logo">{app_name}</a>
        <a href="/web/documents">documents</a>
        <a href="/web/history">history</a>
    </header>
    <main>
        <h1>{title}</h1>
        <section>
            <form id="login-form">
                <input name="username" placeholder="username" required>
                <input name="password" type="password" placeholder="password" minlength="6" required>
                <button type="submit">Log in</button>
                <span id="status" class="muted"></span>
            </form>
        </section>
        {content}
    </main>
    <script>{auth_script}{script}</script>
</body>
</html>"#,
        title = title,
        app_name = app_name,
        style = STYLE,
        content = content,
        auth_script = AUTH_SCRIPT,
        script = script,
    )
}

/// Document upload and analysis results.
pub fn documents_page(app_name: &str) -> String {
    let content = r#"
        <section>
            <form id="analyze-form">
                <input type="file" name="file" accept=".pdf,.jpg,.jpeg,.png" required>
                <button type="submit">Analyze</button>
            </form>
        </section>
        <section>
            <label>Type
                <select id="type-filter">
                    <option value="">all</option>
                    <option value="invoice">invoice</option>
                    <option value="information">information</option>
                </select>
            </label>
            <table>
                <thead>
                    <tr><th>ID</th><th>File</th><th>Type</th><th>Sentiment</th><th>Created</th><th>Extracted data</th></tr>
                </thead>
                <tbody id="documents"></tbody>
            </table>
        </section>
    "#;

    base_template(app_name, "Documents", content, DOCUMENTS_SCRIPT)
}

/// Event history with filters and export.
pub fn history_page(app_name: &str) -> String {
    let options: String = crate::models::EventType::ALL
        .iter()
        .map(|t| format!(r#"<option value="{0}">{0}</option>"#, t.as_str()))
        .collect();

    let content = format!(
        r#"
        <section>
            <form id="filter-form">
                <select name="event_type"><option value="">any type</option>{}</select>
                <input name="description" placeholder="description contains">
                <input name="start_date" type="datetime-local" step="1">
                <input name="end_date" type="datetime-local" step="1">
                <button type="submit">Filter</button>
                <button type="button" onclick="exportEvents('xlsx')">Excel</button>
                <button type="button" onclick="exportEvents('csv')">CSV</button>
                <button type="button" onclick="exportEvents('json')">JSON</button>
            </form>
        </section>
        <section>
            <table>
                <thead>
                    <tr><th>ID</th><th>Type</th><th>Description</th><th>User</th><th>Time</th><th>Metadata</th></tr>
                </thead>
                <tbody id="events"></tbody>
            </table>
        </section>
    "#,
        options
    );

    base_template(app_name, "History", &content, HISTORY_SCRIPT)
}
