//! Minimal server-rendered HTML for the five pages. No template engine;
//! each page is a small composed string. The login page embeds the
//! client-side bridge script (token storage + session establishment) and
//! the people page embeds the debounced filter; nothing else runs client-side.

use chrono::{Datelike, NaiveDate};
use serde_json::Value;

use crate::calendar::{CalendarCell, MonthRef, WEEKDAY_HEADERS};
use crate::security::AuthUser;

fn esc(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn layout(title: &str, user: Option<&AuthUser>, body: &str) -> String {
    let nav = match user {
        Some(u) => format!(
            "<nav><a href=\"/\">Início</a> <a href=\"/ministerios\">Ministérios</a> \
             <a href=\"/pessoas\">Pessoas</a> <a href=\"/eventos\">Eventos</a> \
             <span>{}</span> <a href=\"/logout\">Sair</a></nav>",
            esc(&u.username)
        ),
        None => String::new(),
    };
    format!(
        "<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{} — Parish</title>\n\
         <style>\n\
         .calendar{{display:grid;grid-template-columns:repeat(7,1fr);gap:2px}}\n\
         .calendar .day{{padding:4px;min-height:3em;border:1px solid #ddd}}\n\
         .calendar .header{{font-weight:bold;min-height:auto}}\n\
         .calendar .other-month{{color:#aaa;background:#f7f7f7}}\n\
         .calendar .has-event{{background:#e8f4e8}}\n\
         </style>\n</head>\n<body>\n{}\n{}\n</body>\n</html>\n",
        esc(title),
        nav,
        body
    )
}

/// Login page: the server-rendered form plus the client bridge. The
/// script logs in through the JSON proxy, stores the token under the
/// `apiToken` key and then establishes the server session; a failed
/// session call is logged and ignored; navigation proceeds regardless.
pub fn login_page(error: Option<&str>) -> String {
    let slot = match error {
        Some(msg) => format!("<p id=\"login-error\">{}</p>", esc(msg)),
        None => "<p id=\"login-error\" style=\"display:none\"></p>".to_string(),
    };
    let body = format!(
        "<h1>Entrar</h1>\n{}\n\
         <form id=\"login-form\" method=\"post\" action=\"/login\">\n\
         <input name=\"username\" placeholder=\"Usuário\" required>\n\
         <input name=\"password\" type=\"password\" placeholder=\"Senha\" required>\n\
         <button id=\"login-button\" type=\"submit\">Entrar</button>\n\
         </form>\n\
         <script>\n\
         const form = document.getElementById('login-form');\n\
         form.addEventListener('submit', async (e) => {{\n\
           e.preventDefault();\n\
           const username = form.username.value;\n\
           const password = form.password.value;\n\
           try {{\n\
             const res = await fetch('/api/auth/login', {{\n\
               method: 'POST',\n\
               headers: {{ 'Content-Type': 'application/json' }},\n\
               body: JSON.stringify({{ username, password }})\n\
             }});\n\
             if (!res.ok) {{\n\
               const body = await res.json().catch(() => null);\n\
               throw new Error((body && body.message) || 'Credenciais inválidas');\n\
             }}\n\
             const data = await res.json();\n\
             localStorage.setItem('apiToken', data.token);\n\
             try {{\n\
               await fetch('/session', {{\n\
                 method: 'POST',\n\
                 credentials: 'same-origin',\n\
                 headers: {{ 'Content-Type': 'application/json' }},\n\
                 body: JSON.stringify({{ token: data.token, user: data.user }})\n\
               }});\n\
             }} catch (err) {{\n\
               console.warn('sessão não estabelecida:', err);\n\
             }}\n\
             window.location = '/';\n\
           }} catch (err) {{\n\
             const el = document.getElementById('login-error');\n\
             if (el) {{ el.textContent = err.message; el.style.display = 'block'; }}\n\
             else {{ alert('Erro no login: ' + err.message); }}\n\
           }}\n\
         }});\n\
         </script>",
        slot
    );
    layout("Entrar", None, &body)
}

fn calendar_html(month: MonthRef, grid: &[CalendarCell]) -> String {
    let mut out = String::new();
    let prev = month.prev();
    let next = month.next();
    out.push_str(&format!(
        "<p><a href=\"/?year={}&month={}\">&laquo;</a> \
         <span id=\"calendar-month-label\">{}</span> \
         <a href=\"/?year={}&month={}\">&raquo;</a></p>\n",
        prev.year,
        prev.month,
        esc(&month.label()),
        next.year,
        next.month
    ));
    out.push_str("<div class=\"calendar\">\n");
    for h in WEEKDAY_HEADERS {
        out.push_str(&format!("<div class=\"day header\">{}</div>\n", h));
    }
    for cell in grid {
        let mut classes = String::from("day");
        if !cell.in_month {
            classes.push_str(" other-month");
        }
        if cell.has_event {
            classes.push_str(" has-event");
        }
        let title_attr = if cell.event_titles.is_empty() {
            String::new()
        } else {
            format!(" title=\"{}\"", esc(&cell.event_titles.join(", ")))
        };
        out.push_str(&format!(
            "<div class=\"{}\"{}><div class=\"date\">{}</div></div>\n",
            classes,
            title_attr,
            cell.date.day()
        ));
    }
    out.push_str("</div>\n");
    out
}

fn ministry_boxes(ministries: &[Value]) -> String {
    if ministries.is_empty() {
        return "<p>Nenhum ministério cadastrado.</p>".to_string();
    }
    let mut out = String::from("<ul>\n");
    for m in ministries {
        let name = m
            .get("name")
            .or_else(|| m.get("title"))
            .and_then(|v| v.as_str())
            .unwrap_or("(sem nome)");
        let desc = m.get("description").and_then(|v| v.as_str()).unwrap_or("");
        out.push_str(&format!("<li><strong>{}</strong> {}</li>\n", esc(name), esc(desc)));
    }
    out.push_str("</ul>\n");
    out
}

fn person_name(p: &Value) -> String {
    p.get("name")
        .or_else(|| p.get("fullName"))
        .or_else(|| p.get("username"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| p.get("id").map(|v| v.to_string()).unwrap_or_default())
}

fn people_lists(people: &[Value]) -> String {
    let is_leader = |p: &&Value| {
        p.get("role").and_then(|r| r.as_str()).map(|r| r.eq_ignore_ascii_case("leader"))
            == Some(true)
    };
    let leaders: Vec<&Value> = people.iter().filter(is_leader).collect();
    let members: Vec<&Value> = people.iter().filter(|p| !is_leader(p)).collect();
    let render = |title: &str, list: &[&Value], empty: &str| {
        if list.is_empty() {
            format!("<h3>{}</h3><p>{}</p>\n", title, empty)
        } else {
            let items: String = list
                .iter()
                .map(|p| format!("<li>{}</li>", esc(&person_name(p))))
                .collect();
            format!("<h3>{}</h3><ul>{}</ul>\n", title, items)
        }
    };
    format!(
        "{}{}",
        render("Membros", &members, "Nenhum membro cadastrado."),
        render("Líderes", &leaders, "Nenhum líder cadastrado.")
    )
}

pub fn home_page(
    user: &AuthUser,
    month: MonthRef,
    grid: &[CalendarCell],
    ministries: &[Value],
    people: &[Value],
) -> String {
    let body = format!(
        "<h1>Agenda</h1>\n{}\n<h2>Ministérios</h2>\n{}\n<h2>Pessoas</h2>\n{}",
        calendar_html(month, grid),
        ministry_boxes(ministries),
        people_lists(people)
    );
    layout("Agenda", Some(user), &body)
}

pub fn ministries_page(user: &AuthUser, ministries: &[Value]) -> String {
    let body = format!("<h1>Ministérios</h1>\n{}", ministry_boxes(ministries));
    layout("Ministérios", Some(user), &body)
}

/// People page shell: the list is populated client-side with the stored
/// API token, filtered with a fixed 250 ms debounce.
pub fn people_page() -> String {
    let body = "<h1>Pessoas</h1>\n\
         <input id=\"people-filter\" placeholder=\"Filtrar\">\n\
         <div id=\"people-list\"></div>\n\
         <script>\n\
         function debounce(fn, ms) {\n\
           let t;\n\
           return (...args) => { clearTimeout(t); t = setTimeout(() => fn(...args), ms); };\n\
         }\n\
         async function loadPeople() {\n\
           const token = localStorage.getItem('apiToken');\n\
           const headers = token ? { 'Authorization': 'Bearer ' + token } : {};\n\
           const res = await fetch('/api/people', { headers });\n\
           if (!res.ok) throw new Error('Não foi possível carregar pessoas.');\n\
           return await res.json();\n\
         }\n\
         async function renderPeople(filter = '') {\n\
           const el = document.getElementById('people-list');\n\
           let list = [];\n\
           try { list = await loadPeople(); } catch (e) { el.textContent = e.message; return; }\n\
           const q = filter.toLowerCase().trim();\n\
           el.innerHTML = '';\n\
           (list || []).filter(p =>\n\
             !q || (p.name || '').toLowerCase().includes(q) || (p.phone || '').includes(q)\n\
           ).forEach(p => {\n\
             const box = document.createElement('div');\n\
             box.textContent = p.name + ' ' + (p.phone || '') + ' ' + (p.role || '');\n\
             el.appendChild(box);\n\
           });\n\
         }\n\
         renderPeople();\n\
         const filter = document.getElementById('people-filter');\n\
         filter.addEventListener('input', debounce(() => renderPeople(filter.value), 250));\n\
         </script>"
        .to_string();
    layout("Pessoas", None, &body)
}

fn event_date_label(ev: &Value) -> String {
    let raw = ev.get("date").and_then(|v| v.as_str()).unwrap_or("");
    raw.get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn events_page(user: &AuthUser, events: &[Value], people: &[Value]) -> String {
    let mut rows = String::new();
    if events.is_empty() {
        rows.push_str("<tr><td colspan=\"4\">Nenhum evento cadastrado</td></tr>\n");
    }
    for ev in events {
        let title = ev
            .get("title")
            .or_else(|| ev.get("name"))
            .and_then(|v| v.as_str())
            .unwrap_or("");
        let ministry = ev
            .get("ministryName")
            .or_else(|| ev.get("ministry"))
            .or_else(|| ev.get("ministryId"))
            .and_then(|v| v.as_str())
            .unwrap_or("");
        let assigned: Vec<String> = ev
            .get("assignments")
            .and_then(|a| a.as_array())
            .map(|list| {
                list.iter()
                    .map(|a| {
                        let pid = a.get("personId").or_else(|| a.get("person")).cloned();
                        people
                            .iter()
                            .find(|p| pid.is_some() && p.get("id") == pid.as_ref())
                            .map(person_name)
                            .unwrap_or_else(|| {
                                pid.and_then(|v| v.as_str().map(|s| s.to_string()))
                                    .unwrap_or_else(|| "---".to_string())
                            })
                    })
                    .collect()
            })
            .unwrap_or_default();
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            esc(&event_date_label(ev)),
            esc(title),
            esc(ministry),
            esc(&assigned.join(", "))
        ));
    }
    let body = format!(
        "<h1>Eventos</h1>\n<table>\n\
         <tr><th>Data</th><th>Título</th><th>Ministério</th><th>Escalados</th></tr>\n\
         {}</table>",
        rows
    );
    layout("Eventos", Some(user), &body)
}
