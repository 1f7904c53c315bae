use std::fmt::Write;

use db::{LogEntry, LogFilter, LogPage, Pagination, models::log_entry::queries::DEFAULT_PAGE_LIMIT};

use super::{Nav, escape, layout, query_string, severity_class};

/// Everything the logs page shows.
#[derive(Debug)]
pub struct LogsView<'a> {
    pub page: &'a LogPage,
    pub pagination: Pagination,
    pub filter: &'a LogFilter,
    pub attribute_keys: &'a [String],
    pub services: &'a [String],
    /// Severity texts as stored, so every option matches the exact filter.
    pub severities: &'a [String],
    pub total_logs: i64,
}

pub fn logs_page(view: &LogsView<'_>) -> String {
    let mut body = String::new();
    body.push_str(&filter_form(view));
    body.push_str("<section class=\"card\">\n");

    let shown = view.page.entries.len();
    let _ = writeln!(
        body,
        "<h1>Logs</h1>\n<p>Showing {} of {} matching logs ({} stored)</p>",
        shown, view.page.total_matching, view.total_logs
    );

    if view.page.entries.is_empty() {
        body.push_str("<p class=\"empty\">No logs match these filters.</p>\n");
    } else {
        body.push_str(
            "<table>\n<thead><tr><th>Time (UTC)</th><th>Severity</th><th>Service</th><th>Message</th></tr></thead>\n<tbody>\n",
        );
        for entry in &view.page.entries {
            body.push_str(&log_row(entry));
        }
        body.push_str("</tbody>\n</table>\n");
    }

    body.push_str(&pagination_nav(view));
    body.push_str("</section>\n");

    layout("Logs", Nav::Logs, &body)
}

/// Query pairs that reproduce the current filter, for links.
fn filter_pairs<'a>(filter: &'a LogFilter, limit: &'a str) -> Vec<(&'static str, &'a str)> {
    let (attr_key, attr_value) = filter.attribute().unwrap_or(("", ""));
    vec![
        ("severity", filter.severity().unwrap_or("")),
        ("service", filter.service().unwrap_or("")),
        ("attr_key", attr_key),
        ("attr_value", attr_value),
        ("limit", limit),
    ]
}

fn select(name: &str, label: &str, any_label: &str, options: &[&str], selected: Option<&str>) -> String {
    let mut html = format!(
        "<div><label for=\"{name}\">{label}</label>\n<select id=\"{name}\" name=\"{name}\">\n<option value=\"\">{any_label}</option>\n"
    );
    let mut found = selected.is_none();
    for option in options {
        let is_selected = selected == Some(*option);
        found |= is_selected;
        let _ = writeln!(
            html,
            "<option value=\"{0}\"{1}>{0}</option>",
            escape(option),
            if is_selected { " selected" } else { "" }
        );
    }
    // Keep a value that came from the URL but is not among the known options.
    if let (false, Some(value)) = (found, selected) {
        let _ = writeln!(
            html,
            "<option value=\"{0}\" selected>{0}</option>",
            escape(value)
        );
    }
    html.push_str("</select></div>\n");
    html
}

fn filter_form(view: &LogsView<'_>) -> String {
    let severities: Vec<&str> = view.severities.iter().map(String::as_str).collect();
    let services: Vec<&str> = view.services.iter().map(String::as_str).collect();
    let keys: Vec<&str> = view.attribute_keys.iter().map(String::as_str).collect();

    let mut html = String::from("<section class=\"card\">\n<form class=\"filters\" method=\"get\" action=\"/\">\n");
    html.push_str(&select(
        "severity",
        "Severity",
        "All severities",
        &severities,
        view.filter.severity(),
    ));
    html.push_str(&select(
        "service",
        "Service",
        "All services",
        &services,
        view.filter.service(),
    ));
    html.push_str(&select(
        "attr_key",
        "Attribute",
        "Any attribute",
        &keys,
        view.filter.attr_key.as_deref().filter(|k| !k.is_empty()),
    ));
    let _ = writeln!(
        html,
        "<div><label for=\"attr_value\">Value contains</label>\n<input id=\"attr_value\" name=\"attr_value\" type=\"text\" value=\"{}\"></div>",
        escape(view.filter.attr_value.as_deref().unwrap_or(""))
    );
    if view.pagination.limit != DEFAULT_PAGE_LIMIT {
        let _ = writeln!(
            html,
            "<input type=\"hidden\" name=\"limit\" value=\"{}\">",
            view.pagination.limit
        );
    }
    html.push_str("<div><button type=\"submit\">Filter</button> <a class=\"button secondary\" href=\"/\">Reset</a></div>\n");
    html.push_str("</form>\n</section>\n");
    html
}

fn optional(value: &Option<String>) -> String {
    value
        .as_deref()
        .map(escape)
        .unwrap_or_else(|| "—".to_string())
}

fn log_row(entry: &LogEntry) -> String {
    let mut row = String::new();
    let _ = writeln!(
        row,
        "<tr>\n<td>{}</td>\n<td><span class=\"severity {}\">{}</span></td>\n<td>{}</td>",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        severity_class(&entry.severity_text),
        escape(&entry.severity_text),
        optional(&entry.service_name),
    );

    row.push_str("<td>\n<details>\n");
    let _ = writeln!(row, "<summary>{}</summary>", escape(&entry.body));
    let _ = writeln!(
        row,
        "<dl>\n<dt>id</dt><dd>{}</dd>\n<dt>severity number</dt><dd>{}</dd>",
        escape(&entry.id),
        entry.severity_number
    );
    let fields = [
        ("trace id", entry.trace_id.as_ref()),
        ("span id", entry.span_id.as_ref()),
        ("service version", entry.service_version.as_ref()),
        ("service instance", entry.service_instance_id.as_ref()),
        ("host", entry.host_name.as_ref()),
        ("scope", entry.scope_name.as_ref()),
        ("scope version", entry.scope_version.as_ref()),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            let _ = writeln!(row, "<dt>{label}</dt><dd>{}</dd>", escape(value));
        }
    }
    let _ = writeln!(
        row,
        "<dt>ingested</dt><dd>{}</dd>",
        entry.created_at.format("%Y-%m-%d %H:%M:%S%.3f")
    );
    for (key, value) in &entry.attributes {
        let _ = writeln!(
            row,
            "<dt>{}</dt><dd>{}</dd>",
            escape(key),
            escape(&value.to_string())
        );
    }
    row.push_str("</dl>\n</details>\n</td>\n</tr>\n");
    row
}

fn pagination_nav(view: &LogsView<'_>) -> String {
    let Pagination { page, limit } = view.pagination;
    let total_pages = view.pagination.total_pages(view.page.total_matching);
    let limit_text = if limit == DEFAULT_PAGE_LIMIT {
        String::new()
    } else {
        limit.to_string()
    };

    let link = |target: i64, label: &str, enabled: bool| {
        if !enabled {
            return format!("<span class=\"disabled\">{label}</span>");
        }
        let page_text = target.to_string();
        let mut pairs = filter_pairs(view.filter, &limit_text);
        pairs.push(("page", &page_text));
        format!(
            "<a class=\"button secondary\" href=\"/{}\">{label}</a>",
            escape(&query_string(&pairs))
        )
    };

    format!(
        "<nav class=\"pagination\">\n{}\n<span>Page {} of {}</span>\n{}\n</nav>\n",
        link(page - 1, "← Newer", page > 1),
        page,
        total_pages.max(1),
        link(page + 1, "Older →", page < total_pages),
    )
}
