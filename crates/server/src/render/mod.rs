//! Server-side HTML rendering.
//!
//! Every renderer is a pure function from view data to a `String`. All
//! user-controlled text goes through [`escape`].

use std::fmt::Write;

use axum::http::StatusCode;

pub mod logs;
pub mod stats;

/// Which top-bar link is highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Logs,
    Stats,
    None,
}

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// `?k=v&...` from the non-empty pairs, percent-encoded; empty when none remain.
pub fn query_string(pairs: &[(&str, &str)]) -> String {
    let encoded: Vec<String> = pairs
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect();
    if encoded.is_empty() {
        String::new()
    } else {
        format!("?{}", encoded.join("&"))
    }
}

/// CSS modifier for a severity badge; unknown severities get the neutral style.
pub fn severity_class(severity_text: &str) -> &'static str {
    match severity_text.to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARN" | "WARNING" => "warn",
        "ERROR" => "error",
        "FATAL" => "fatal",
        _ => "",
    }
}

/// Wrap `body` (already-escaped HTML) in the page chrome.
pub fn layout(title: &str, nav: Nav, body: &str) -> String {
    let link = |href: &str, label: &str, item: Nav| {
        let class = if nav == item { " class=\"active\"" } else { "" };
        format!("<a href=\"{href}\"{class}>{label}</a>")
    };

    let mut page = String::with_capacity(body.len() + 1024);
    page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    page.push_str("<meta charset=\"utf-8\">\n");
    page.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(page, "<title>{} · loglens</title>", escape(title));
    page.push_str("<link rel=\"stylesheet\" href=\"/assets/loglens.css\">\n");
    page.push_str("</head>\n<body>\n<header class=\"topbar\">\n");
    page.push_str("<span class=\"brand\">loglens</span>\n");
    let _ = writeln!(page, "{}", link("/", "Logs", Nav::Logs));
    let _ = writeln!(page, "{}", link("/stats", "Statistics", Nav::Stats));
    page.push_str("</header>\n<main>\n");
    page.push_str(body);
    page.push_str("</main>\n</body>\n</html>\n");
    page
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let body = format!(
        "<section class=\"card\">\n<h1>{} {}</h1>\n<p>{}</p>\n<p><a class=\"button secondary\" href=\"/\">Back to logs</a></p>\n</section>\n",
        status.as_u16(),
        escape(status.canonical_reason().unwrap_or("Error")),
        escape(message)
    );
    layout("Error", Nav::None, &body)
}
