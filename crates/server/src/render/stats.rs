use std::{collections::BTreeMap, fmt::Write};

use db::{MonthSummary, StatsMonth};

use super::{Nav, escape, layout, query_string, severity_class};

fn month_href(month: StatsMonth) -> String {
    let year = month.year.to_string();
    let number = month.month.to_string();
    format!(
        "/stats{}",
        escape(&query_string(&[("year", &year), ("month", &number)]))
    )
}

fn month_link(month: Option<StatsMonth>, label: &str) -> String {
    match month {
        Some(month) => format!(
            "<a class=\"button secondary\" href=\"{}\">{label}</a>",
            month_href(month)
        ),
        None => format!("<span class=\"disabled\">{label}</span>"),
    }
}

/// Rows sorted by descending count, ties by name.
fn ranked(counts: &BTreeMap<String, i64>) -> Vec<(&str, i64)> {
    let mut rows: Vec<(&str, i64)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    rows
}

fn count_table(title: &str, column: &str, counts: &BTreeMap<String, i64>) -> String {
    let mut html = format!("<section class=\"card\">\n<h2>{title}</h2>\n");
    if counts.is_empty() {
        html.push_str("<p class=\"empty\">Nothing recorded this month.</p>\n</section>\n");
        return html;
    }
    let _ = writeln!(
        html,
        "<table>\n<thead><tr><th>{column}</th><th>Logs</th></tr></thead>\n<tbody>"
    );
    for (name, count) in ranked(counts) {
        let _ = writeln!(html, "<tr><td>{}</td><td>{count}</td></tr>", escape(name));
    }
    html.push_str("</tbody>\n</table>\n</section>\n");
    html
}

fn month_picker(month: StatsMonth) -> String {
    let mut html = String::from("<form class=\"filters\" method=\"get\" action=\"/stats\">\n");
    let _ = writeln!(
        html,
        "<div><label for=\"year\">Year</label>\n<input id=\"year\" name=\"year\" type=\"number\" value=\"{}\"></div>",
        month.year
    );
    html.push_str("<div><label for=\"month\">Month</label>\n<select id=\"month\" name=\"month\">\n");
    for number in 1..=12u32 {
        let name = StatsMonth::new(month.year, number)
            .ok()
            .and_then(|m| m.first_day())
            .map(|d| d.format("%B").to_string())
            .unwrap_or_else(|| number.to_string());
        let _ = writeln!(
            html,
            "<option value=\"{number}\"{}>{name}</option>",
            if number == month.month { " selected" } else { "" }
        );
    }
    html.push_str("</select></div>\n<div><button type=\"submit\">Show</button></div>\n</form>\n");
    html
}

pub fn stats_page(summary: &MonthSummary) -> String {
    let month = summary.month;
    let mut body = String::new();

    body.push_str("<section class=\"card\">\n");
    let _ = writeln!(body, "<h1>Statistics for {}</h1>", escape(&month.label()));
    let _ = writeln!(
        body,
        "<nav class=\"pagination\">\n{}\n{}\n</nav>",
        month_link(month.prev(), "← Previous month"),
        month_link(month.next(), "Next month →"),
    );
    body.push_str(&month_picker(month));
    body.push_str("</section>\n");

    body.push_str("<section class=\"card\">\n<div class=\"stat-grid\">\n");
    let _ = writeln!(
        body,
        "<div><div class=\"stat-value\">{}</div><div>Total logs</div></div>",
        summary.total
    );
    for (severity, count) in ranked(&summary.by_severity) {
        let _ = writeln!(
            body,
            "<div><div class=\"stat-value\">{count}</div><div><span class=\"severity {}\">{}</span></div></div>",
            severity_class(severity),
            escape(severity)
        );
    }
    body.push_str("</div>\n</section>\n");

    body.push_str(&daily_chart(summary));
    body.push_str(&count_table("By service", "Service", &summary.by_service));
    body.push_str(&count_table("By attribute", "Attribute key", &summary.by_attribute));

    layout("Statistics", Nav::Stats, &body)
}

fn daily_chart(summary: &MonthSummary) -> String {
    let peak = summary.daily.iter().map(|d| d.count).max().unwrap_or(0);
    let mut html = String::from("<section class=\"card\">\n<h2>Logs per day</h2>\n<div class=\"chart\">\n");
    for day in &summary.daily {
        let height = if peak > 0 { day.count * 100 / peak } else { 0 };
        let _ = writeln!(
            html,
            "<div class=\"bar\" style=\"height: {height}%\" title=\"Day {}: {} logs\"></div>",
            day.day, day.count
        );
    }
    html.push_str("</div>\n<div class=\"chart-labels\">\n");
    for day in &summary.daily {
        let _ = writeln!(html, "<span>{}</span>", day.day);
    }
    html.push_str("</div>\n</section>\n");
    html
}

#[cfg(test)]
mod tests {
    use db::models::log_entry::stats::zero_fill_daily;

    use super::*;

    fn summary(month: StatsMonth) -> MonthSummary {
        let daily = zero_fill_daily(month, &BTreeMap::from([(3, 4), (10, 2)]));
        MonthSummary {
            month,
            total: 6,
            by_severity: BTreeMap::from([("ERROR".into(), 2), ("INFO".into(), 4)]),
            daily,
            by_service: BTreeMap::from([("<api>".into(), 5), ("worker".into(), 1)]),
            by_attribute: BTreeMap::new(),
        }
    }

    #[test]
    fn test_renders_month_summary() {
        let html = stats_page(&summary(StatsMonth::new(2024, 2).unwrap()));

        assert!(html.contains("Statistics for February 2024"));
        assert!(html.contains("href=\"/stats?year=2024&amp;month=1\""));
        assert!(html.contains("href=\"/stats?year=2024&amp;month=3\""));
        assert!(html.contains("<div class=\"stat-value\">6</div><div>Total logs</div>"));
        assert!(html.contains("<span class=\"severity info\">INFO</span>"));
        assert_eq!(html.matches("class=\"bar\"").count(), 29);
        assert!(html.contains("height: 100%\" title=\"Day 3: 4 logs\""));
        assert!(html.contains("height: 50%\" title=\"Day 10: 2 logs\""));
        assert!(html.contains("<td>&lt;api&gt;</td><td>5</td>"));
        assert!(html.contains("Nothing recorded this month."));
        assert!(html.contains("<option value=\"2\" selected>February</option>"));
    }

    #[test]
    fn test_year_wraps_in_month_links() {
        let html = stats_page(&summary(StatsMonth::new(2023, 12).unwrap()));
        assert!(html.contains("href=\"/stats?year=2024&amp;month=1\""));
        assert!(html.contains("href=\"/stats?year=2023&amp;month=11\""));
    }

    #[test]
    fn test_range_edge_disables_link() {
        let html = stats_page(&summary(StatsMonth::new(2000, 1).unwrap()));
        assert!(html.contains("<span class=\"disabled\">← Previous month</span>"));
    }

    #[test]
    fn test_ranked_orders_by_count_then_name() {
        let counts = BTreeMap::from([("b".into(), 2), ("a".into(), 2), ("c".into(), 9)]);
        assert_eq!(ranked(&counts), vec![("c", 9), ("a", 2), ("b", 2)]);
    }
}
