//! Server-side HTML for the dashboard page: controls, an SVG price chart,
//! the markdown summary, and the paginated table.

use std::fmt::Write;

use chrono::NaiveDateTime;

use crate::config::AppConfig;
use crate::data::{Asset, TIMESTAMP_FORMAT};

use super::response_types::{ChartPoint, PriceChart, SortColumn, SortOrder, TablePage, ViewState};

const CHART_WIDTH: f64 = 900.0;
const CHART_HEIGHT: f64 = 380.0;
const CHART_PAD: f64 = 56.0;

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;background:#121212;color:#e0e0e0;margin:0}\
header{background:#1e88e5;color:#fff;padding:14px 24px;font-size:20px}\
main{max-width:1000px;margin:0 auto;padding:8px}\
.card{background:#1e1e1e;border-radius:6px;margin:10px;padding:12px 16px}\
.card h3{margin:0 0 10px 0;font-size:15px;color:#90caf9}\
select,a.button{background:#2c2c2c;color:#e0e0e0;border:1px solid #555;padding:6px 10px;margin-right:10px}\
a.button{background:#2e7d32;text-decoration:none}\
table{border-collapse:collapse;width:100%;font-size:13px}\
th,td{border-bottom:1px solid #333;padding:4px 8px;text-align:right}\
th:first-child,td:first-child{text-align:left}\
th a{color:#90caf9;text-decoration:none}\
.pager{margin-top:8px}.pager a{color:#90caf9;margin:0 6px}";

/// Full dashboard page for `view`.
pub fn render_page(view: &ViewState, config: &AppConfig) -> String {
    let mut html = String::with_capacity(16 * 1024);
    html.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
    html.push_str("<title>CryptoSight Dashboard</title><style>");
    html.push_str(STYLE);
    html.push_str("</style></head><body><header>CryptoSight Dashboard</header><main>");

    card(&mut html, "Controls", &render_controls(view, config));
    let chart = view
        .chart
        .as_ref()
        .map_or_else(|| format!("<p>{}</p>", escape(&view.summary_markdown)), render_chart);
    card(&mut html, "Price Trend", &chart);
    card(&mut html, "Insights", &markdown_to_html(&view.summary_markdown));

    let _ = write!(
        html,
        "<details class=\"card\" open><summary><h3 style=\"display:inline\">Historical Data</h3>\
         </summary>{}</details>",
        render_table(view.asset, view.days, &view.table)
    );

    html.push_str("</main></body></html>");
    html
}

fn card(html: &mut String, title: &str, body: &str) {
    let _ = write!(html, "<section class=\"card\"><h3>{title}</h3>{body}</section>");
}

fn render_controls(view: &ViewState, config: &AppConfig) -> String {
    let mut out = String::from("<form method=\"get\" action=\"/\">");

    out.push_str("<label>Cryptocurrency <select name=\"asset\" onchange=\"this.form.submit()\">");
    for &asset in &config.assets {
        let selected = if asset == view.asset { " selected" } else { "" };
        let _ = write!(out, "<option value=\"{asset}\"{selected}>{asset}</option>");
    }
    out.push_str("</select></label>");

    out.push_str("<label>Duration (days) <select name=\"days\" onchange=\"this.form.submit()\">");
    for &days in &config.durations {
        let selected = if days == view.days { " selected" } else { "" };
        let _ = write!(out, "<option value=\"{days}\"{selected}>{days}</option>");
    }
    out.push_str("</select></label>");

    let _ = write!(
        out,
        "<a class=\"button\" href=\"/export.csv?asset={}&amp;days={}\" download=\"{}\">Download CSV</a>",
        view.asset,
        view.days,
        escape(&view.csv_filename)
    );
    out.push_str("<noscript><button type=\"submit\">Update</button></noscript></form>");
    out
}

/// Line chart of price against sample position, with min/max price and the
/// first/last timestamps as axis labels.
pub fn render_chart(chart: &PriceChart) -> String {
    let mut svg = format!(
        "<svg viewBox=\"0 0 {CHART_WIDTH} {CHART_HEIGHT}\" width=\"100%\" \
         xmlns=\"http://www.w3.org/2000/svg\" role=\"img\">\
         <text x=\"{}\" y=\"22\" fill=\"#e0e0e0\" text-anchor=\"middle\" font-size=\"16\">{}</text>",
        CHART_WIDTH / 2.0,
        escape(&chart.title)
    );

    let (Some(first), Some(last)) = (chart.points.first(), chart.points.last()) else {
        svg.push_str("</svg>");
        return svg;
    };

    let (min, max) = chart
        .points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.price), hi.max(p.price))
        });
    let span = if max > min { max - min } else { 1.0 };
    let plot_w = CHART_WIDTH - 2.0 * CHART_PAD;
    let plot_h = CHART_HEIGHT - 2.0 * CHART_PAD;
    let positions = x_positions(&chart.points);

    let coords: Vec<String> = chart
        .points
        .iter()
        .zip(&positions)
        .map(|(p, frac)| {
            let x = CHART_PAD + frac * plot_w;
            let y = CHART_PAD + plot_h - (p.price - min) / span * plot_h;
            format!("{x:.1},{y:.1}")
        })
        .collect();

    let bottom = CHART_HEIGHT - CHART_PAD;
    let right = CHART_WIDTH - CHART_PAD;
    let _ = write!(
        svg,
        "<line x1=\"{CHART_PAD}\" y1=\"{bottom}\" x2=\"{right}\" y2=\"{bottom}\" stroke=\"#555\"/>\
         <line x1=\"{CHART_PAD}\" y1=\"{CHART_PAD}\" x2=\"{CHART_PAD}\" y2=\"{bottom}\" stroke=\"#555\"/>\
         <polyline fill=\"none\" stroke=\"#42a5f5\" stroke-width=\"2\" points=\"{}\"/>\
         <text x=\"{}\" y=\"{}\" fill=\"#aaa\" font-size=\"11\" text-anchor=\"end\">{max:.2}</text>\
         <text x=\"{}\" y=\"{bottom}\" fill=\"#aaa\" font-size=\"11\" text-anchor=\"end\">{min:.2}</text>\
         <text x=\"{CHART_PAD}\" y=\"{}\" fill=\"#aaa\" font-size=\"11\">{}</text>\
         <text x=\"{right}\" y=\"{}\" fill=\"#aaa\" font-size=\"11\" text-anchor=\"end\">{}</text>\
         <text x=\"{}\" y=\"{}\" fill=\"#aaa\" font-size=\"12\" text-anchor=\"middle\">{}</text>\
         <text x=\"14\" y=\"{}\" fill=\"#aaa\" font-size=\"12\" text-anchor=\"middle\" \
         transform=\"rotate(-90 14 {})\">{}</text></svg>",
        coords.join(" "),
        CHART_PAD - 6.0,
        CHART_PAD + 4.0,
        CHART_PAD - 6.0,
        bottom + 16.0,
        escape(&first.timestamp),
        bottom + 16.0,
        escape(&last.timestamp),
        CHART_WIDTH / 2.0,
        CHART_HEIGHT - 12.0,
        chart.x_label,
        CHART_HEIGHT / 2.0,
        CHART_HEIGHT / 2.0,
        chart.y_label,
    );
    svg
}

/// Horizontal position of each point as a fraction of the plot width,
/// proportional to its timestamp. A zero time span puts every point at the
/// centre; unparseable timestamps fall back to even spacing.
fn x_positions(points: &[ChartPoint]) -> Vec<f64> {
    let times: Option<Vec<i64>> = points
        .iter()
        .map(|p| {
            NaiveDateTime::parse_from_str(&p.timestamp, TIMESTAMP_FORMAT)
                .ok()
                .map(|t| t.and_utc().timestamp())
        })
        .collect();

    match times.as_deref() {
        Some([first, .., last]) if last > first => {
            let span = (last - first) as f64;
            times
                .iter()
                .flatten()
                .map(|t| (t - first) as f64 / span)
                .collect()
        }
        Some(_) => vec![0.5; points.len()],
        None if points.len() > 1 => {
            let last = (points.len() - 1) as f64;
            (0..points.len()).map(|i| i as f64 / last).collect()
        }
        None => vec![0.5; points.len()],
    }
}

fn render_table(asset: Asset, days: u32, table: &TablePage) -> String {
    if table.total_rows == 0 {
        return "<p>No rows.</p>".to_string();
    }

    let link = |page: usize, sort: SortColumn, order: SortOrder| {
        format!(
            "/?asset={asset}&amp;days={days}&amp;page={page}&amp;sort={}&amp;order={}",
            sort.column(),
            order.as_str()
        )
    };

    let mut out = String::from("<table><thead><tr>");
    for col in SortColumn::ALL {
        let (order, marker) = if col == table.sort {
            let marker = match table.order {
                SortOrder::Asc => " ▲",
                SortOrder::Desc => " ▼",
            };
            (table.order.flip(), marker)
        } else {
            (SortOrder::Asc, "")
        };
        let _ = write!(
            out,
            "<th><a href=\"{}\">{}{marker}</a></th>",
            link(1, col, order),
            col.label()
        );
    }
    out.push_str("</tr></thead><tbody>");

    for row in &table.rows {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&row.timestamp),
            fmt_cell(row.price, 2),
            fmt_cell(row.market_cap, 0),
            fmt_cell(row.volume, 0),
        );
    }
    out.push_str("</tbody></table><div class=\"pager\">");

    if table.page > 1 {
        let _ = write!(
            out,
            "<a href=\"{}\">&laquo; Prev</a>",
            link(table.page - 1, table.sort, table.order)
        );
    }
    let _ = write!(
        out,
        "Page {} of {} ({} rows)",
        table.page, table.page_count, table.total_rows
    );
    if table.page < table.page_count {
        let _ = write!(
            out,
            "<a href=\"{}\">Next &raquo;</a>",
            link(table.page + 1, table.sort, table.order)
        );
    }
    out.push_str("</div>");
    out
}

fn fmt_cell(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(String::new, |v| format!("{v:.decimals$}"))
}

/// Minimal markdown for the summary panel: `##` headings, `**bold**` spans,
/// and hard line breaks (two trailing spaces).
pub fn markdown_to_html(md: &str) -> String {
    let mut out = String::new();
    let mut paragraph: Vec<String> = Vec::new();

    let flush = |paragraph: &mut Vec<String>, out: &mut String| {
        if !paragraph.is_empty() {
            let _ = write!(out, "<p>{}</p>", paragraph.join(""));
            paragraph.clear();
        }
    };

    for line in md.lines() {
        if let Some(heading) = line.strip_prefix("## ") {
            flush(&mut paragraph, &mut out);
            let _ = write!(out, "<h2>{}</h2>", escape(heading.trim()));
        } else if line.trim().is_empty() {
            flush(&mut paragraph, &mut out);
        } else {
            let hard_break = line.ends_with("  ");
            let mut html = bold_spans(&escape(line.trim_end()));
            if hard_break {
                html.push_str("<br>");
            }
            paragraph.push(html);
        }
    }
    flush(&mut paragraph, &mut out);
    out
}

fn bold_spans(text: &str) -> String {
    let mut out = String::new();
    for (i, part) in text.split("**").enumerate() {
        if i % 2 == 1 {
            let _ = write!(out, "<strong>{part}</strong>");
        } else {
            out.push_str(part);
        }
    }
    out
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
