//! Server-side HTML rendering of the lookup page.

use crate::lookup::GeolocationResult;
use crate::session::Session;

use std::fmt::Write;

const STYLE: &str = "\
body{background:#1a1b1e;color:#e5e7eb;font-family:sans-serif;margin:0;padding:2rem}\
main{max-width:72rem;margin:0 auto}\
h1{text-align:center}\
textarea{width:100%;min-height:200px;background:#1a1b1e;color:#e5e7eb;box-sizing:border-box}\
button{width:100%;padding:.5rem;background:#a855f7;color:#fff;border:0}\
.error{padding:1rem;color:#f87171;border:1px solid #7f1d1d;margin-top:1rem}\
.card{display:block;margin-top:1rem;padding:1rem;color:inherit;text-decoration:none;background:#3b2a52}\
.card.suspicious{background:#5a3a1f}\
.card.expanded{outline:2px solid #3b82f6}\
dl{display:grid;grid-template-columns:1fr 1fr;gap:.5rem}\
dt{color:#9ca3af}dd{margin:0}\
.warning{color:#fdba74}";

/// Escape text to be safely embedded into HTML elements and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn field(html: &mut String, name: &str, value: &str) {
    let _ = write!(
        html,
        "<div><dt>{name}</dt><dd>{}</dd></div>",
        escape_html(value)
    );
}

fn render_details(html: &mut String, result: &GeolocationResult) {
    html.push_str("<dl>");
    field(html, "Continent", &result.continent_name);
    field(html, "ZIP", &result.zip);
    field(html, "Connection Type", &result.connection_type);
    field(html, "ISP", &result.connection.isp);
    html.push_str("</dl>");

    let security = &result.security;
    let _ = write!(
        html,
        "<p>Security Information</p><ul>\
         <li>Proxy: {}</li><li>Crawler: {}</li><li>Tor: {}</li><li>Threat Level: {}</li>",
        yes_no(security.is_proxy),
        yes_no(security.is_crawler),
        yes_no(security.is_tor),
        escape_html(&security.threat_level),
    );
    if !security.threat_types.is_empty() {
        let _ = write!(
            html,
            "<li>Threat Types: {}</li>",
            escape_html(&security.threat_types.join(", "))
        );
    }
    html.push_str("</ul>");
}

fn render_card(html: &mut String, index: usize, result: &GeolocationResult, expanded: bool) {
    let suspicious = result.is_suspicious();
    let _ = write!(
        html,
        r#"<a class="card{}{}" href="/?expand={index}"><h3>{} {}</h3><dl>"#,
        if suspicious { " suspicious" } else { "" },
        if expanded { " expanded" } else { "" },
        escape_html(&result.ip),
        if expanded { "&#9650;" } else { "&#9660;" },
    );
    field(html, "Country", &result.country_name);
    field(html, "Region", &result.region_name);
    field(html, "City", &result.city);
    field(
        html,
        "Coordinates",
        &format!("{}, {}", result.latitude, result.longitude),
    );
    html.push_str("</dl>");
    if suspicious {
        html.push_str(r#"<p class="warning">&#9888; Suspicious IP detected</p>"#);
    }
    if expanded {
        render_details(html, result);
    }
    html.push_str("</a>");
}

pub fn render_page(session: &Session) -> String {
    let mut html = String::with_capacity(4096);
    let _ = write!(
        html,
        r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"><title>IP to Location</title><style>{STYLE}</style></head><body><main>
<h1>IP to Location</h1>
<h2>IP Geolocation Explorer</h2>
<p>Enter IP addresses to explore their locations. Check if an IP is suspicious and get access to a lot more details.</p>
<form method="post" action="/"><textarea name="ips" placeholder="Enter IP addresses (one per line)"></textarea><button type="submit"{}>{}</button></form>"#,
        if session.is_loading() { " disabled" } else { "" },
        if session.is_loading() {
            "Exploring..."
        } else {
            "Explore Geolocation"
        },
    );
    if let Some(error) = session.error() {
        let _ = write!(html, r#"<div class="error">{}</div>"#, escape_html(error));
    }
    if let Some(results) = session.results() {
        for (index, result) in results.iter().enumerate() {
            render_card(&mut html, index, result, session.is_expanded(index));
        }
    }
    html.push_str("</main></body></html>");
    html
}
