use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response}
};

use super::AppState;

/// Public URL of the front-end script
pub const APP_JS_URL: &str = "/-/static-plugins/llm_sql_writer/app.js";

const APP_JS: &str = include_str!("../../static/app.js");

/// Scripts to inject into a page.
///
/// Only table pages (both database and table known) get the chat panel.
///
/// ```
/// use llm_sql_writer::server::{APP_JS_URL, extra_js_urls};
///
/// assert_eq!(extra_js_urls(Some("shop"), Some("items")), vec![APP_JS_URL]);
/// assert!(extra_js_urls(Some("shop"), None).is_empty());
/// ```
pub fn extra_js_urls(database: Option<&str>, table: Option<&str>) -> Vec<&'static str> {
    match (database, table) {
        (Some(db), Some(table)) if !db.is_empty() && !table.is_empty() => vec![APP_JS_URL],
        _ => Vec::new()
    }
}

pub async fn app_js_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        APP_JS
    )
}

/// Minimal table page: a SQL editor plus the injected scripts.
///
/// Submitting the form reloads the page with `?sql=` so the editor keeps
/// the generated query.
pub async fn table_page_handler(
    State(state): State<Arc<AppState>>,
    Path((db, table)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>
) -> Response {
    if !state.databases.contains(&db) {
        return (StatusCode::NOT_FOUND, format!("Unknown database '{}'", db)).into_response();
    }
    let sql = params
        .get("sql")
        .cloned()
        .unwrap_or_else(|| format!("select * from [{}] limit 101", table));
    Html(render_table_page(&db, &table, &sql)).into_response()
}

fn render_table_page(db: &str, table: &str, sql: &str) -> String {
    let scripts = extra_js_urls(Some(db), Some(table))
        .into_iter()
        .map(|url| format!("<script src=\"{}\" defer></script>", url))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{db}: {table}</title>\n\
         {scripts}\n\
         </head>\n\
         <body>\n\
         <h1>{table}</h1>\n\
         <form method=\"get\">\n\
         <textarea name=\"sql\" rows=\"8\" cols=\"80\">{sql}</textarea>\n\
         <p><input type=\"submit\" value=\"Run SQL\"></p>\n\
         </form>\n\
         </body>\n\
         </html>\n",
        db = escape_html(db),
        table = escape_html(table),
        sql = escape_html(sql),
        scripts = scripts
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c)
        }
    }
    out
}
