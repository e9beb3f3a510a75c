use crate::report::{BatchReport, RowFailure, ScoredEmail};
use crate::scorer::PhishingScorer;
use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

pub struct AppState {
    pub scorer: PhishingScorer,
    pub input: PathBuf,
    pub default_min_score: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScoreQuery {
    pub min_score: Option<String>,
}

impl ScoreQuery {
    /// Unparseable thresholds fall back to the default; negative ones mean "show everything".
    fn min_score(&self, default: u32) -> u32 {
        match self.min_score.as_deref().map(|v| v.trim().parse::<i64>()) {
            Some(Ok(value)) => value.clamp(0, u32::MAX as i64) as u32,
            _ => default,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/emails", get(emails))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn serve(state: AppState, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;

    log::info!(
        "Web view running on http://{} (input: {})",
        bind,
        state.input.display()
    );
    axum::serve(listener, router(Arc::new(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to start server")?;

    log::info!("Web view stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Received shutdown signal, stopping web view...");
}

/// Re-read and score the input on every request so edits show up on reload.
async fn load(state: &Arc<AppState>) -> Result<BatchReport, String> {
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || BatchReport::from_csv_file(&state.scorer, &state.input))
        .await
        .map_err(|e| format!("scoring task failed: {}", e))?
        .map_err(|e| e.to_string())
}

async fn index(State(state): State<Arc<AppState>>, Query(query): Query<ScoreQuery>) -> Html<String> {
    let min_score = query.min_score(state.default_min_score);
    let input = state.input.display().to_string();

    let page = match load(&state).await {
        Ok(report) => {
            let shown = report.at_least(min_score);
            log::info!(
                "GET / min_score={} loaded={} shown={}",
                min_score,
                report.loaded(),
                shown.len()
            );
            PageView {
                input: &input,
                min_score,
                loaded: report.loaded(),
                results: &shown,
                error: row_problems_message(&report.failures),
            }
            .render()
        }
        Err(error) => {
            log::error!("Failed to load {}: {}", input, error);
            PageView {
                input: &input,
                min_score,
                loaded: 0,
                results: &[],
                error: Some(error),
            }
            .render()
        }
    };

    Html(page)
}

#[derive(Debug, Serialize)]
struct EmailsResponse<'a> {
    input: String,
    min_score: u32,
    loaded: usize,
    shown: usize,
    emails: Vec<&'a ScoredEmail>,
    failures: &'a [RowFailure],
}

async fn emails(State(state): State<Arc<AppState>>, Query(query): Query<ScoreQuery>) -> Response {
    let min_score = query.min_score(state.default_min_score);

    match load(&state).await {
        Ok(report) => {
            let shown = report.at_least(min_score);
            Json(EmailsResponse {
                input: state.input.display().to_string(),
                min_score,
                loaded: report.loaded(),
                shown: shown.len(),
                emails: shown,
                failures: &report.failures,
            })
            .into_response()
        }
        Err(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": error })),
        )
            .into_response(),
    }
}

async fn health() -> &'static str {
    "ok"
}

fn row_problems_message(failures: &[RowFailure]) -> Option<String> {
    if failures.is_empty() {
        return None;
    }
    let details: Vec<String> = failures.iter().map(|f| f.to_string()).collect();
    Some(format!(
        "{} row(s) had read problems: {}",
        failures.len(),
        details.join("; ")
    ))
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

struct PageView<'a> {
    input: &'a str,
    min_score: u32,
    loaded: usize,
    results: &'a [&'a ScoredEmail],
    error: Option<String>,
}

impl PageView<'_> {
    fn render(&self) -> String {
        let error = self
            .error
            .as_deref()
            .map(|e| format!(r#"<div class="error"><b>Error:</b> {}</div>"#, escape_html(e)))
            .unwrap_or_default();

        let results = if self.results.is_empty() {
            r#"<p class="small">No results.</p>"#.to_string()
        } else {
            let rows: String = self.results.iter().map(|email| render_row(email)).collect();
            format!(
                r#"<table>
        <thead>
          <tr>
            <th style="width:60px;">ID</th>
            <th style="width:230px;">Sender</th>
            <th>Subject</th>
            <th style="width:90px;">Score</th>
            <th style="width:360px;">Reasons</th>
          </tr>
        </thead>
        <tbody>
{}        </tbody>
      </table>"#,
                rows
            )
        };

        format!(
            r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8" />
  <title>Phishing Email Detector</title>
  <style>{style}</style>
</head>
<body>
  <div class="container">
    <div class="header">
      <div>
        <h1>Phishing Email Detector</h1>
        <p class="muted">Scores emails for phishing indicators and shows the most suspicious items.</p>
      </div>
      <div class="badge">Rust + axum</div>
    </div>
    {error}
    <form method="get">
      <label>Min score:</label>
      <input type="number" name="min_score" value="{min_score}" min="0" />
      <button type="submit">Analyze</button>
    </form>
    <div class="meta">
      Input: <span class="small">{input}</span>
      &nbsp;|&nbsp; Loaded: {loaded}
      &nbsp;|&nbsp; Showing: {shown}
    </div>
    <div class="small">Tip: Increase min score to show only high-risk emails.</div>
    {results}
  </div>
</body>
</html>
"#,
            style = STYLE,
            error = error,
            min_score = self.min_score,
            input = escape_html(self.input),
            loaded = self.loaded,
            shown = self.results.len(),
            results = results,
        )
    }
}

fn render_row(email: &ScoredEmail) -> String {
    let reasons: String = if email.result.is_clean() {
        "<li>No indicators found</li>".to_string()
    } else {
        email
            .result
            .reasons
            .iter()
            .map(|r| format!("<li>{}</li>", escape_html(r)))
            .collect()
    };

    format!(
        r#"          <tr>
            <td>{}</td>
            <td class="sender">{}</td>
            <td class="subject">{}</td>
            <td class="score">{}</td>
            <td class="reasons"><ul>{}</ul></td>
          </tr>
"#,
        escape_html(&email.record.id),
        escape_html(&email.record.sender),
        escape_html(&email.record.subject),
        email.result.score,
        reasons
    )
}

const STYLE: &str = r#"
    body { font-family: Arial, sans-serif; max-width: 1100px; margin: 40px auto; padding: 0 16px; background: #f7f9fc; }
    .container { background: #fff; border: 1px solid #e6eaf2; border-radius: 12px; padding: 24px; box-shadow: 0 6px 18px rgba(0,0,0,0.06); }
    .header { display: flex; align-items: baseline; justify-content: space-between; gap: 16px; }
    .badge { background: #e8f0ff; color: #1d4ed8; padding: 6px 10px; border-radius: 999px; font-weight: 700; font-size: 12px; }
    h1 { margin: 0; font-size: 40px; color: #0f172a; }
    .muted { color: #475569; margin-top: 6px; }
    form { margin: 18px 0; display: flex; gap: 10px; align-items: center; flex-wrap: wrap; }
    label { color: #0f172a; font-weight: 700; }
    input[type="number"] { width: 120px; padding: 10px; border: 1px solid #cbd5e1; border-radius: 8px; }
    button { padding: 10px 14px; cursor: pointer; border: 0; border-radius: 10px; background: #2563eb; color: white; font-weight: 700; }
    .meta { color: #0f172a; font-weight: 700; margin: 10px 0 0; }
    .small { color: #64748b; font-size: 13px; margin-top: 6px; }
    table { width: 100%; border-collapse: collapse; margin-top: 14px; background: #fff; }
    th, td { border-bottom: 1px solid #e2e8f0; padding: 12px; vertical-align: top; }
    th { background: #f1f5f9; text-align: left; font-size: 14px; }
    td { font-size: 14px; }
    .score { font-weight: 800; }
    .sender, .subject { word-break: break-word; }
    .reasons ul { margin: 0; padding-left: 18px; }
    .reasons li { margin: 2px 0; color: #334155; }
    .error { background: #ffe8e8; padding: 10px; border: 1px solid #ffb3b3; border-radius: 10px; }
"#;
