use crate::{
    api::{page_window, render_window, ListQuery, PageMeta},
    cli::{
        actions::report_redirects,
        globals::{Connection, GlobalArgs},
    },
    client::ApiRequest,
};
use anyhow::{Context, Result};
use serde_json::Value;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub path: String,
    pub query: Option<ListQuery>,
}

impl Args {
    fn request(&self) -> ApiRequest {
        match &self.query {
            Some(query) => query.request(&self.path),
            None => ApiRequest::get(self.path.as_str()),
        }
    }
}

/// GETs a path through the resilient client and prints the body.
/// # Errors
/// Returns an error if the request fails or the body is not JSON.
pub async fn execute(args: Args) -> Result<()> {
    let Connection { client, navigator } = args.globals.connect()?;

    let response = client.send(args.request()).await;
    report_redirects(&navigator);
    let response = response.with_context(|| format!("GET {} failed", args.path))?;

    let body: Value = response.json().context("response is not JSON")?;
    println!("{}", serde_json::to_string_pretty(&body)?);

    if let Some(line) = pagination_line(&body, args.query.as_ref()) {
        println!("{line}");
    }

    Ok(())
}

fn pagination_line(body: &Value, query: Option<&ListQuery>) -> Option<String> {
    let meta = PageMeta::find(body)?;
    let count = meta.page_count()?;
    if count == 0 {
        return None;
    }
    let current = meta
        .page
        .or_else(|| query.map(|query| query.page))
        .unwrap_or(1);
    let window = page_window(current, count, 1);
    Some(format!(
        "page {current}/{count}: {}",
        render_window(&window, current)
    ))
}
