use {
    serde_json::{Map, Value},
    tracing::{debug, warn},
};

use crate::error::{Error, Result};

/// Markers around the initial-data document embedded in every page.
const DATA_PREFIX: &str = "var ytInitialData = ";
const DATA_SUFFIX: &str = ";</script>";

/// Fetch a page and return its embedded initial-data document.
///
/// `Ok(None)` means the page does not exist (404). Any other non-success
/// status is an error; the drivers must not commit anything based on it.
pub(crate) async fn fetch_initial_data(
    client: &reqwest::Client,
    base_url: &str,
    path: &str,
) -> Result<Option<Value>> {
    debug!(path, "fetching page");
    let response = client.get(format!("{base_url}{path}")).send().await?;
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(Error::Status {
            status: status.as_u16(),
            path: path.to_string(),
        });
    }
    let body = response.text().await?;
    Ok(Some(extract_initial_data(&body)))
}

/// Slice the initial-data JSON out of the page's script tag.
///
/// Pages without the marker or with an unparseable payload yield an empty
/// document; the search layer degrades from there.
pub fn extract_initial_data(body: &str) -> Value {
    let empty = || Value::Object(Map::new());

    let Some(start) = body.find(DATA_PREFIX) else {
        warn!("page carries no initial-data marker");
        return empty();
    };
    let rest = &body[start + DATA_PREFIX.len()..];
    let Some(end) = rest.find(DATA_SUFFIX) else {
        warn!("initial-data script tag is unterminated");
        return empty();
    };

    match serde_json::from_str(&rest[..end]) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(error = %e, "failed to parse initial data");
            empty()
        },
    }
}
