use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::models::{RawFindScenes, SceneCatalog};
use crate::config::StashConfig;
use crate::error::{Error, Result};

const FIND_ALL_SCENES: &str = r#"
query FindAllScenes {
  findScenes(
    filter: { per_page: -1 }
  ) {
    count
    scenes {
      id
      title
      stash_ids {
        stash_id
      }
      files {
        size
        basename
        path
        bit_rate
        height
        duration
        video_codec
        fingerprints {
          type
          value
        }
      }
    }
  }
}
"#;

/// Request timeout. Libraries with tens of thousands of scenes take a while.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<FindScenesData>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct FindScenesData {
    #[serde(rename = "findScenes")]
    find_scenes: Option<RawFindScenes>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(default)]
    message: String,
}

/// Blocking client for the Stash GraphQL endpoint.
#[derive(Clone)]
pub struct StashClient {
    endpoint: String,
    api_key: Option<String>,
    agent: ureq::Agent,
}

impl StashClient {
    pub fn new(config: &StashConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .build();

        Self {
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            agent,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch every scene in one request.
    ///
    /// An empty library is a normal result; only transport and query
    /// failures are errors.
    pub fn fetch_scenes(&self) -> Result<SceneCatalog> {
        info!("Fetching all scenes from {}", self.endpoint);

        let request = GraphQlRequest {
            query: FIND_ALL_SCENES,
            variables: serde_json::Map::new(),
        };

        let mut req = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json");

        if let Some(ref api_key) = self.api_key {
            req = req.set("ApiKey", api_key);
        }

        let response = match req.send_json(&request) {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                warn!("Stash responded with HTTP {}", code);
                let body = response.into_string().unwrap_or_default();
                return Err(status_error(&self.endpoint, code, &body));
            }
            Err(e) => {
                warn!("Stash request failed: {}", e);
                return Err(Error::UpstreamUnreachable {
                    endpoint: self.endpoint.clone(),
                    message: e.to_string(),
                });
            }
        };

        let body: serde_json::Value = response
            .into_json()
            .map_err(|e| Error::InvalidResponse(format!("body is not JSON: {}", e)))?;

        let catalog = parse_find_scenes(body)?;
        debug!(
            "Stash reported {} scenes, received {}",
            catalog.count,
            catalog.scenes.len()
        );
        Ok(catalog)
    }
}

/// Turn a `findScenes` response body into a catalog.
pub(crate) fn parse_find_scenes(body: serde_json::Value) -> Result<SceneCatalog> {
    let response: GraphQlResponse = serde_json::from_value(body)
        .map_err(|e| Error::InvalidResponse(e.to_string()))?;

    if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
        return Err(graphql_error(errors));
    }

    response
        .data
        .and_then(|d| d.find_scenes)
        .map(SceneCatalog::from)
        .ok_or_else(|| Error::InvalidResponse("missing data.findScenes".to_string()))
}

/// Map a non-2xx response. gqlgen answers malformed queries with 422 and an
/// `errors` body; anything else is treated as the server being unreachable.
fn status_error(endpoint: &str, code: u16, body: &str) -> Error {
    let errors = serde_json::from_str::<GraphQlResponse>(body)
        .ok()
        .and_then(|r| r.errors)
        .filter(|e| !e.is_empty());

    match errors {
        Some(errors) => graphql_error(errors),
        None => Error::UpstreamUnreachable {
            endpoint: endpoint.to_string(),
            message: format!("HTTP status {}", code),
        },
    }
}

fn graphql_error(errors: Vec<GraphQlError>) -> Error {
    let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
    warn!("Stash returned GraphQL errors: {:?}", messages);
    Error::UpstreamGraphQl(messages)
}
