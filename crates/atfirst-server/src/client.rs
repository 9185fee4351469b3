//! XRPC and identity client.
//!
//! Records are handled untyped (`{uri, value}` plus `serde_json::Value`
//! payloads), so plain JSON over reqwest is all this needs.

use atfirst_renderer::RawRecord;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::FeedError;

/// `app.bsky.feed.getPosts` accepts at most this many URIs per call.
const GET_POSTS_MAX: usize = 25;

/// A resolved repository: its DID and the PDS that hosts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub did: String,
    pub pds: String,
}

#[derive(Debug, Clone)]
pub struct AtClient {
    http: Client,
    appview: String,
    plc: String,
}

#[derive(Deserialize)]
struct ResolvedHandle {
    did: String,
}

#[derive(Deserialize)]
struct DidDocument {
    #[serde(default)]
    service: Vec<DidService>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DidService {
    #[serde(default)]
    id: String,
    #[serde(default)]
    service_endpoint: Value,
}

#[derive(Deserialize)]
struct Described {
    #[serde(default)]
    collections: Vec<String>,
}

#[derive(Deserialize)]
struct Listed {
    #[serde(default)]
    records: Vec<Value>,
}

#[derive(Deserialize)]
struct Fetched {
    #[serde(default)]
    value: Value,
}

#[derive(Deserialize)]
struct Posts {
    #[serde(default)]
    posts: Vec<Value>,
}

fn base(url: &Url) -> String {
    url.as_str().trim_end_matches('/').to_string()
}

/// Where the DID document for `did` lives.
pub fn did_document_url(plc: &str, did: &str) -> Result<String, FeedError> {
    if did.starts_with("did:plc:") {
        return Ok(format!("{plc}/{did}"));
    }
    if let Some(rest) = did.strip_prefix("did:web:") {
        let mut parts = rest.split(':');
        let host = parts.next().unwrap_or_default().replace("%3A", ":");
        let path: Vec<&str> = parts.collect();
        if host.is_empty() {
            return Err(FeedError::DidDocument {
                did: did.to_string(),
                reason: "empty did:web host".into(),
            });
        }
        return Ok(if path.is_empty() {
            format!("https://{host}/.well-known/did.json")
        } else {
            format!("https://{host}/{}/did.json", path.join("/"))
        });
    }
    Err(FeedError::DidDocument {
        did: did.to_string(),
        reason: "unsupported DID method".into(),
    })
}

impl AtClient {
    pub fn new(appview: &Url, plc: &Url) -> Result<Self, FeedError> {
        let http = Client::builder()
            .user_agent(concat!("atfirst/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            appview: base(appview),
            plc: base(plc),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FeedError> {
        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%endpoint, status = status.as_u16(), "upstream error");
            return Err(FeedError::Upstream {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }

    /// Resolve a handle or DID to its DID and PDS endpoint.
    #[instrument(skip(self))]
    pub async fn resolve_identity(&self, actor: &str) -> Result<Identity, FeedError> {
        let did = if actor.starts_with("did:") {
            actor.to_string()
        } else {
            self.resolve_handle(actor).await?
        };
        let pds = self.resolve_pds(&did).await?;
        debug!(%did, %pds, "resolved identity");
        Ok(Identity { did, pds })
    }

    async fn resolve_handle(&self, handle: &str) -> Result<String, FeedError> {
        let url = format!("{}/xrpc/com.atproto.identity.resolveHandle", self.appview);
        self.get_json::<ResolvedHandle>(&url, "com.atproto.identity.resolveHandle", &[("handle", handle)])
            .await
            .map(|r| r.did)
            .map_err(|e| FeedError::Resolution {
                actor: handle.to_string(),
                reason: e.to_string(),
            })
    }

    async fn resolve_pds(&self, did: &str) -> Result<String, FeedError> {
        let url = did_document_url(&self.plc, did)?;
        let doc: DidDocument =
            self.get_json(&url, "DID document", &[])
                .await
                .map_err(|e| FeedError::DidDocument {
                    did: did.to_string(),
                    reason: e.to_string(),
                })?;

        doc.service
            .iter()
            .filter(|s| s.id.ends_with("#atproto_pds"))
            .find_map(|s| s.service_endpoint.as_str())
            .map(|endpoint| endpoint.trim_end_matches('/').to_string())
            .ok_or_else(|| FeedError::NoPds {
                did: did.to_string(),
            })
    }

    /// Collections present in the repository. Failures yield an empty list.
    pub async fn describe_repo(&self, identity: &Identity) -> Vec<String> {
        let url = format!("{}/xrpc/com.atproto.repo.describeRepo", identity.pds);
        match self
            .get_json::<Described>(&url, "com.atproto.repo.describeRepo", &[("repo", identity.did.as_str())])
            .await
        {
            Ok(described) => described.collections,
            Err(e) => {
                debug!(did = %identity.did, error = %e, "describeRepo failed");
                Vec::new()
            }
        }
    }

    /// One page of `com.atproto.repo.listRecords`.
    ///
    /// Entries without a string `uri` are dropped.
    #[instrument(skip(self, identity), fields(did = %identity.did))]
    pub async fn list_records(
        &self,
        identity: &Identity,
        collection: &str,
        limit: u32,
        reverse: bool,
    ) -> Result<Vec<RawRecord>, FeedError> {
        let url = format!("{}/xrpc/com.atproto.repo.listRecords", identity.pds);
        let limit = limit.to_string();
        let mut query = vec![
            ("repo", identity.did.as_str()),
            ("collection", collection),
            ("limit", limit.as_str()),
        ];
        if reverse {
            query.push(("reverse", "true"));
        }

        let listed: Listed = self
            .get_json(&url, "com.atproto.repo.listRecords", &query)
            .await?;
        let records: Vec<RawRecord> = listed
            .records
            .into_iter()
            .filter_map(|r| serde_json::from_value(r).ok())
            .collect();
        debug!(count = records.len(), "listed records");
        Ok(records)
    }

    /// Fetch a single record value; any failure yields `None`.
    pub async fn get_record(
        &self,
        pds: &str,
        repo: &str,
        collection: &str,
        rkey: &str,
    ) -> Option<Value> {
        let url = format!("{pds}/xrpc/com.atproto.repo.getRecord");
        let query = [("repo", repo), ("collection", collection), ("rkey", rkey)];
        match self
            .get_json::<Fetched>(&url, "com.atproto.repo.getRecord", &query)
            .await
        {
            Ok(fetched) => Some(fetched.value),
            Err(e) => {
                debug!(%repo, %collection, %rkey, error = %e, "getRecord failed");
                None
            }
        }
    }

    /// Hydrate post URIs into post views via the appview.
    ///
    /// Order follows the appview's response; URIs it cannot see are simply
    /// missing.
    pub async fn get_posts(&self, uris: &[String]) -> Result<Vec<Value>, FeedError> {
        let url = format!("{}/xrpc/app.bsky.feed.getPosts", self.appview);
        let mut posts = Vec::with_capacity(uris.len());
        for chunk in uris.chunks(GET_POSTS_MAX) {
            let query: Vec<(&str, &str)> = chunk.iter().map(|u| ("uris", u.as_str())).collect();
            let batch: Posts = self
                .get_json(&url, "app.bsky.feed.getPosts", &query)
                .await?;
            posts.extend(batch.posts);
        }
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AtClient {
        let url = Url::parse(&server.uri()).unwrap();
        AtClient::new(&url, &url).unwrap()
    }

    fn did_doc(pds: &str) -> Value {
        json!({
            "id": "did:plc:alice",
            "service": [
                {"id": "#atproto_labeler", "type": "AtprotoLabeler", "serviceEndpoint": "https://labeler.example"},
                {"id": "#atproto_pds", "type": "AtprotoPersonalDataServer", "serviceEndpoint": format!("{pds}/")}
            ]
        })
    }

    #[test]
    fn test_did_document_urls() {
        assert_eq!(
            did_document_url("https://plc.directory", "did:plc:abc").unwrap(),
            "https://plc.directory/did:plc:abc"
        );
        assert_eq!(
            did_document_url("https://plc.directory", "did:web:example.com").unwrap(),
            "https://example.com/.well-known/did.json"
        );
        assert_eq!(
            did_document_url("https://plc.directory", "did:web:localhost%3A8080:u:alice").unwrap(),
            "https://localhost:8080/u/alice/did.json"
        );
        assert!(matches!(
            did_document_url("https://plc.directory", "did:key:z6Mk"),
            Err(FeedError::DidDocument { .. })
        ));
    }

    #[tokio::test]
    async fn test_resolve_handle_and_pds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/xrpc/com.atproto.identity.resolveHandle"))
            .and(query_param("handle", "alice.test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"did": "did:plc:alice"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/did:plc:alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(did_doc("https://pds.example")))
            .mount(&server)
            .await;

        let identity = client_for(&server)
            .resolve_identity("alice.test")
            .await
            .unwrap();
        assert_eq!(
            identity,
            Identity {
                did: "did:plc:alice".into(),
                pds: "https://pds.example".into()
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_handle_is_resolution_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/xrpc/com.atproto.identity.resolveHandle"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "InvalidRequest"})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .resolve_identity("nobody.test")
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Resolution { ref actor, .. } if actor == "nobody.test"));
        assert!(err.to_string().starts_with("Could not resolve handle nobody.test"));
    }

    #[tokio::test]
    async fn test_did_without_pds_service() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/did:plc:nopds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "did:plc:nopds", "service": []})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .resolve_identity("did:plc:nopds")
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::NoPds { .. }));
    }

    #[tokio::test]
    async fn test_list_records_passes_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/xrpc/com.atproto.repo.listRecords"))
            .and(query_param("repo", "did:plc:alice"))
            .and(query_param("collection", "social.psky.feed.post"))
            .and(query_param("limit", "10"))
            .and(query_param("reverse", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [
                    {"uri": "at://did:plc:alice/social.psky.feed.post/1", "cid": "c1", "value": {"text": "one"}},
                    {"cid": "broken"},
                    {"uri": "at://did:plc:alice/social.psky.feed.post/2", "cid": "c2", "value": {"text": "two"}}
                ]
            })))
            .mount(&server)
            .await;

        let identity = Identity {
            did: "did:plc:alice".into(),
            pds: server.uri(),
        };
        let records = client_for(&server)
            .list_records(&identity, "social.psky.feed.post", 10, true)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].rkey(), "2");
    }

    #[tokio::test]
    async fn test_list_records_upstream_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/xrpc/com.atproto.repo.listRecords"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let identity = Identity {
            did: "did:plc:alice".into(),
            pds: server.uri(),
        };
        let err = client_for(&server)
            .list_records(&identity, "app.bsky.feed.post", 10, false)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Upstream { status: 502, .. }));
        assert_eq!(err.to_string(), "com.atproto.repo.listRecords returned 502");
    }

    #[tokio::test]
    async fn test_best_effort_calls_swallow_failures() {
        let server = MockServer::start().await;
        let client = client_for(&server);
        let identity = Identity {
            did: "did:plc:alice".into(),
            pds: server.uri(),
        };
        assert!(client.describe_repo(&identity).await.is_empty());
        assert!(
            client
                .get_record(&server.uri(), "did:plc:alice", "pub.leaflet.publication", "x")
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_get_posts_chunks_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/xrpc/app.bsky.feed.getPosts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "posts": [{"uri": "at://did:plc:alice/app.bsky.feed.post/x"}]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let uris: Vec<String> = (0..30)
            .map(|i| format!("at://did:plc:alice/app.bsky.feed.post/{i}"))
            .collect();
        let posts = client_for(&server).get_posts(&uris).await.unwrap();
        assert_eq!(posts.len(), 2);
    }
}
