//! Local HTTP fixture shared by the integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tiny_http::{Header, Response, Server};

/// What the fixture answers for one request
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn json(value: serde_json::Value) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body: value.to_string().into_bytes(),
        }
    }

    pub fn bytes(content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type,
            body,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: b"error".to_vec(),
        }
    }
}

/// One request as the fixture saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl Recorded {
    /// First header named `name`, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A tiny_http server on an ephemeral port that records every request.
pub struct MockServer {
    base: String,
    server: Arc<Server>,
    requests: Arc<Mutex<Vec<Recorded>>>,
    worker: Option<JoinHandle<()>>,
}

impl MockServer {
    /// `handler` receives the server base URL and the request path with query.
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&str, &str) -> Reply + Send + 'static,
    {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let port = server.server_addr().to_ip().unwrap().port();
        let base = format!("http://127.0.0.1:{}", port);
        let requests = Arc::new(Mutex::new(Vec::new()));

        let worker = {
            let server = Arc::clone(&server);
            let requests = Arc::clone(&requests);
            let base = base.clone();
            std::thread::spawn(move || {
                for request in server.incoming_requests() {
                    let path = request.url().to_string();
                    let headers = request
                        .headers()
                        .iter()
                        .map(|h| (h.field.as_str().as_str().to_string(), h.value.as_str().to_string()))
                        .collect();
                    requests.lock().unwrap().push(Recorded {
                        path: path.clone(),
                        headers,
                    });
                    let reply = handler(&base, &path);
                    let header =
                        Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()).unwrap();
                    let resp = Response::from_data(reply.body)
                        .with_status_code(reply.status)
                        .with_header(header);
                    let _ = request.respond(resp);
                }
            })
        };

        Self {
            base,
            server,
            requests,
            worker: Some(worker),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Paths requested so far, in arrival order
    pub fn requests(&self) -> Vec<String> {
        self.recorded().into_iter().map(|r| r.path).collect()
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// Stop accepting connections and wait for the worker thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One API record in the shape the taxa endpoint returns.
pub fn taxon(common: Option<&str>, name: &str, rank: &str, photo: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "preferred_common_name": common,
        "rank": rank,
        "rank_level": 10,
        "iconic_taxon_name": "Aves",
        "default_photo": photo.map(|url| serde_json::json!({ "medium_url": url })),
    })
}

pub fn page(results: Vec<serde_json::Value>, total: u64) -> serde_json::Value {
    serde_json::json!({
        "total_results": total,
        "page": 1,
        "per_page": 5,
        "results": results,
    })
}

/// Explorer config pointed at the fixture with no request spacing.
pub fn config_for(server: &MockServer) -> taxa_explorer::ExplorerConfig {
    taxa_explorer::ExplorerConfig {
        api_base_url: server.url("/v1"),
        min_request_interval_ms: 0,
        timeout_ms: 5000,
        ..Default::default()
    }
}
