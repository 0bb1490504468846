use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::{http::StatusCode, web, App, HttpRequest, HttpResponse, HttpServer};
use chrono::{DateTime, Utc};
use url::Url;

use crate::config::{Config, ConfigBuilder};

pub const ONE_PREDICTION: &str = r#"{"bustime-response":{"prd":[{"dstp":500,"rtdd":"A","rtdir":"Northbound","des":"Downtown","prdctdn":"3"}]}}"#;

pub fn init() {
    env_logger::builder().is_test(true).try_init().ok();
}

pub fn config(endpoint: Url, output_dir: &Path) -> Config {
    ConfigBuilder::default()
        .api_key("test-key")
        .endpoint(endpoint)
        .output_dir(output_dir)
        .align_to_minute(false)
        .request_timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

struct MockState {
    status: Mutex<u16>,
    chunked: Mutex<bool>,
    body: Mutex<String>,
    queries: Mutex<Vec<String>>,
    invocations: Mutex<Vec<DateTime<Utc>>>,
}

/// Stand-in for the BusTime API, answering every request with a canned response
pub struct MockUpstream {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockUpstream {
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}/bustime/api/v3/getpredictions", self.addr)).unwrap()
    }

    pub fn set_status(&self, status: u16) {
        *self.state.status.lock().unwrap() = status;
    }

    pub fn set_body(&self, body: impl Into<String>) {
        *self.state.body.lock().unwrap() = body.into();
    }

    /// Streams the body in small chunks without a `Content-Length`
    pub fn set_chunked(&self, chunked: bool) {
        *self.state.chunked.lock().unwrap() = chunked;
    }

    pub fn queries(&self) -> Vec<String> {
        self.state.queries.lock().unwrap().clone()
    }

    pub fn invocations(&self) -> Vec<DateTime<Utc>> {
        self.state.invocations.lock().unwrap().clone()
    }
}

async fn respond(req: HttpRequest, state: web::Data<MockState>) -> HttpResponse {
    state.invocations.lock().unwrap().push(Utc::now());
    state.queries.lock().unwrap().push(req.query_string().to_string());

    let status = StatusCode::from_u16(*state.status.lock().unwrap()).unwrap();
    let body = state.body.lock().unwrap().clone();
    let mut response = HttpResponse::build(status);
    response.content_type("application/json");

    if *state.chunked.lock().unwrap() {
        let chunks: Vec<Result<web::Bytes, std::io::Error>> = body
            .into_bytes()
            .chunks(256)
            .map(|chunk| Ok(web::Bytes::copy_from_slice(chunk)))
            .collect();
        response.streaming(futures_util::stream::iter(chunks))
    } else {
        response.body(body)
    }
}

/// Must be called from within an actix system, e.g. an `#[actix_web::test]`
pub async fn mock_upstream(status: u16, body: impl Into<String>) -> MockUpstream {
    let state = Arc::new(MockState {
        status: Mutex::new(status),
        chunked: Mutex::new(false),
        body: Mutex::new(body.into()),
        queries: Mutex::new(vec![]),
        invocations: Mutex::new(vec![]),
    });

    let data = web::Data::from(state.clone());
    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .default_service(web::to(respond))
    })
    .workers(1)
    .disable_signals()
    .bind(("127.0.0.1", 0))
    .unwrap();

    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());

    MockUpstream { addr, state }
}
