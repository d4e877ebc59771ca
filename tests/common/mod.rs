use mcp_bridge::configuration::{default_settings, Settings};
use std::net::TcpListener;
use wiremock::MockServer;

pub struct TestApp {
    pub address: String,
    /// Stands in for the downstream executor
    pub downstream: MockServer,
}

impl TestApp {
    pub async fn post_rpc(&self, body: serde_json::Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(&self.address)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn downstream_bodies(&self) -> Vec<serde_json::Value> {
        self.downstream
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|req| serde_json::from_slice(&req.body).expect("downstream got non-JSON body"))
            .collect()
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Run inside `#[actix_web::test]`; the server needs an actix system.
pub async fn spawn_app_with(configure: impl FnOnce(&mut Settings)) -> TestApp {
    let downstream = MockServer::start().await;

    let mut settings =
        default_settings(&format!("{}/hook", downstream.uri())).expect("Failed to build settings");
    configure(&mut settings);

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}/", port);

    let server = mcp_bridge::startup::run(listener, settings).expect("Failed to bind address.");
    let _ = actix_web::rt::spawn(server);

    TestApp {
        address,
        downstream,
    }
}
