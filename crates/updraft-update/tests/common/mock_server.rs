//! Mock server helpers for feed and asset endpoints

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::constants::*;

/// Serve `body` as the release feed at [`FEED_PATH`]
pub async fn mock_feed(server: &MockServer, body: String) {
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .and(header("accept", "application/vnd.github.v3+json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Make the feed endpoint fail with `status`
pub async fn mock_feed_status(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Serve `content` at `/download/{name}`
pub async fn mock_asset(server: &MockServer, name: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/download/{}", name)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(server)
        .await;
}

/// Feed URL on the mock server
pub fn feed_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), FEED_PATH)
}

/// Asset download URL on the mock server
pub fn asset_url(server: &MockServer, name: &str) -> String {
    format!("{}/download/{}", server.uri(), name)
}
