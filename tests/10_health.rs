mod common;

use anyhow::Result;
use reqwest::StatusCode;

use common::TestServer;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_lists_endpoints() -> Result<()> {
    let server = TestServer::spawn().await?;

    let body = server.client.get(server.url("/")).send().await?.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["name"], "Arsip API");
    assert!(body["data"]["endpoints"]["documents"].is_string(), "missing documents endpoint: {}", body);
    Ok(())
}
