// PuppetDbClient against a mockito server

use mockito::{Matcher, Server};
use puppetdb_proxy::api::PuppetDb;
use puppetdb_proxy::core::errors::ProxyError;
use puppetdb_proxy::core::params::QueryParams;
use puppetdb_proxy::proxy::PuppetDbClient;
use serde_json::json;

#[tokio::test]
async fn test_query_sends_form_body() {
    let mut server = Server::new_async().await;
    let client = PuppetDbClient::new(&server.url(), false, Some(5)).unwrap();

    let mock = server
        .mock("GET", "/pdb/query/v4/nodes")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("query".into(), r#"["=","certname","web01"]"#.into()),
            Matcher::UrlEncoded("limit".into(), "5".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"certname": "web01"}]).to_string())
        .create_async()
        .await;

    let mut params = QueryParams::new();
    params.append("query", r#"["=","certname","web01"]"#);
    params.append("limit", "5");
    let reply = client.query(&["nodes"], &params).await.unwrap();

    mock.assert_async().await;
    assert_eq!(reply.status, 200);
    assert!(reply.is_success());
}

#[tokio::test]
async fn test_non_200_is_reported_not_raised() {
    let mut server = Server::new_async().await;
    let client = PuppetDbClient::new(&server.url(), false, None).unwrap();

    let mock = server
        .mock("GET", "/pdb/query/v4/resources")
        .with_status(404)
        .with_body("not found")
        .create_async()
        .await;

    let reply = client.query(&["resources"], &QueryParams::new()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(reply.status, 404);
    assert!(!reply.is_success());
    assert_eq!(reply.body, b"not found");
}

#[tokio::test]
async fn test_path_segments_percent_encoded() {
    let mut server = Server::new_async().await;
    let client = PuppetDbClient::new(&server.url(), false, None).unwrap();

    let mock = server
        .mock("GET", "/pdb/query/v4/nodes/web01/resources/File/%2Fetc%2Fmotd")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let reply = client
        .query(&["nodes", "web01", "resources", "File", "/etc/motd"], &QueryParams::new())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(reply.status, 200);
}

#[tokio::test]
async fn test_submit_command_params_and_headers() {
    let mut server = Server::new_async().await;
    let client = PuppetDbClient::new(&server.url(), false, Some(5)).unwrap();

    let mock = server
        .mock("POST", "/pdb/cmd/v1")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("certname".into(), "web01".into()),
            Matcher::UrlEncoded("producer-timestamp".into(), "2019-03-28T12:06:40.000Z".into()),
            Matcher::UrlEncoded("command".into(), "deactivate_node".into()),
            Matcher::UrlEncoded("version".into(), "3".into()),
        ]))
        .match_header("content-type", "application/json")
        .match_header("accept", "application/json")
        .match_body(Matcher::Json(json!({"certname": "web01", "producer_timestamp": "2019-03-28T12:06:40+00:00"})))
        .with_status(200)
        .with_body(r#"{"uuid":"f5a6c1de-1e0a-4e8a-9d5b-2f1e0c3b4a59"}"#)
        .create_async()
        .await;

    let params = vec![
        ("certname", "web01".to_string()),
        ("producer-timestamp", "2019-03-28T12:06:40.000Z".to_string()),
        ("command", "deactivate_node".to_string()),
        ("version", "3".to_string()),
    ];
    let body = json!({"certname": "web01", "producer_timestamp": "2019-03-28T12:06:40+00:00"});
    let reply = client
        .submit_command(&params, serde_json::to_vec(&body).unwrap())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(reply.status, 200);
}

#[tokio::test]
async fn test_base_url_path_prefix_kept() {
    let mut server = Server::new_async().await;
    let client = PuppetDbClient::new(&format!("{}/puppetdb/", server.url()), false, None).unwrap();

    let mock = server
        .mock("GET", "/puppetdb/pdb/meta/v1/version")
        .with_status(200)
        .with_body(r#"{"version":"6.22.1"}"#)
        .create_async()
        .await;

    let reply = client.fetch_raw(&["pdb", "meta", "v1", "version"]).await.unwrap();

    mock.assert_async().await;
    assert_eq!(reply.body, br#"{"version":"6.22.1"}"#);
}

#[tokio::test]
async fn test_connection_refused() {
    let client = PuppetDbClient::new("http://127.0.0.1:1", false, Some(2)).unwrap();

    let err = client.query(&["nodes"], &QueryParams::new()).await.unwrap_err();

    assert!(matches!(err, ProxyError::Backend(_)));
}
