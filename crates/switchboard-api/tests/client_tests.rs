// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use serde_json::json;
use std::io::Read;
use std::thread;
use std::time::Duration;
use switchboard_api::Client;
use switchboard_app::{ChannelId, ChannelStore, FilterCriteria, ListQuery};
use tiny_http::{Header, Method, Response, Server};

fn json_header() -> Header {
    Header::from_bytes("Content-Type", "application/json").expect("valid content type header")
}

#[test]
fn connection_error_names_the_server() {
    let mut client =
        Client::new("http://127.0.0.1:1/api", Duration::from_millis(50)).expect("client builds");

    let error = client
        .list_groups()
        .expect_err("unreachable endpoint must fail");
    assert!(error.to_string().contains("management server"));
}

#[test]
fn list_channels_sends_the_full_wire_query() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/api", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let url = request.url().to_owned();
        assert!(url.starts_with("/api/channels?"), "unexpected url: {url}");
        for pair in [
            "page=1",
            "size=10",
            "order=-id",
            "type=0",
            "status=0",
            "name=acme",
            "filter_tag=0",
            "tag=",
        ] {
            assert!(url.contains(pair), "missing {pair} in {url}");
        }
        assert!(!url.contains("token"), "token must not reach the wire");

        let body = json!({
            "success": true,
            "message": "",
            "data": { "total_count": 1, "data": [{ "id": 5, "name": "acme-5" }] }
        });
        let response = Response::from_string(body.to_string())
            .with_status_code(200)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let mut client = Client::new(&addr, Duration::from_secs(1))?;
    let envelope = client.list_channels(&ListQuery {
        page: 1,
        size: 10,
        order: Some("-id".to_owned()),
        criteria: FilterCriteria {
            name: "acme".to_owned(),
            ..FilterCriteria::default()
        },
    })?;

    assert!(envelope.success);
    let page = envelope.data.expect("page data");
    assert_eq!(page.total_count, 1);
    assert_eq!(page.rows[0].id, ChannelId::new(5));
    assert_eq!(page.rows[0].name, "acme-5");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn batch_delete_puts_the_ids_in_the_body() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/api", server.server_addr());

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/channels/batch");
        assert_eq!(request.method(), &Method::Delete);

        let mut content = String::new();
        request
            .as_reader()
            .read_to_string(&mut content)
            .expect("read request body");
        let body: serde_json::Value = serde_json::from_str(&content).expect("json body");
        assert_eq!(body, json!({ "ids": [3, 7] }));

        let response = Response::from_string(r#"{"success":true,"message":""}"#)
            .with_status_code(200)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let mut client = Client::new(&addr, Duration::from_secs(1))?;
    let envelope = client.delete_channels_batch(&[ChannelId::new(3), ChannelId::new(7)])?;
    assert!(envelope.success);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn tag_segments_are_percent_encoded() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/api", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/channel_tag/team%20a%2Fb/priority");
        assert_eq!(request.method(), &Method::Put);

        let response = Response::from_string(r#"{"success":true,"message":""}"#)
            .with_status_code(200)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let mut client = Client::new(&addr, Duration::from_secs(1))?;
    let envelope = client.update_tag_priority("team a/b", "5")?;
    assert!(envelope.success);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn http_errors_surface_the_server_message() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/api", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let response =
            Response::from_string(r#"{"success":false,"message":"channel is protected"}"#)
                .with_status_code(500)
                .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let mut client = Client::new(&addr, Duration::from_secs(1))?;
    let error = client
        .delete_channel(ChannelId::new(1))
        .expect_err("500 must map to an error");
    let message = error.to_string();
    assert!(message.contains("500"));
    assert!(message.contains("channel is protected"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn rejections_with_http_200_stay_inside_the_envelope() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/api", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let response = Response::from_string(r#"{"success":false,"message":"quota exceeded"}"#)
            .with_status_code(200)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let mut client = Client::new(&addr, Duration::from_secs(1))?;
    let envelope = client.test_all_channels()?;
    assert!(!envelope.success);
    assert_eq!(envelope.message, "quota exceeded");

    handle.join().expect("server thread should join");
    Ok(())
}
