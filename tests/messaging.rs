//! Outbound `send` and `request`: call shape, response envelopes, error
//! propagation and reconnect coalescing.

use std::sync::Arc;

use hubline::{ConnectionError, Response, ResponseError, TransportError, body};
use hubline_testing::hub_expect;
use rstest::rstest;
use serde::Deserialize;
use serde_json::{Value, json};

mod common;
use common::{HUB_URL, Harness, harness};

#[derive(Debug, Deserialize, PartialEq)]
struct Room {
    name: String,
    members: u32,
}

#[rstest]
#[tokio::test]
async fn send_uses_dispatch_method_with_address_and_body_array(harness: Harness) {
    hub_expect!(harness.connection.connect(HUB_URL, false));

    hub_expect!(
        harness
            .connection
            .send("Chat.Post", body!["general", { "text": "hi" }, 3])
    );

    let invocations = harness.hub.invocations();
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].method, "HandleAction");
    assert_eq!(
        invocations[0].arguments,
        vec![json!("Chat.Post"), json!(["general", { "text": "hi" }, 3])]
    );
}

#[rstest]
#[tokio::test]
async fn empty_body_is_sent_as_empty_array(harness: Harness) {
    hub_expect!(harness.connection.connect(HUB_URL, false));

    hub_expect!(harness.connection.send("Ping", ()));

    assert_eq!(harness.hub.invocations()[0].body(), Some(&[][..]));
}

#[rstest]
#[tokio::test]
async fn request_returns_success_payload(harness: Harness) {
    harness.hub.respond_with(|_, args| {
        assert_eq!(args[0], json!("Rooms.Get"));
        Ok(json!({ "result": { "name": args[1][0], "members": 4 } }))
    });
    hub_expect!(harness.connection.connect(HUB_URL, false));

    let response = hub_expect!(
        harness
            .connection
            .request::<Room>("Rooms.Get", body!["general"])
    );

    assert_eq!(
        response,
        Response::Result(Room {
            name: "general".to_owned(),
            members: 4,
        })
    );
    assert!(response.error().is_none());
}

#[rstest]
#[tokio::test]
async fn request_returns_application_error_unchanged(harness: Harness) {
    harness
        .hub
        .respond_with(|_, _| Ok(json!({ "error": { "code": 403, "message": "forbidden" } })));
    hub_expect!(harness.connection.connect(HUB_URL, false));

    let response = hub_expect!(harness.connection.request::<Room>("Rooms.Get", ()));

    assert!(response.result().is_none());
    assert_eq!(
        response.into_result(),
        Err(ResponseError {
            code: 403,
            message: "forbidden".to_owned(),
        })
    );
    assert_eq!(harness.hub.invocations().len(), 1);
}

#[rstest]
#[case(json!(null))]
#[case(json!({ "Result": 1 }))]
#[case(json!({ "result": "not a number" }))]
#[tokio::test]
async fn malformed_envelope_is_a_decode_error(harness: Harness, #[case] reply: Value) {
    harness.hub.respond_with(move |_, _| Ok(reply.clone()));
    hub_expect!(harness.connection.connect(HUB_URL, false));

    let err = harness
        .connection
        .request::<u32>("Count", ())
        .await
        .expect_err("malformed envelope");

    assert!(matches!(err, ConnectionError::Decode(_)));
}

#[rstest]
#[tokio::test]
async fn invocation_failure_propagates_unchanged(harness: Harness) {
    harness
        .hub
        .respond_with(|_, _| Err(TransportError::Invocation("hub method threw".into())));
    hub_expect!(harness.connection.connect(HUB_URL, false));

    let send_err = harness
        .connection
        .send("Chat.Post", ())
        .await
        .expect_err("send fails");
    let request_err = harness
        .connection
        .request::<Value>("Chat.Post", ())
        .await
        .expect_err("request fails");

    for err in [send_err, request_err] {
        assert_eq!(err.to_string(), "invocation failed: hub method threw");
        assert!(matches!(
            err,
            ConnectionError::Transport(TransportError::Invocation(_))
        ));
    }
}

#[rstest]
#[tokio::test]
async fn concurrent_sends_share_one_reconnect(harness: Harness) {
    let connection = Arc::new(harness.connection);
    hub_expect!(connection.connect(HUB_URL, false));
    hub_expect!(connection.disconnect());

    let sends = (0..8).map(|n| {
        let connection = Arc::clone(&connection);
        async move { connection.send("Chat.Post", body![n]).await }
    });
    let results = futures::future::join_all(sends).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(harness.hub.starts(), 2);
    assert_eq!(harness.hub.endpoints().len(), 2);
    let invocations = harness.hub.invocations();
    assert_eq!(invocations.len(), 8);
    assert!(
        invocations
            .iter()
            .all(|i| i.connection_id.as_deref() == Some("conn-2"))
    );
}

#[rstest]
#[tokio::test]
async fn body_values_pass_through_untouched(harness: Harness) {
    let payload = json!({ "nested": [1, { "deep": null }], "unicode": "héllo" });
    hub_expect!(harness.connection.connect(HUB_URL, false));

    hub_expect!(
        harness
            .connection
            .send("Echo", hubline::Body::from(vec![payload.clone(), json!(-1.5)]))
    );

    assert_eq!(
        harness.hub.invocations()[0].body(),
        Some(&[payload, json!(-1.5)][..])
    );
}
