//! Tests for document version ordering (§5 Concurrency & Resource Model,
//! §8 universal invariant): a `didChange` at version `n` must retire
//! before any later request observes a version older than `n`.

mod common;

use common::LspClient;
use std::time::Duration;

#[test]
fn test_hover_after_change_observes_latest_version() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("custom-elements.json"),
        r#"{"modules":[{"path":"my-card.js","declarations":[{
            "kind":"class","name":"MyCard","tagName":"my-card",
            "attributes":[{"name":"variant","type":{"text":"string"}}]
        }]}]}"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("my-card.js"),
        "class MyCard extends HTMLElement {}\ncustomElements.define('my-card', MyCard);\n",
    )
    .unwrap();

    let mut client = LspClient::spawn_with_workspace_root(dir.path());
    client.initialize();

    let uri = format!("file://{}/index.html", dir.path().display());

    client.did_open(&uri, "html", "<unknown-thing></unknown-thing>");
    // Version 2 replaces the unknown tag with a known one.
    client.did_change(&uri, 2, "<my-card></my-card>");
    std::thread::sleep(Duration::from_millis(100));

    let hover = client.hover(10, &uri, 0, 3);
    assert!(hover.get("error").is_none(), "hover after change should not error: {hover:?}");
    // A hover landing on the pre-change content would see an unregistered
    // tag and return a null result; the post-change content is a known
    // element and must produce hover text.
    assert!(!hover["result"].is_null(), "hover should reflect the latest document version");
}

#[test]
fn test_stale_change_version_is_rejected() {
    let mut client = LspClient::spawn();
    client.initialize();

    let uri = "file:///test/order.html";
    client.did_open(uri, "html", "<my-card></my-card>");
    client.did_change(uri, 5, "<my-card variant=\"a\"></my-card>");
    // Version 3 is older than the already-applied version 5 and must be
    // rejected, leaving the document at its version-5 content.
    client.did_change(uri, 3, "<stale-content></stale-content>");
    std::thread::sleep(Duration::from_millis(100));

    let hover = client.hover(20, uri, 0, 3);
    assert!(hover.get("error").is_none());
}

#[test]
fn test_rapid_sequential_changes_do_not_crash() {
    let mut client = LspClient::spawn();
    client.initialize();

    let uri = "file:///test/rapid.html";
    client.did_open(uri, "html", "<my-card></my-card>");
    for version in 2..10 {
        client.did_change(uri, version, &format!("<my-card data-n=\"{version}\"></my-card>"));
    }
    std::thread::sleep(Duration::from_millis(100));

    let hover = client.hover(30, uri, 0, 3);
    assert!(hover.get("error").is_none(), "rapid changes should not break the server");
}
