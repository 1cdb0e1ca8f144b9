//! Collection listing scenarios: pagination, label filters, ordering.

mod common;

use std::collections::BTreeMap;

use strato_sdk::ListOptions;
use strato_sdk::types::InstanceSpec;

/// Create `total` instances named inst-0..inst-N in order; the first
/// `labeled` of them carry env=conformance.
async fn seed_instances(
    harness: &strato_conformance::Harness,
    total: usize,
    labeled: usize,
) -> Vec<String> {
    let instances = harness.api.instances("acme", "dev");
    let spec = harness.instance_spec("default");
    let mut names = Vec::new();
    for i in 0..total {
        let name = format!("inst-{i}");
        let labels: BTreeMap<String, String> = if i < labeled {
            [("env".to_string(), "conformance".to_string())]
                .into_iter()
                .collect()
        } else {
            BTreeMap::new()
        };
        instances
            .create_or_update(&name, &spec, &labels)
            .await
            .unwrap();
        names.push(name);
    }
    names
}

fn names_of(items: &[strato_sdk::Resource<InstanceSpec>]) -> Vec<&str> {
    items.iter().map(|r| r.metadata.name.as_str()).collect()
}

#[tokio::test]
async fn unfiltered_list_returns_everything_in_creation_order() {
    let server = common::TestServer::spawn().await;
    let harness = server.harness().await;
    let names = seed_instances(&harness, 7, 3).await;

    let items = harness
        .api
        .instances("acme", "dev")
        .list(ListOptions::new())
        .all()
        .await
        .unwrap();

    assert_eq!(names_of(&items), names);

    server.shutdown().await;
}

#[tokio::test]
async fn small_page_limit_drains_without_loss_or_duplicates() {
    let server = common::TestServer::spawn().await;
    let harness = server.harness().await;
    let names = seed_instances(&harness, 7, 0).await;

    // Page size 3 over 7 items: three round-trips behind the scenes, same
    // items in the same order as one big page.
    let items = harness
        .api
        .instances("acme", "dev")
        .list(ListOptions::new().limit(3))
        .all()
        .await
        .unwrap();

    assert_eq!(names_of(&items), names);

    server.shutdown().await;
}

#[tokio::test]
async fn label_filter_selects_only_matching_instances() {
    let server = common::TestServer::spawn().await;
    let harness = server.harness().await;
    seed_instances(&harness, 7, 3).await;

    let items = harness
        .api
        .instances("acme", "dev")
        .list(ListOptions::new().label("env", "conformance"))
        .all()
        .await
        .unwrap();

    assert_eq!(names_of(&items), vec!["inst-0", "inst-1", "inst-2"]);

    server.shutdown().await;
}

#[tokio::test]
async fn label_filter_with_page_limit_one_still_finds_all_matches() {
    let server = common::TestServer::spawn().await;
    let harness = server.harness().await;
    seed_instances(&harness, 7, 3).await;

    // limit caps the page size, not the result count.
    let items = harness
        .api
        .instances("acme", "dev")
        .list(ListOptions::new().label("env", "conformance").limit(1))
        .all()
        .await
        .unwrap();

    assert_eq!(names_of(&items), vec!["inst-0", "inst-1", "inst-2"]);

    server.shutdown().await;
}

#[tokio::test]
async fn multiple_labels_are_conjunctive() {
    let server = common::TestServer::spawn().await;
    let harness = server.harness().await;
    let instances = harness.api.instances("acme", "dev");
    let spec = harness.instance_spec("default");

    let both: BTreeMap<String, String> = [
        ("env".to_string(), "conformance".to_string()),
        ("tier".to_string(), "web".to_string()),
    ]
    .into_iter()
    .collect();
    let env_only: BTreeMap<String, String> =
        [("env".to_string(), "conformance".to_string())]
            .into_iter()
            .collect();

    instances.create_or_update("a", &spec, &both).await.unwrap();
    instances
        .create_or_update("b", &spec, &env_only)
        .await
        .unwrap();

    let items = instances
        .list(
            ListOptions::new()
                .label("env", "conformance")
                .label("tier", "web"),
        )
        .all()
        .await
        .unwrap();

    assert_eq!(names_of(&items), vec!["a"]);

    server.shutdown().await;
}

#[tokio::test]
async fn empty_collection_lists_empty() {
    let server = common::TestServer::spawn().await;
    let harness = server.harness().await;

    let items = harness
        .api
        .instances("acme", "dev")
        .list(ListOptions::new())
        .all()
        .await
        .unwrap();
    assert!(items.is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn listings_are_scoped_to_their_workspace() {
    let server = common::TestServer::spawn().await;
    let harness = server.harness().await;
    let spec = harness.instance_spec("default");

    harness
        .api
        .instances("acme", "dev")
        .create_or_update("dev-0", &spec, &BTreeMap::new())
        .await
        .unwrap();
    harness
        .api
        .instances("acme", "prod")
        .create_or_update("prod-0", &spec, &BTreeMap::new())
        .await
        .unwrap();

    let dev = harness
        .api
        .instances("acme", "dev")
        .list(ListOptions::new())
        .all()
        .await
        .unwrap();
    assert_eq!(names_of(&dev), vec!["dev-0"]);

    server.shutdown().await;
}
