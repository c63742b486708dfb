mod common;

use std::{sync::Arc, time::Duration};

use crxpack::{
  BuildMode, CrxEvent, HmrPayload, HmrUpdate, HmrUpdateKind, RuntimeHub, RuntimeMessage,
  RuntimePort,
};
use tokio::time::timeout;

fn update(path: &str) -> HmrPayload {
  HmrPayload::Update {
    updates: vec![HmrUpdate {
      kind: HmrUpdateKind::JsUpdate,
      path: path.to_string(),
      accepted_path: path.to_string(),
      timestamp: 7,
    }],
  }
}

fn bundled_update(file: &str) -> HmrPayload {
  CrxEvent::Update {
    updates: vec![HmrUpdate {
      kind: HmrUpdateKind::JsUpdate,
      path: format!("/{file}"),
      accepted_path: format!("/{file}"),
      timestamp: 7,
    }],
  }
  .into_payload()
}

async fn next_payload(port: &mut RuntimePort) -> HmrPayload {
  let message = timeout(Duration::from_secs(5), port.recv()).await.unwrap().unwrap();
  let RuntimeMessage::Hmr { payload } = message else { panic!("unexpected {message:?}") };
  payload
}

#[tokio::test(start_paused = true)]
async fn updates_are_held_until_the_next_bundle() {
  let fs = common::project_fs();
  let mut bundler =
    common::bundler(BuildMode::Serve, common::manifest(), common::GRAPH, &fs, vec![]);
  bundler.write().await.unwrap();

  let hub = RuntimeHub::new();
  let mut port = hub.connect();
  let (hmr, _task) = bundler.spawn_hmr(Some(Arc::new(common::import_graph())), hub.clone());

  assert!(hmr.publish(update("/src/dom.ts")).await);
  assert!(hmr.publish(HmrPayload::Prune { paths: vec!["/src/old.ts".to_string()] }).await);
  assert!(timeout(Duration::from_secs(1), port.recv()).await.is_err());

  let output = bundler.write().await.unwrap();
  assert_eq!(next_payload(&mut port).await, bundled_update("assets/content-a1.js"));
  assert!(output.bundle.contains("assets/content-a1.js"));
  assert_eq!(
    next_payload(&mut port).await,
    CrxEvent::Prune { paths: vec!["/src/old.ts.js".to_string()] }.into_payload()
  );
}

#[tokio::test]
async fn payload_published_right_before_a_build_is_delivered() {
  let fs = common::project_fs();
  let mut bundler =
    common::bundler(BuildMode::Serve, common::manifest(), common::GRAPH, &fs, vec![]);
  bundler.write().await.unwrap();

  let hub = RuntimeHub::new();
  let mut port = hub.connect();
  let (hmr, _task) = bundler.spawn_hmr(None, hub.clone());

  assert!(hmr.try_publish(update("/src/dom.ts")));
  bundler.write().await.unwrap();
  assert_eq!(next_payload(&mut port).await, bundled_update("assets/content-a1.js"));
}

#[tokio::test]
async fn ready_bundle_is_not_hidden_by_the_next_build_start() {
  let fs = common::project_fs();
  let mut bundler =
    common::bundler(BuildMode::Serve, common::manifest(), common::GRAPH, &fs, vec![]);
  bundler.write().await.unwrap();

  let hub = RuntimeHub::new();
  let mut port = hub.connect();
  let (hmr, _task) = bundler.spawn_hmr(None, hub.clone());

  assert!(hmr.publish(update("/src/dom.ts")).await);
  bundler.write().await.unwrap();
  // Next build already running by the time the coordinator looks at the clock.
  bundler.session().clock.build_start();
  assert_eq!(next_payload(&mut port).await, bundled_update("assets/content-a1.js"));
}

#[tokio::test(start_paused = true)]
async fn background_changes_reload_the_runtime() {
  let fs = common::project_fs();
  let mut bundler =
    common::bundler(BuildMode::Serve, common::manifest(), common::GRAPH, &fs, vec![]);
  bundler.write().await.unwrap();

  let hub = RuntimeHub::new();
  let mut port = hub.connect();
  let (hmr, _task) = bundler.spawn_hmr(None, hub.clone());

  assert!(hmr.publish(update("/src/dom.ts")).await);
  assert!(hmr.publish(update("/src/api.ts")).await);
  bundler.write().await.unwrap();

  assert_eq!(next_payload(&mut port).await, CrxEvent::FullReload.into_payload());
  assert!(timeout(Duration::from_secs(1), port.recv()).await.is_err(), "one reload only");
}

#[tokio::test(start_paused = true)]
async fn stalled_window_is_dropped() {
  let fs = common::project_fs();
  let mut bundler =
    common::bundler(BuildMode::Serve, common::manifest(), common::GRAPH, &fs, vec![]);
  bundler.write().await.unwrap();

  let hub = RuntimeHub::new();
  let mut port = hub.connect();
  let (hmr, _task) = bundler.spawn_hmr(Some(Arc::new(common::import_graph())), hub.clone());

  assert!(hmr.publish(update("/src/dom.ts")).await);
  // Past the default 30s window.
  tokio::time::sleep(Duration::from_secs(31)).await;

  bundler.write().await.unwrap();
  assert!(timeout(Duration::from_secs(1), port.recv()).await.is_err());
}

#[tokio::test]
async fn serve_package_loads_scripts_from_the_dev_server() {
  let fs = common::project_fs();
  let mut bundler =
    common::bundler(BuildMode::Serve, common::manifest(), common::GRAPH, &fs, vec![]);
  let output = bundler.write().await.unwrap();
  let manifest = &output.manifest;

  assert_eq!(manifest.content_scripts[0].js, ["src/content.ts-loader.js"]);
  assert!(output.bundle.contains("src/content.ts-loader.js"));
  assert!(output.bundle.contains("vendor/crx-client-port.js"));

  // Dev names are inlined, no placeholder pass needed.
  let code = &output.bundle.chunk("assets/content-a1.js").unwrap().code;
  assert!(code.contains("export default \"/src/inject.ts-loader.js\";"), "{code}");
  assert!(output.bundle.contains("src/inject.ts-loader.js"));

  let worker_loader =
    String::from_utf8(output.bundle.get("service-worker-loader.js").unwrap().content_as_bytes().to_vec())
      .unwrap();
  assert!(worker_loader.contains("http://localhost:5173/src/background.ts"));

  let entries = manifest.web_accessible_resources.as_ref().unwrap();
  assert_eq!(entries.len(), 1);
  assert_eq!(entries[0].resources(), ["**/*", "*"]);
}
