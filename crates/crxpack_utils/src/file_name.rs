use std::sync::LazyLock;

use regex::Regex;

static TIMESTAMP_QUERY: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"t=\d+&").expect("Invalid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileNameKind {
  Module,
  Loader,
  Iife,
  Asset,
}

/// Deterministic package-relative file name for a dev server module id. Used wherever the
/// bundler does not name the output itself.
pub fn get_file_name(id: &str, kind: FileNameKind) -> String {
  let file_name = TIMESTAMP_QUERY.replace(id, "");
  let file_name = file_name.strip_prefix('/').unwrap_or(&file_name);
  let file_name = file_name.replace('?', "__").replace('&', "_").replace('=', "--");

  let file_name = if let Some((_, rest)) = file_name.rsplit_once("node_modules/") {
    format!("vendor/{}", rest.replace('/', "-"))
  } else if let Some(rest) = file_name.strip_prefix('@') {
    format!("vendor/{}", rest.replace('/', "-"))
  } else if let Some(rest) = file_name.strip_prefix(".vite/deps/") {
    format!("vendor/{rest}")
  } else {
    file_name
  };

  match kind {
    FileNameKind::Module => format!("{file_name}.js"),
    FileNameKind::Loader => format!("{file_name}-loader.js"),
    FileNameKind::Iife => format!("{file_name}.iife.js"),
    FileNameKind::Asset => file_name,
  }
}

/// Ensures `text` starts with `prefix`.
pub fn prefix(prefix: &str, text: &str) -> String {
  if text.starts_with(prefix) {
    text.to_string()
  } else {
    format!("{prefix}{text}")
  }
}

#[test]
fn test_get_file_name() {
  assert_eq!(get_file_name("/src/content.ts", FileNameKind::Module), "src/content.ts.js");
  assert_eq!(get_file_name("/src/content.ts", FileNameKind::Loader), "src/content.ts-loader.js");
  assert_eq!(get_file_name("/src/content.ts", FileNameKind::Iife), "src/content.ts.iife.js");
  assert_eq!(get_file_name("/src/logo.png", FileNameKind::Asset), "src/logo.png");
  assert_eq!(
    get_file_name("/src/App.vue?t=1650000000&vue&type=style", FileNameKind::Module),
    "src/App.vue__vue_type--style.js"
  );
}

#[test]
fn test_get_file_name_vendor() {
  assert_eq!(
    get_file_name("/node_modules/.vite/deps/react.js?v=1", FileNameKind::Module),
    "vendor/.vite-deps-react.js__v--1.js"
  );
  assert_eq!(get_file_name("/@vite/client", FileNameKind::Module), "vendor/vite-client.js");
  assert_eq!(get_file_name("/.vite/deps/react.js", FileNameKind::Module), "vendor/react.js.js");
}

#[test]
fn test_prefix() {
  assert_eq!(prefix("/", "src/a.js"), "/src/a.js");
  assert_eq!(prefix("/", "/src/a.js"), "/src/a.js");
}
