use std::time::Duration;

use arcstr::ArcStr;
use crxpack_common::{BuildMode, ModuleId, NormalizedCrxOptions, OutputBundle};
use crxpack_error::{BuildResult, CrxError};
use crxpack_utils::{
  file_name::{get_file_name, FileNameKind},
  path_ext::{strip_query, PathExt},
};

use crate::host::{BundleHost, EmittedAsset};

const CONTENT_DEV_LOADER: &str = include_str!("client/content-dev-loader.js");
const CONTENT_PRO_LOADER: &str = include_str!("client/content-pro-loader.js");
const CONTENT_MAIN_LOADER: &str = include_str!("client/content-main-loader.js");
const CONTENT_HMR_PORT: &str = include_str!("client/content-hmr-port.js");

/// Dev client content scripts connect through.
pub const CLIENT_PORT_ID: &str = "/@crx/client-port";
pub const PREAMBLE_ID: &str = "/@crx/client-preamble";
pub const WORKER_CLIENT_ID: &str = "/@crx/client-worker";

/// Fixed name, the service worker has to live at the package root to control every page.
pub const SERVICE_WORKER_LOADER: &str = "service-worker-loader.js";

fn js_string(value: &str) -> BuildResult<String> {
  Ok(serde_json::to_string(value).map_err(CrxError::json)?)
}

/// Dev files every development loader imports before the script itself.
#[derive(Debug, Clone)]
pub struct DevClientFiles {
  pub client: String,
  pub preamble: Option<String>,
}

impl DevClientFiles {
  pub fn new(options: &NormalizedCrxOptions) -> Self {
    Self {
      client: get_file_name(CLIENT_PORT_ID, FileNameKind::Module),
      preamble: options
        .preamble_code
        .as_ref()
        .map(|_| get_file_name(PREAMBLE_ID, FileNameKind::Module)),
    }
  }
}

/// Bootstrap for a script injected into an isolated world. The development body wires up the HMR
/// client first; which one is used depends only on `mode`.
pub fn content_loader(
  mode: BuildMode,
  script_file: &str,
  dev: &DevClientFiles,
) -> BuildResult<String> {
  let script = js_string(script_file)?;
  match mode {
    BuildMode::Build => Ok(CONTENT_PRO_LOADER.replace("__SCRIPT__", &script)),
    BuildMode::Serve => Ok(
      CONTENT_DEV_LOADER
        .replace("__PREAMBLE__", &js_string(dev.preamble.as_deref().unwrap_or_default())?)
        .replace("__CLIENT__", &js_string(&dev.client)?)
        .replace("__SCRIPT__", &script),
    ),
  }
}

/// Bootstrap for a `MAIN` world script, which imports its module relative to the loader.
pub fn main_world_loader(script_file: &str) -> BuildResult<String> {
  let base_name = script_file.rsplit('/').next().unwrap_or(script_file);
  Ok(CONTENT_MAIN_LOADER.replace("__SCRIPT__", &js_string(&format!("./{base_name}"))?))
}

pub fn content_hmr_port(ping_interval: Duration) -> String {
  CONTENT_HMR_PORT.replace("__CRX_HMR_TIMEOUT__", &ping_interval.as_millis().to_string())
}

/// Source of `service-worker-loader.js`. `None` when a production build has no service worker.
pub fn background_loader(
  mode: BuildMode,
  worker: Option<&str>,
  server_port: Option<u16>,
) -> BuildResult<Option<String>> {
  match mode {
    BuildMode::Serve => {
      let port = server_port.ok_or_else(CrxError::server_port_undefined)?;
      let mut loader = format!("import 'http://localhost:{port}/@vite/env';\n");
      loader.push_str(&format!("import 'http://localhost:{port}{WORKER_CLIENT_ID}';\n"));
      if let Some(worker) = worker {
        loader.push_str(&format!("import 'http://localhost:{port}/{worker}';\n"));
      }
      Ok(Some(loader))
    }
    BuildMode::Build => Ok(worker.map(|worker| format!("import './{worker}';\n"))),
  }
}

/// Name of the loader asset emitted for `id`, e.g. `content.ts-loader.js`.
pub fn loader_asset_name(id: &ModuleId) -> String {
  let base_name = std::path::Path::new(strip_query(id)).representative_file_name().into_owned();
  get_file_name(&base_name, FileNameKind::Loader)
}

/// Wraps a self-contained script so it keeps the scope isolation a loader would give it.
pub fn wrap_in_iife(code: &str) -> String {
  format!("(function(){{{code}}})()\n")
}

/// Gives the compiled script `file_name` of `id` the bootstrap its execution context needs.
/// Returns the loader's file name, or `None` when the script was wrapped in place.
pub fn emit_script_loader(
  host: &dyn BundleHost,
  bundle: &mut OutputBundle,
  options: &NormalizedCrxOptions,
  dev: &DevClientFiles,
  id: &ModuleId,
  file_name: &ArcStr,
  main_world: bool,
) -> BuildResult<Option<ArcStr>> {
  if options.mode == BuildMode::Build {
    let chunk =
      bundle.chunk_mut(file_name).ok_or_else(|| CrxError::missing_root(&**id, file_name.as_str()))?;
    if chunk.is_self_contained() {
      tracing::trace!(%id, %file_name, "script needs no loader, wrapping in place");
      chunk.code = wrap_in_iife(&chunk.code);
      return Ok(None);
    }
  }

  let source = if main_world {
    if options.is_serve() {
      tracing::warn!(%id, "content scripts in the MAIN world do not support HMR");
    }
    main_world_loader(file_name)?
  } else {
    content_loader(options.mode, file_name, dev)?
  };

  let asset = match options.mode {
    BuildMode::Build => EmittedAsset::named(loader_asset_name(id), source),
    BuildMode::Serve => {
      EmittedAsset::fixed(get_file_name(strip_query(id), FileNameKind::Loader), source)
    }
  };
  let reference = host.emit_asset(bundle, asset)?;
  let loader = host
    .file_name(&reference)
    .ok_or_else(|| CrxError::missing_emitted_file("loader", id.to_string()))?;
  tracing::debug!(%id, %loader, "emitted loader");
  Ok(Some(loader))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn dev_files() -> DevClientFiles {
    DevClientFiles { client: "vendor/crx-client-port.js".to_string(), preamble: None }
  }

  #[test]
  fn loader_body_depends_only_on_mode() {
    let pro = content_loader(BuildMode::Build, "assets/content.js", &dev_files()).unwrap();
    assert!(pro.contains(r#"chrome.runtime.getURL("assets/content.js")"#));
    assert!(!pro.contains("vendor/crx-client-port.js"));

    let dev = content_loader(BuildMode::Serve, "src/content.ts.js", &dev_files()).unwrap();
    let client = dev.find("vendor/crx-client-port.js").unwrap();
    let script = dev.find("src/content.ts.js").unwrap();
    assert!(client < script, "dev client is imported before the script");
    assert!(dev.contains(r#"if ("")"#));
  }

  #[test]
  fn background_loader_per_mode() {
    assert_eq!(
      background_loader(BuildMode::Build, Some("assets/background.js"), None).unwrap().unwrap(),
      "import './assets/background.js';\n"
    );
    assert_eq!(background_loader(BuildMode::Build, None, None).unwrap(), None);
    assert_eq!(
      background_loader(BuildMode::Serve, Some("src/background.ts"), Some(5173)).unwrap().unwrap(),
      "import 'http://localhost:5173/@vite/env';\nimport 'http://localhost:5173/@crx/client-worker';\nimport 'http://localhost:5173/src/background.ts';\n"
    );
    let err = background_loader(BuildMode::Serve, None, None).unwrap_err();
    assert_eq!(err.find_crx_error().unwrap().code(), "SERVER_PORT_UNDEFINED");
  }

  #[test]
  fn main_world_loader_imports_relative_file() {
    assert_eq!(main_world_loader("assets/content-abc.js").unwrap(), "import \"./content-abc.js\"\n");
  }

  #[test]
  fn loader_names() {
    assert_eq!(loader_asset_name(&ModuleId::from("/src/content.ts")), "content.ts-loader.js");
    assert_eq!(wrap_in_iife("console.log(1)"), "(function(){console.log(1)})()\n");
  }
}
