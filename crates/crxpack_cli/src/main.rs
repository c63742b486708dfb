mod args;
mod types;

use std::{process::ExitCode, sync::Arc, time::Instant};

use ansi_term::Colour;
use args::{InputArgs, OutputArgs};
use clap::{Parser, Subcommand};
use crxpack::{
  BuildResult, BundleOutput, ContentScriptOptions, CrxBundler, CrxOptions, ManifestSource, Output,
  PrebuiltBundleHost,
};
use crxpack_fs::{FileSystem, OsFileSystem};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Packages a prebuilt bundle graph as a browser extension.
  Build {
    #[clap(flatten)]
    input: InputArgs,

    #[clap(flatten)]
    output: OutputArgs,
  },
}

fn print_outputs(output: &BundleOutput) {
  let mut left = 0;
  let mut right = 0;

  let mut outputs = Vec::with_capacity(output.bundle.len());

  for item in output.bundle.iter() {
    let size = format!("{:.2}", item.content_as_bytes().len() as f64 / 1024.0);

    if size.len() > right {
      right = size.len();
    }

    let filename = item.filename().to_string();
    if filename.len() > left {
      left = filename.len();
    }

    outputs.push((filename, size, matches!(item, Output::Chunk(_))));
  }

  let dim = Colour::White.dimmed();
  let color = Colour::Cyan;

  for (filename, size, is_chunk) in outputs {
    let output_type = if is_chunk { "chunk" } else { "asset" };
    let filename_len = filename.len();

    println!(
      "{}{}{:left$} {}{}{:right$}{} kB",
      dim.paint("<DIR>/"),
      color.paint(filename),
      "",
      dim.paint(output_type),
      dim.paint(" │ size: "),
      "",
      size,
      left = left - filename_len,
      right = right - size.len()
    );
  }
}

async fn build(input: InputArgs, output: &OutputArgs) -> BuildResult<BundleOutput> {
  let fs = Arc::new(OsFileSystem);
  let root = match input.root {
    Some(root) => root,
    None => std::env::current_dir()?,
  };
  let manifest = fs.read_to_string(&input.manifest)?;
  let graph = fs.read_to_string(&input.graph)?;
  let host = Arc::new(PrebuiltBundleHost::from_json(&graph, &root)?);

  let options = CrxOptions {
    root: Some(root),
    public_dir: input.public_dir,
    out_dir: output.out_dir.clone(),
    mode: output.mode.map(Into::into),
    server_port: output.port,
    content_scripts: Some(ContentScriptOptions {
      inject_css: Some(!output.no_inject_css),
      ..Default::default()
    }),
    hmr: None,
  };

  let mut bundler = CrxBundler::new(options, ManifestSource::Json(manifest), host, fs)?;
  bundler.write().await
}

#[tokio::main]
async fn main() -> ExitCode {
  crxpack_tracing::init();
  let Cli { command: Commands::Build { input, output: args } } = Cli::parse();

  let start = Instant::now();
  let manifest_path = input.manifest.clone();
  match build(input, &args).await {
    Ok(output) => {
      if !args.silent {
        print_outputs(&output);
      }

      let elapsed = format!("{:.2} ms", start.elapsed().as_secs_f64() * 1000.0);
      println!(
        "\n{} Packaged {} in {}",
        Colour::Green.paint("✔"),
        manifest_path.display(),
        Colour::White.bold().paint(elapsed)
      );
      ExitCode::SUCCESS
    }
    Err(errors) => {
      for error in &*errors {
        println!("{} {error:#}", Colour::Red.paint("Error:"));
      }
      ExitCode::FAILURE
    }
  }
}
