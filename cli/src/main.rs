use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};

use gltf_repack::prelude::{Config, GltfOptimizer};

#[derive(Parser)]
#[command(name = "gltf-repack")]
#[command(about = "Deduplicates bufferViews and accessors of a glTF file and repacks its buffer")]
struct Cli {
    /// Input .gltf file
    #[arg(short, long)]
    input: PathBuf,

    /// Keep byte-identical accessors instead of merging them
    #[arg(long)]
    keep_duplicate_accessors: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let input_ext = Path::new(&cli.input)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    if input_ext != "gltf" {
        anyhow::bail!("Input file must be a .gltf file (GLB is not supported)");
    }

    let optimizer = GltfOptimizer::with_config(Config {
        dedupe_accessors: !cli.keep_duplicate_accessors,
    });

    match optimizer
        .optimize_file(&cli.input)
        .map_err(|e| anyhow::anyhow!("Failed to optimize: {}", e))?
    {
        Some(files) => {
            println!(
                "Wrote {} and {}",
                files.document_path.display(),
                files.payload_path.display()
            );
        }
        None => {
            println!("No duplicate bufferViews; input left as-is");
        }
    }

    Ok(())
}
