#![forbid(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tmod_rs::{extract, package_root, DirectorySink, ExtractOptions, PackageReader};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tmod-unpack", version, about = "Unpack a TMOD mod package into a directory")]
struct Cli {
    /// Package file to unpack.
    file: PathBuf,

    /// Directory the package folder is created in.
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// List entries instead of extracting.
    #[arg(long, default_value_t = false)]
    list: bool,

    /// With --list, print header and entries as JSON.
    #[arg(long, default_value_t = false, requires = "list")]
    json: bool,

    /// Write .rawimg entries as-is instead of converting them to PNG.
    #[arg(long, default_value_t = false)]
    keep_raw_images: bool,

    /// Skip raw images that fail to decode instead of aborting.
    #[arg(long, default_value_t = false)]
    skip_malformed_images: bool,

    /// Fail instead of replacing files that already exist.
    #[arg(long, default_value_t = false)]
    no_overwrite: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut reader = PackageReader::open(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;

    if cli.list {
        return list(&reader, cli.json);
    }

    let header = reader.header();
    println!("Found valid header");
    println!("Version: {}", header.loader_version);
    println!("Mod Name: {}", header.name);
    println!("Mod Version: {}", header.version);

    let root = package_root(&cli.output, &header.name)?;
    let mut sink = DirectorySink::new(&root).with_overwrite(!cli.no_overwrite);
    let options = ExtractOptions::default()
        .with_convert_raw_images(!cli.keep_raw_images)
        .with_skip_malformed_images(cli.skip_malformed_images);

    println!("Unpacking...");
    let summary = extract(&mut reader, &mut sink, &options)
        .with_context(|| format!("failed to unpack into {}", root.display()))?;

    for path in &summary.skipped {
        println!("Skipped malformed image: {path}");
    }
    println!(
        "Unpacked! {} files, {} images into {}",
        summary.files_written,
        summary.images_converted,
        root.display()
    );
    Ok(())
}

fn list<R: std::io::Read + std::io::Seek>(reader: &PackageReader<R>, json: bool) -> anyhow::Result<()> {
    let info = reader.info();
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{} {} (loader {})", info.name, info.version, info.loader_version);
    println!("hash: {}", info.hash);
    for entry in &info.entries {
        println!(
            "{:>10} {:>10} {} {}",
            entry.size,
            entry.stored_len,
            if entry.compressed { "deflate" } else { "stored " },
            entry.path
        );
    }
    Ok(())
}
