//! SqPack CLI - command-line tool for reading SqPack game archives.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use sqpack::pack::TypedHeader;
use sqpack::prelude::*;

/// SqPack - read files out of SqPack game archives
#[derive(Parser)]
#[command(name = "sqpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the `sqpack` directory
    #[arg(short, long, global = true, env = "SQPACK_ROOT", default_value = ".")]
    root: PathBuf,

    /// Load data containers into memory instead of streaming them
    #[arg(long, global = true)]
    resident: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the hashes and archive of a game path
    Hash {
        /// Game path, e.g. `exd/root.exl`
        path: String,
    },

    /// Show where a file is stored and what its header says
    Info {
        /// Game path
        path: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract one file
    Extract {
        /// Game path
        path: String,

        /// Output file (defaults to the file name)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write textures as DDS
        #[arg(long)]
        dds: bool,
    },

    /// Extract every path listed in a text file
    ExtractList {
        /// File with one game path per line
        list: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Write textures as DDS
        #[arg(long)]
        dds: bool,
    },

    /// List the directories of the archive holding a path
    Ls {
        /// Game path or directory, e.g. `bg/ffxiv`
        path: String,

        /// Also list files
        #[arg(short, long)]
        files: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Hash { path } => cmd_hash(&path),
        Commands::Info { path, json } => cmd_info(&open(&cli.root, cli.resident)?, &path, json),
        Commands::Extract { path, output, dds } => {
            cmd_extract(&open(&cli.root, cli.resident)?, &path, output, dds)
        }
        Commands::ExtractList { list, output, dds } => {
            cmd_extract_list(&open(&cli.root, cli.resident)?, &list, &output, dds)
        }
        Commands::Ls { path, files } => cmd_ls(&open(&cli.root, cli.resident)?, &path, files),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open(root: &Path, resident: bool) -> Result<PackManager> {
    let residency = if resident {
        Residency::Resident
    } else {
        Residency::Streamed
    };
    sqpack::open_with(root, PackOptions::new().residency(residency))
        .with_context(|| format!("Failed to open sqpack directory {}", root.display()))
}

fn cmd_hash(path: &str) -> Result<()> {
    let (dir, file) = hash::split_path(path);
    let (dir_hash, file_hash) = hash::path_hashes(path);

    println!("directory  {dir:<40} {dir_hash:08x}");
    println!("file       {file:<40} {file_hash:08x}");
    println!("full path  {path:<40} {:08x}", hash::full_path_hash(path));
    println!("index key  {:016x}", hash::combined_key(dir_hash, file_hash));

    match ArchiveIdentity::from_path(path) {
        Ok(identity) => println!("archive    {identity} ({})", identity.file_stem()),
        Err(e) => println!("archive    {e}"),
    }
    Ok(())
}

fn cmd_info(manager: &PackManager, path: &str, json: bool) -> Result<()> {
    let (pack, entry) = manager
        .get_file(path)
        .with_context(|| format!("Failed to find {path}"))?;
    let file = pack.open_file(&entry).context("Failed to read file header")?;

    let common = *file.header().common();
    let (file_size, header_size, block_count) =
        (common.file_size, common.header_size, common.block_count);

    let mut details = serde_json::Map::new();
    match file.header() {
        TypedHeader::Generic { blocks, .. } => {
            details.insert("block_table".into(), blocks.len().into());
        }
        TypedHeader::Model { header, .. } => {
            details.insert("lods".into(), header.lods().into());
            if let Some(layout) = file.model_layout()? {
                let regions: serde_json::Map<String, serde_json::Value> = layout
                    .iter()
                    .map(|(region, range)| (region.to_string(), serde_json::json!([range.start, range.end])))
                    .collect();
                details.insert("regions".into(), regions.into());
            }
        }
        TypedHeader::Texture { texture, lods, .. } => {
            let format = texture
                .format()
                .map_or_else(|e| e.to_string(), |f| format!("{f:?}"));
            details.insert("format".into(), format.into());
            details.insert("width".into(), texture.width().into());
            details.insert("height".into(), texture.height().into());
            details.insert("depth".into(), texture.depth().into());
            details.insert("mip_levels".into(), texture.mip_levels().into());
            details.insert("lods".into(), lods.len().into());
        }
    }

    if json {
        let value = serde_json::json!({
            "path": path,
            "identity": pack.identity(),
            "container": entry.container_id(),
            "block_offset": entry.block_offset(),
            "byte_offset": entry.byte_offset(),
            "key": format!("{:#x}", entry.key()),
            "index": format!("{:?}", entry.index_kind()),
            "type": file.kind().name(),
            "file_size": file_size,
            "header_size": header_size,
            "blocks": block_count,
            "details": details,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{path}");
    println!("  archive     {}", pack.identity());
    println!(
        "  location    {} @ {:#x} (block {})",
        pack.containers().path(entry.container_id()).display(),
        entry.byte_offset(),
        entry.block_offset()
    );
    println!("  type        {}", file.kind().name());
    println!("  size        {file_size} bytes");
    println!("  header      {header_size:#x} bytes, {block_count} blocks");
    for (name, value) in &details {
        println!("  {name:<11} {value}");
    }
    Ok(())
}

fn decode(manager: &PackManager, path: &str, dds: bool) -> Result<Vec<u8>> {
    let typed = manager.read_typed(path)?;
    if dds && typed.kind() == FileType::Texture {
        return Ok(typed.to_dds()?);
    }
    Ok(typed.payload)
}

/// Relative output path for a game path, or `None` if it would leave the
/// output directory.
fn contained_output(path: &str, dds: bool) -> Option<PathBuf> {
    let name = output_name(path, dds);
    name.components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then_some(name)
}

fn output_name(path: &str, dds: bool) -> PathBuf {
    let path = PathBuf::from(path);
    if dds && path.extension().is_some_and(|ext| ext == "tex") {
        path.with_extension("dds")
    } else {
        path
    }
}

fn cmd_extract(manager: &PackManager, path: &str, output: Option<PathBuf>, dds: bool) -> Result<()> {
    let data = decode(manager, path, dds).with_context(|| format!("Failed to extract {path}"))?;

    let output = match output {
        Some(output) => output,
        None => match output_name(path, dds).file_name() {
            Some(name) => PathBuf::from(name),
            None => bail!("Cannot derive an output name from {path}"),
        },
    };
    fs::write(&output, &data).with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Wrote {} bytes to {}", data.len(), output.display());
    Ok(())
}

fn cmd_extract_list(manager: &PackManager, list: &Path, output: &Path, dds: bool) -> Result<()> {
    let text = fs::read_to_string(list).with_context(|| format!("Failed to read {}", list.display()))?;
    let paths: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();

    println!("Extracting {} files...", paths.len());

    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    fs::create_dir_all(output)?;

    let start = Instant::now();
    let failed = AtomicUsize::new(0);
    paths.par_iter().for_each(|path| {
        let extract = || -> Result<()> {
            let Some(name) = contained_output(path, dds) else {
                bail!("refusing to write outside {}", output.display());
            };
            let data = decode(manager, path, dds)?;
            let target = output.join(name);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, data)?;
            Ok(())
        };
        if let Err(e) = extract() {
            warn!("{path}: {e:#}");
            failed.fetch_add(1, Ordering::Relaxed);
        }
        pb.inc(1);
    });

    pb.finish_with_message("Done");
    let failed = failed.into_inner();
    println!(
        "Extracted {} files in {:?} ({failed} failed)",
        paths.len() - failed,
        start.elapsed()
    );
    Ok(())
}

fn cmd_ls(manager: &PackManager, path: &str, files: bool) -> Result<()> {
    let pack = manager
        .get_pack(path)
        .with_context(|| format!("Failed to open archive for {path}"))?;
    println!("{}", pack.identity());

    for index in pack.indexes() {
        println!(
            "{} ({:?}, {} files)",
            index.name(),
            index.kind(),
            index.entry_count()?
        );

        if index.is_flat() {
            if files {
                for entry in index.entries()? {
                    println!("  {:08x}  {:?}", entry.file_hash(), entry.location());
                }
            }
            continue;
        }

        for dir in index.directories() {
            let name = dir.path().unwrap_or_else(|| format!("~{:08x}", dir.hash()));
            let entries = index.files_in(dir)?;
            println!("  {name:<48} {:>6} files", entries.len());
            if files {
                for entry in entries {
                    println!("    {:08x}  {:?}", entry.file_hash(), entry.location());
                }
            }
        }
    }
    Ok(())
}
