//! gltf-io CLI - Tool for inspecting and converting glTF/GLB files.

use gltf_io::glb::is_glb;
use gltf_io::util::percent_encode_path;
use gltf_io::{BufferSource, Decoder, DirectoryStore, Document, Error};
use std::env;
use std::io::Read;
use std::path::Path;
use std::process;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "off",
            _ => filtered_args.push(arg),
        }
    }
    init_logging(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let result = match filtered_args[0] {
        "info" | "i" => {
            require_args(&filtered_args, 2, "gltf-io info <file>");
            cmd_info(filtered_args[1])
        }
        "pack" | "p" => {
            require_args(&filtered_args, 3, "gltf-io pack <input> <output.glb>");
            cmd_pack(filtered_args[1], filtered_args[2])
        }
        "unpack" | "u" => {
            require_args(&filtered_args, 3, "gltf-io unpack <input.glb> <output.gltf>");
            cmd_unpack(filtered_args[1], filtered_args[2])
        }
        "embed" | "e" => {
            require_args(&filtered_args, 3, "gltf-io embed <input> <output.gltf>");
            cmd_embed(filtered_args[1], filtered_args[2])
        }
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        _ => {
            if Path::new(filtered_args[0]).exists() {
                cmd_info(filtered_args[0])
            } else {
                eprintln!("Unknown command: {}", filtered_args[0]);
                eprintln!();
                print_help();
                process::exit(1);
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// `RUST_LOG` wins over the command-line level when set.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gltf_io={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn require_args(args: &[&str], count: usize, usage: &str) {
    if args.len() < count {
        eprintln!("Error: missing arguments");
        eprintln!("Usage: {}", usage);
        process::exit(1);
    }
}

fn print_help() {
    println!("gltf-io - glTF/GLB toolkit");
    println!();
    println!("USAGE:");
    println!("    gltf-io [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info   <file>              Show transport mode and buffers");
    println!("    p, pack   <in> <out.glb>      Convert to GLB (first buffer into BIN chunk)");
    println!("    u, unpack <in.glb> <out.gltf> Convert to JSON with the BIN chunk as a .bin file");
    println!("    e, embed  <in> <out.gltf>     Convert to JSON with all buffers embedded");
    println!("    h, help                       Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Suppress log output");
    println!();
    println!("NOTES:");
    println!("    - Passing a file directly is equivalent to 'info'");
    println!("    - RUST_LOG overrides the verbosity flags");
}

/// Buffer sources as they were in the input, before any rewrite.
fn describe(doc: &Document) -> Vec<String> {
    doc.buffers
        .iter()
        .enumerate()
        .map(|(i, buffer)| {
            let source = match BufferSource::of(buffer) {
                BufferSource::BinaryChunk => "BIN chunk".to_string(),
                BufferSource::Embedded(_) => "embedded".to_string(),
                BufferSource::External(uri) => format!("external '{}'", uri),
            };
            let name = buffer.name.as_deref().unwrap_or("-");
            format!("  [{}] {:<16} {:>10} bytes  {}", i, name, buffer.byte_length, source)
        })
        .collect()
}

fn cmd_info(path: &str) -> gltf_io::Result<()> {
    info!("Opening file: {}", path);

    let bytes = std::fs::read(path)?;
    let base = Path::new(path).parent().unwrap_or_else(|| Path::new(""));
    let doc = Decoder::new(DirectoryStore::new(base)).decode_slice(&bytes)?;
    debug!("Decoded {} buffers", doc.buffers.len());

    let total: u64 = doc.buffers.iter().map(|b| b.byte_length).sum();

    println!("File: {}", path);
    println!("Mode: {}", if is_glb(&bytes) { "GLB (binary)" } else { "glTF (JSON)" });
    println!("Asset version: {}", doc.asset.version);
    if let Some(generator) = &doc.asset.generator {
        println!("Generator: {}", generator);
    }
    println!("Buffers: {} ({} bytes)", doc.buffers.len(), total);
    for line in describe(&doc) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_pack(input: &str, output: &str) -> gltf_io::Result<()> {
    info!("Packing {} -> {}", input, output);
    let mut doc = gltf_io::fs::open(input)?;

    for (i, buffer) in doc.buffers.iter_mut().enumerate() {
        if i == 0 && !buffer.is_embedded_resource() {
            buffer.uri = None;
        } else if buffer.uri().is_some() && !buffer.is_embedded_resource() {
            buffer.mark_embedded();
        }
    }

    gltf_io::fs::save(output, &mut doc, true)
}

fn cmd_unpack(input: &str, output: &str) -> gltf_io::Result<()> {
    info!("Unpacking {} -> {}", input, output);
    let mut magic = Vec::with_capacity(4);
    std::fs::File::open(input)?.take(4).read_to_end(&mut magic)?;
    if !is_glb(&magic) {
        return Err(Error::InvalidMagic);
    }
    let mut doc = gltf_io::fs::open(input)?;

    if let Some(first) = doc.buffers.first_mut() {
        if first.uri().is_none() {
            let stem = Path::new(output)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("buffer");
            let uri = format!("{}.bin", percent_encode_path(stem));
            debug!("BIN chunk -> {}", uri);
            first.uri = Some(uri);
        }
    }

    gltf_io::fs::save(output, &mut doc, false)
}

fn cmd_embed(input: &str, output: &str) -> gltf_io::Result<()> {
    info!("Embedding buffers {} -> {}", input, output);
    let mut doc = gltf_io::fs::open(input)?;

    for buffer in &mut doc.buffers {
        buffer.mark_embedded();
    }

    gltf_io::fs::save(output, &mut doc, false)
}
