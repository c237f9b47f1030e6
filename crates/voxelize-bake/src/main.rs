use std::path::PathBuf;
use std::process;

use voxelize_bake::bake::{bake_file, BakeOptions};
use voxelize_bake::headless::{load_config, run_voxelize, FrameOptions};
use voxelize_bake::report;

fn usage() {
    eprintln!("Usage:");
    eprintln!("  xraw-bake bake <file.xraw>... [--out <dir>] [--sidecar] [--json <path>]");
    eprintln!("  xraw-bake voxelize <texture.png> [--config <file.ron>] [--render <out.png>]");
    eprintln!("                     [--size <w>x<h>] [--json <path>]");
}

fn next_arg(args: &[String], i: &mut usize, flag: &str) -> String {
    *i += 1;
    match args.get(*i) {
        Some(value) => value.clone(),
        None => {
            eprintln!("Missing value for {}", flag);
            process::exit(1);
        }
    }
}

fn parse_size(value: &str) -> Option<(u32, u32)> {
    let (w, h) = value.split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("bake") => bake(&args),
        Some("voxelize") => voxelize(&args),
        Some("--help") | Some("-h") => {
            usage();
            process::exit(0);
        }
        _ => {
            usage();
            process::exit(1);
        }
    }
}

fn bake(args: &[String]) {
    let mut inputs = Vec::new();
    let mut out_dir = PathBuf::from(".");
    let mut sidecar = false;
    let mut json_path: Option<PathBuf> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--out" => out_dir = PathBuf::from(next_arg(args, &mut i, "--out")),
            "--sidecar" => sidecar = true,
            "--json" => json_path = Some(PathBuf::from(next_arg(args, &mut i, "--json"))),
            other if other.starts_with("--") => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
            other => inputs.push(PathBuf::from(other)),
        }
        i += 1;
    }

    if inputs.is_empty() {
        usage();
        process::exit(1);
    }

    let options = BakeOptions { out_dir, sidecar };
    let mut reports = Vec::new();
    let mut failures = 0;
    for input in &inputs {
        match bake_file(input, &options) {
            Ok(result) => {
                println!("\n## {}\n", result.canonical_name);
                println!("{}", report::format_bake_markdown(&result));
                reports.push(result);
            }
            Err(e) => {
                log::error!("{}", e);
                failures += 1;
            }
        }
    }

    if let Some(ref path) = json_path {
        if let Err(e) = report::save_report(path, &reports) {
            log::error!("Failed to save report: {}", e);
            process::exit(1);
        }
        log::info!("Saved report to {}", path.display());
    }

    if failures > 0 {
        eprintln!("ERROR: {} of {} files failed", failures, inputs.len());
        process::exit(1);
    }
}

fn voxelize(args: &[String]) {
    let mut input: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut render_path: Option<PathBuf> = None;
    let mut size = (512u32, 512u32);
    let mut json_path: Option<PathBuf> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => config_path = Some(PathBuf::from(next_arg(args, &mut i, "--config"))),
            "--render" => render_path = Some(PathBuf::from(next_arg(args, &mut i, "--render"))),
            "--size" => {
                let value = next_arg(args, &mut i, "--size");
                size = match parse_size(&value) {
                    Some(size) => size,
                    None => {
                        eprintln!("Invalid --size value: {}", value);
                        process::exit(1);
                    }
                };
            }
            "--json" => json_path = Some(PathBuf::from(next_arg(args, &mut i, "--json"))),
            other if other.starts_with("--") => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
            other => input = Some(PathBuf::from(other)),
        }
        i += 1;
    }

    let Some(input) = input else {
        usage();
        process::exit(1);
    };

    let config = match load_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    };

    let frame = render_path.map(|path| FrameOptions {
        path,
        width: size.0,
        height: size.1,
    });

    log::info!("Initializing GPU...");
    let result = match run_voxelize(&input, &config, frame.as_ref()) {
        Ok(result) => result,
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    };

    println!("\n## Voxelization\n");
    println!("{}", report::format_voxelize_markdown(&result));

    if let Some(ref path) = json_path {
        if let Err(e) = report::save_report(path, &result) {
            log::error!("Failed to save report: {}", e);
            process::exit(1);
        }
        log::info!("Saved report to {}", path.display());
    }

    if result.dropped > 0 {
        log::warn!(
            "{} visible voxels did not fit the {}-slot grid",
            result.dropped,
            result.capacity
        );
    }
}
