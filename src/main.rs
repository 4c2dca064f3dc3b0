//! Prepares init/val/pool/test arrays for an active-learning run.

use std::path::PathBuf;

use alprep::app_dirs;
use alprep::export::export_arrays;
use alprep::logging;
use alprep::{ActiveLearningData, PrepConfig};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    if let Err(err) = logging::init(options.verbose) {
        eprintln!("File logging disabled: {err}");
        if let Err(err) = logging::init_stdout_only(options.verbose) {
            eprintln!("Logging disabled: {err}");
        }
    }

    let config = resolve_config(&options)?;
    if let Some(path) = &options.write_config {
        config.save_to(path).map_err(|err| err.to_string())?;
        println!("Wrote effective config to {}", path.display());
    }

    let data = ActiveLearningData::load(&config).map_err(|err| err.to_string())?;
    let (arrays, summary) = data.into_arrays();
    println!("classes: {}", summary.class_names.join(", "));
    for (name, batch) in arrays.named() {
        println!("{name:<5} X={:?} y={:?}", batch.x.shape(), batch.y.shape());
    }
    println!("Initial training data points: {}", summary.initial_len);
    println!(
        "Data distribution for each class: {:?}",
        summary.initial_distribution
    );

    if let Some(out_dir) = &options.out_dir {
        let exported = export_arrays(&arrays, &summary, out_dir).map_err(|err| err.to_string())?;
        println!(
            "Wrote {} arrays to {} (manifest {})",
            exported.files_written,
            exported.out_dir.display(),
            exported.manifest_path.display()
        );
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq)]
struct CliOptions {
    config_path: Option<PathBuf>,
    train_dir: Option<PathBuf>,
    test_dir: Option<PathBuf>,
    train_size: Option<usize>,
    val_size: Option<usize>,
    image_size: Option<u32>,
    seed_per_class: Option<usize>,
    test_limit: Option<usize>,
    seed: Option<u64>,
    out_dir: Option<PathBuf>,
    write_config: Option<PathBuf>,
    verbose: bool,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        match flag {
            "-h" | "--help" => return Err(help_text()),
            "-v" | "--verbose" => options.verbose = true,
            "--config" => options.config_path = Some(PathBuf::from(value(&args, &mut idx)?)),
            "--train-dir" => options.train_dir = Some(PathBuf::from(value(&args, &mut idx)?)),
            "--test-dir" => options.test_dir = Some(PathBuf::from(value(&args, &mut idx)?)),
            "--out" => options.out_dir = Some(PathBuf::from(value(&args, &mut idx)?)),
            "--write-config" => {
                options.write_config = Some(PathBuf::from(value(&args, &mut idx)?));
            }
            "--train-size" => options.train_size = Some(parse_value(&args, &mut idx)?),
            "--val-size" => options.val_size = Some(parse_value(&args, &mut idx)?),
            "--image-size" => options.image_size = Some(parse_value(&args, &mut idx)?),
            "--seed-per-class" => options.seed_per_class = Some(parse_value(&args, &mut idx)?),
            "--test-limit" => options.test_limit = Some(parse_value(&args, &mut idx)?),
            "--seed" => options.seed = Some(parse_value(&args, &mut idx)?),
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn value<'a>(args: &'a [String], idx: &mut usize) -> Result<&'a str, String> {
    let flag = &args[*idx];
    *idx += 1;
    args.get(*idx)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn parse_value<T: std::str::FromStr>(args: &[String], idx: &mut usize) -> Result<T, String> {
    let flag = args[*idx].clone();
    let raw = value(args, idx)?;
    raw.parse::<T>()
        .map_err(|_| format!("Invalid {flag} value: {raw}"))
}

/// Explicit `--config`, else `.alprep/config.toml` when present, else defaults;
/// command-line flags override file values.
fn resolve_config(options: &CliOptions) -> Result<PrepConfig, String> {
    let mut config = match &options.config_path {
        Some(path) => {
            if !path.is_file() {
                return Err(format!("Config file not found: {}", path.display()));
            }
            PrepConfig::load_from(path).map_err(|err| err.to_string())?
        }
        None => match app_dirs::default_config_path() {
            Ok(path) => PrepConfig::load_from(&path).map_err(|err| err.to_string())?,
            Err(_) => PrepConfig::default(),
        },
    };
    apply_overrides(&mut config, options);
    config.validate().map_err(|err| err.to_string())?;
    Ok(config)
}

fn apply_overrides(config: &mut PrepConfig, options: &CliOptions) {
    if let Some(dir) = &options.train_dir {
        config.train_dir = dir.clone();
    }
    if let Some(dir) = &options.test_dir {
        config.test_dir = dir.clone();
    }
    if let Some(size) = options.train_size {
        config.train_size = size;
    }
    if let Some(size) = options.val_size {
        config.val_size = size;
    }
    if let Some(size) = options.image_size {
        config.image_size = size;
    }
    if let Some(count) = options.seed_per_class {
        config.seed_per_class = count;
    }
    if options.test_limit.is_some() {
        config.test_limit = options.test_limit;
    }
    if options.seed.is_some() {
        config.seed = options.seed;
    }
}

fn help_text() -> String {
    [
        "alprep",
        "",
        "Splits a class-per-folder image dataset into init/val/pool/test arrays.",
        "",
        "Usage:",
        "  alprep [--config <file>] [options]",
        "",
        "Options:",
        "  --config <file>         TOML settings (default: .alprep/config.toml if present).",
        "  --train-dir <dir>       Training corpus root (default: dataset/Training).",
        "  --test-dir <dir>        Test corpus root (default: dataset/Testing).",
        "  --train-size <n>        Size of train_all (default: 1000).",
        "  --val-size <n>          Validation size; the pool gets the rest (default: 100).",
        "  --image-size <n>        Square resize target (default: 64).",
        "  --seed-per-class <n>    Initial labeled records per class (default: 2).",
        "  --test-limit <n>        Keep at most n shuffled test records.",
        "  --seed <u64>            RNG seed up to 2^63-1 (default: drawn and logged).",
        "  --out <dir>             Write X_*/y_*.npy and manifest.json here.",
        "  --write-config <file>   Save the effective settings as TOML.",
        "  -v, --verbose           Debug logging unless RUST_LOG is set.",
    ]
    .join("\n")
}
