use crate::config::resolve_offset;
use crate::error::ShiftError;
use crate::shift::{shift_file, Rounding, ShiftOpts, ShiftReport};

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};

const DIVIDER: &str = "----------------------------------------";

#[derive(Debug, Clone)]
pub struct BatchOpts {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub offset_file: PathBuf,
    /// Takes precedence over `offset_file` when set.
    pub offset: Option<String>,
    pub rounding: Rounding,
    pub keep_trailing: bool,
}

impl BatchOpts {
    /// The `input/`, `output/` and `offset.txt` layout under `base`.
    pub fn in_dir(base: &Path) -> Self {
        Self {
            input_dir: base.join("input"),
            output_dir: base.join("output"),
            offset_file: base.join("offset.txt"),
            offset: None,
            rounding: Rounding::default(),
            keep_trailing: false,
        }
    }
}

#[derive(Debug)]
pub struct FileOutcome {
    pub name: String,
    pub result: Result<ShiftReport>,
}

#[derive(Debug)]
pub struct BatchReport {
    pub offset_secs: f64,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }
}

/// Lists the `.srt` files (any case) directly inside `input_dir`, by name.
pub fn discover(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(input_dir)
        .with_context(|| format!("Failed to read input folder: '{}'", input_dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to read input folder: '{}'", input_dir.display()))?
            .path();
        if path.is_file() && is_srt(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_srt(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("srt"))
}

/// Shifts every subtitle file in the input folder into the output folder.
/// Problems with the offset or the input folder stop the run before anything
/// is written; a failing file is reported and the rest carry on.
pub fn run_batch(opts: &BatchOpts) -> Result<BatchReport> {
    let offset_secs = resolve_offset(opts.offset.as_deref(), &opts.offset_file)?;
    let shift_opts = ShiftOpts::new(offset_secs, opts.rounding, opts.keep_trailing);

    if !opts.input_dir.exists() {
        fs::create_dir_all(&opts.input_dir).with_context(|| {
            format!("Failed to create input folder: '{}'", opts.input_dir.display())
        })?;
        info!("Created missing input folder at '{}'", opts.input_dir.display());
        return Err(ShiftError::MissingInput {
            path: opts.input_dir.clone(),
            hint: "Created the missing input folder. Put your .srt files there and run again"
                .to_string(),
        }
        .into());
    }

    let files = discover(&opts.input_dir)?;
    if files.is_empty() {
        return Err(ShiftError::MissingInput {
            path: opts.input_dir.clone(),
            hint: "No .srt files found in the input folder".to_string(),
        }
        .into());
    }

    if !opts.output_dir.exists() {
        fs::create_dir_all(&opts.output_dir).with_context(|| {
            format!("Failed to create output folder: '{}'", opts.output_dir.display())
        })?;
        println!("Created output directory: {}", opts.output_dir.display());
    }

    println!(
        "Applying offset of {} seconds to {} files...",
        offset_secs,
        files.len()
    );
    println!("{}", DIVIDER);

    let mut outcomes = Vec::with_capacity(files.len());
    for input in files {
        let file_name = match input.file_name() {
            Some(name) => name.to_owned(),
            None => continue,
        };
        let name = file_name.to_string_lossy().into_owned();
        let output = opts.output_dir.join(&file_name);

        let result = shift_file(&input, &output, &shift_opts);
        match &result {
            Ok(report) => {
                println!("[OK] {}", name);
                debug!("{}: {} lines, {} timing lines", name, report.lines, report.timing_lines);
            }
            Err(err) => println!("[ERROR] Could not process {}: {:#}", name, err),
        }
        outcomes.push(FileOutcome { name, result });
    }

    println!("{}", DIVIDER);
    println!("Batch processing complete.");

    Ok(BatchReport {
        offset_secs,
        outcomes,
    })
}
