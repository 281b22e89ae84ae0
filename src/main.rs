//! cachefilter: Doxygen input filter for Caché ObjectScript class definitions.
//!
//! Doxygen runs the filter once per `.cls` file and reads the translated,
//! C++-like text from stdout:
//!
//! - **pipeline mode**: `cachefilter Demo.Person.cls`
//! - **debug mode**: `cachefilter --debug -o out Demo.Person.cls` also writes
//!   the same bytes to `out/Demo.Person.cpp`
//! - **aliases**: `cachefilter --print-aliases` prints the Doxyfile `ALIASES`
//!   the rewritten doc comments rely on

mod classify;
mod doc;
mod emit;
mod error;
mod model;
mod reader;
mod scan;
mod translate;

use anyhow::{Context, Result};
use clap::Parser;
use error::FilterError;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cachefilter",
    version,
    about = "Translate Caché ObjectScript class definitions into C++-like declarations for Doxygen"
)]
struct Cli {
    /// Class definition file (.cls)
    #[arg(required_unless_present = "print_aliases")]
    input: Option<PathBuf>,

    /// Also write the output to <OUTPUT_DIR>/<file stem>.cpp
    #[arg(short, long)]
    debug: bool,

    /// Directory for debug artifacts
    #[arg(short = 'o', long, default_value = "output")]
    output_dir: PathBuf,

    /// Log translation details to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Print the Doxyfile ALIASES used by rewritten doc comments and exit
    #[arg(long)]
    print_aliases: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.print_aliases {
        for alias in doc::Alias::ALL {
            println!("{}", alias.doxygen_definition());
        }
        return Ok(());
    }

    let input = cli.input.as_deref().context("no input file given")?;
    let source = reader::read(input)?;
    let output = emit::translate(&source);

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(&output)
        .and_then(|()| stdout.flush())
        .context("failed to write stdout")?;

    if cli.debug {
        let path = write_artifact(&cli.output_dir, input, &output)?;
        info!("Wrote debug artifact {}", path.display());
    }
    Ok(())
}

/// Logs go to stderr; stdout carries only the translated text.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

/// `<output_dir>/<stem>.cpp`, where the stem drops only the last extension.
fn artifact_path(output_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output_dir.join(format!("{stem}.cpp"))
}

fn write_artifact(output_dir: &Path, input: &Path, output: &[u8]) -> error::Result<PathBuf> {
    fs::create_dir_all(output_dir).map_err(|source| FilterError::CreateDir {
        path: output_dir.to_path_buf(),
        source,
    })?;
    let path = artifact_path(output_dir, input);
    fs::write(&path, output).map_err(|source| FilterError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_keeps_package_dots() {
        assert_eq!(
            artifact_path(Path::new("out"), Path::new("src/Demo.Person.cls")),
            PathBuf::from("out/Demo.Person.cpp")
        );
    }

    #[test]
    fn artifact_without_extension() {
        assert_eq!(
            artifact_path(Path::new("out"), Path::new("Widget")),
            PathBuf::from("out/Widget.cpp")
        );
    }

    #[test]
    fn writes_artifact_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/output");
        let path = write_artifact(&out, Path::new("A.cls"), b"class A\n").unwrap();
        assert_eq!(fs::read(path).unwrap(), b"class A\n");
    }

    #[test]
    fn cli_requires_input_unless_printing_aliases() {
        assert!(Cli::try_parse_from(["cachefilter"]).is_err());
        assert!(Cli::try_parse_from(["cachefilter", "--print-aliases"]).is_ok());
        let cli = Cli::try_parse_from(["cachefilter", "-d", "A.cls"]).unwrap();
        assert!(cli.debug);
        assert_eq!(cli.output_dir, PathBuf::from("output"));
    }
}
