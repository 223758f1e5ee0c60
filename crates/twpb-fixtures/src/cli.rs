//! Logic behind the `twpb-generate` and `twpb-check` binaries.
//!
//! - `twpb-generate [--out DIR]` writes every fixture file into `DIR`.
//! - `twpb-check [--dir DIR]` decodes every fixture file in `DIR` and
//!   verifies each expected field.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FixtureError;
use crate::schemas::Schemas;
use crate::vectors::fixtures;

/// Directory used when no flag is given.
pub const DEFAULT_FIXTURE_DIR: &str = "fixtures/bin";

/// Encodes every fixture into `dir`, creating it if needed. Returns the
/// paths written.
pub fn generate(dir: &Path) -> Result<Vec<PathBuf>, FixtureError> {
    fs::create_dir_all(dir).map_err(|source| FixtureError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let schemas = Schemas::load()?;
    let mut written = Vec::new();
    for fixture in fixtures(&schemas)? {
        let bytes = fixture.encode()?;
        let path = dir.join(fixture.file_name);
        fs::write(&path, &bytes).map_err(|source| FixtureError::Io {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }
    Ok(written)
}

/// Verifies every fixture file in `dir`, stopping at the first failure.
/// Returns the names of the files checked.
pub fn check(dir: &Path) -> Result<Vec<&'static str>, FixtureError> {
    let schemas = Schemas::load()?;
    let mut checked = Vec::new();
    for fixture in fixtures(&schemas)? {
        let path = dir.join(fixture.file_name);
        let bytes = fs::read(&path).map_err(|source| FixtureError::Io { path, source })?;
        fixture.verify(&bytes)?;
        checked.push(fixture.file_name);
    }
    Ok(checked)
}

/// Reads the directory flag from command-line arguments (program name
/// excluded). Anything other than `flag DIR` is a usage error.
pub fn dir_arg(args: &[String], flag: &str) -> Result<PathBuf, FixtureError> {
    let mut dir = PathBuf::from(DEFAULT_FIXTURE_DIR);
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            a if a == flag => {
                i += 1;
                match args.get(i) {
                    Some(d) => dir = PathBuf::from(d),
                    None => return Err(FixtureError::Usage(format!("{flag} needs a directory"))),
                }
            }
            other => {
                return Err(FixtureError::Usage(format!(
                    "unexpected argument: {other} (usage: [{flag} DIR])"
                )))
            }
        }
        i += 1;
    }
    Ok(dir)
}
