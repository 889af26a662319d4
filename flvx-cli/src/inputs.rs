use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::AppError;

fn is_flv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("flv"))
}

/// Expands the command line inputs into the list of files to process.
///
/// Files are taken as given, whatever their extension. Directories contribute
/// the `.flv` files directly inside them, sorted by name.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, AppError> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .filter(|path| path.is_file() && is_flv(path))
                .collect();
            found.sort();
            debug!(dir = %input.display(), files = found.len(), "expanded directory");
            files.extend(found);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            return Err(AppError::InvalidInput(format!(
                "{} does not exist",
                input.display()
            )));
        }
    }

    if files.is_empty() {
        return Err(AppError::InvalidInput("no FLV files found".to_string()));
    }
    Ok(files)
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_directory_expansion() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.flv", "a.FLV", "c.mp4", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.flv")).unwrap();
        let single = dir.path().join("c.mp4");

        let files = collect_inputs(&[dir.path().to_path_buf(), single.clone()]).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.FLV"), dir.path().join("b.flv"), single]
        );
    }

    #[test]
    fn test_missing_and_empty_inputs() {
        let dir = tempfile::tempdir().unwrap();

        let missing = collect_inputs(&[dir.path().join("gone.flv")]);
        assert!(matches!(missing, Err(AppError::InvalidInput(_))));

        let empty = collect_inputs(&[dir.path().to_path_buf()]);
        assert!(matches!(empty, Err(AppError::InvalidInput(msg)) if msg == "no FLV files found"));
    }
}
