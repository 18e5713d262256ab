//! Recursive file selection

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

/// Named capture groups of a matching path
pub type Captures = HashMap<String, String>;

/// Recursively select files under `roots`
///
/// Directories are walked; plain paths are taken as they are. With a
/// `regex`, only paths it matches are kept, and if a `selector` is also
/// given it decides on the named groups of the match. Returned paths are
/// absolute, in walk order.
pub fn select_files<P>(
    roots: &[P],
    regex: Option<&Regex>,
    selector: Option<&dyn Fn(&Captures) -> bool>,
) -> io::Result<Vec<PathBuf>>
where
    P: AsRef<Path>,
{
    let cwd = std::env::current_dir()?;
    let mut selected = Vec::new();

    for root in roots {
        let root = root.as_ref();
        if root.is_dir() {
            for entry in WalkDir::new(root)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if entry.file_type().is_file() && accept(entry.path(), regex, selector) {
                    selected.push(cwd.join(entry.path()));
                }
            }
        } else if accept(root, regex, selector) {
            selected.push(cwd.join(root));
        }
    }

    tracing::debug!(count = selected.len(), "files selected");
    Ok(selected)
}

fn accept(path: &Path, regex: Option<&Regex>, selector: Option<&dyn Fn(&Captures) -> bool>) -> bool {
    let Some(regex) = regex else {
        return true;
    };

    let text = path.to_string_lossy();
    let Some(caps) = regex.captures(&text) else {
        tracing::trace!(path = %text, "pattern does not match");
        return false;
    };

    let groups: Captures = regex
        .capture_names()
        .flatten()
        .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
        .collect();

    selector.map_or(true, |select| select(&groups))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("2009/044")).unwrap();
        fs::create_dir_all(dir.path().join("2010/001")).unwrap();
        fs::write(dir.path().join("2009/044/GE.RGN.2009.044.yaml"), "").unwrap();
        fs::write(dir.path().join("2009/044/notes.txt"), "").unwrap();
        fs::write(dir.path().join("2010/001/GE.RGN.2010.001.yaml"), "").unwrap();
        dir
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn walks_directories() {
        let dir = tree();
        let files = select_files(&[dir.path()], None, None).unwrap();

        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn regex_filters_paths() {
        let dir = tree();
        let regex = Regex::new(r"\.yaml$").unwrap();
        let files = select_files(&[dir.path()], Some(&regex), None).unwrap();

        assert_eq!(
            names(&files),
            vec!["GE.RGN.2009.044.yaml", "GE.RGN.2010.001.yaml"]
        );
    }

    #[test]
    fn selector_sees_named_groups() {
        let dir = tree();
        let regex = Regex::new(r"(?P<year>\d{4})\.(?P<doy>\d{3})\.yaml$").unwrap();
        let in_2009 = |groups: &Captures| groups.get("year").map(String::as_str) == Some("2009");

        let files = select_files(&[dir.path()], Some(&regex), Some(&in_2009)).unwrap();
        assert_eq!(names(&files), vec!["GE.RGN.2009.044.yaml"]);
    }

    #[test]
    fn plain_file_roots() {
        let dir = tree();
        let file = dir.path().join("2009/044/notes.txt");
        let files = select_files(&[&file], None, None).unwrap();
        assert_eq!(files, vec![file]);
    }
}
