use std::path::{Path, PathBuf};

use url::Url;

const DEFAULT_FILENAME: &str = "video";
const DEFAULT_EXTENSION: &str = "mp4";

/// Sanitize filename to remove invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .trim_matches(|c| c == '.' || c == ' ')
        .to_string()
}

/// Suggested local filename for an artifact, taken from the last path segment.
pub fn filename_from_url(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(sanitize_filename)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string());

    if Path::new(&segment).extension().is_some() {
        segment
    } else {
        format!("{}.{}", segment, DEFAULT_EXTENSION)
    }
}

/// Sibling file a transfer writes to before it is renamed into place.
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

fn is_taken(path: &Path) -> bool {
    path.exists() || partial_path(path).exists()
}

/// First path in `dir` named `filename`, `stem (1).ext`, `stem (2).ext`, ... that neither
/// exists nor is being written by an unfinished transfer.
pub fn unique_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !is_taken(&candidate) {
        return candidate;
    }

    let name = Path::new(filename);
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string());
    let extension = name.extension().map(|e| e.to_string_lossy().into_owned());

    (1..)
        .map(|n| match &extension {
            Some(ext) => dir.join(format!("{} ({}).{}", stem, n, ext)),
            None => dir.join(format!("{} ({})", stem, n)),
        })
        .find(|path| !is_taken(path))
        .unwrap_or(candidate)
}
