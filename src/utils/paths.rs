//! Path normalization and environment-qualified file names

use std::path::Path;

pub fn normalize_path(path: &str) -> String {
    // Convert backslashes to forward slashes and normalize
    path.replace('\\', "/")
}

/// Display form of a path with forward slashes and no leading `./`.
pub fn display_path(path: &Path) -> String {
    let normalized = normalize_path(&path.to_string_lossy());
    match normalized.strip_prefix("./") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => normalized,
    }
}

/// Insert `-<env>` immediately before the extension of the final path component.
///
/// `app.yaml` + `prod` gives `app-prod.yaml`; names without an extension (or
/// dotfiles such as `.env`) get the suffix appended.
pub fn with_env_suffix(filename: &str, env: &str) -> String {
    let name_start = filename.rfind(['/', '\\']).map(|i| i + 1).unwrap_or(0);
    let name = &filename[name_start..];

    match name.rfind('.') {
        Some(dot) if dot > 0 => {
            let split = name_start + dot;
            format!("{}-{}{}", &filename[..split], env, &filename[split..])
        }
        _ => format!("{filename}-{env}"),
    }
}
