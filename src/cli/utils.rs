//! Shared CLI utilities.

/// Split stem arguments on commas, trimming whitespace and discarding empty
/// segments, so `app,db` and `app db` mean the same thing.
pub fn split_stems(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|s| s.split(','))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.to_string())
        .collect()
}
