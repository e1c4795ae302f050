//! Assembly of the environment context from `.env` and the process environment.

use std::ffi::OsString;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::context::EnvContext;

/// Build the context: `.env` entries first, then the process environment on top.
///
/// A missing `.env` file is not an error; a malformed one is. Process
/// variables whose name or value is not valid UTF-8 are left out.
pub fn load_context(env_file: Option<&Path>) -> Result<EnvContext> {
    load_context_from(env_file, std::env::vars_os())
}

/// Same as [`load_context`] with an explicit process environment.
pub fn load_context_from<I>(env_file: Option<&Path>, process: I) -> Result<EnvContext>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut pairs = Vec::new();
    if let Some(path) = env_file.filter(|path| path.exists()) {
        let entries = dotenvy::from_path_iter(path)
            .with_context(|| format!("open {}", path.display()))?;
        for entry in entries {
            let (key, value) = entry.with_context(|| format!("parse {}", path.display()))?;
            pairs.push((key, value));
        }
        debug!(path = %path.display(), entries = pairs.len(), "loaded env file");
    }
    for (key, value) in process {
        match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => pairs.push((key, value)),
            (Ok(key), Err(_)) => debug!(key = %key, "skipping non-UTF-8 environment value"),
            (Err(key), _) => debug!(key = ?key, "skipping non-UTF-8 environment name"),
        }
    }
    Ok(pairs.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(OsString, OsString)> {
        pairs
            .iter()
            .map(|(key, value)| (OsString::from(*key), OsString::from(*value)))
            .collect()
    }

    #[test]
    fn process_environment_wins_over_env_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(".env");
        fs::write(&path, "DB_HOST=from-file\nGEMINI_API_KEY=abc\n").expect("write");

        let ctx = load_context_from(Some(&path), vars(&[("DB_HOST", "from-process")]))
            .expect("load");

        assert_eq!(ctx.get("DB_HOST"), Some("from-process"));
        assert_eq!(ctx.get("GEMINI_API_KEY"), Some("abc"));
    }

    #[test]
    fn missing_env_file_is_ignored() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ctx = load_context_from(Some(&temp.path().join(".env")), vars(&[("A", "1")]))
            .expect("load");
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn malformed_env_file_errors() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(".env");
        fs::write(&path, "KEY='unterminated\n").expect("write");
        let err = load_context_from(Some(&path), Vec::new()).expect_err("malformed");
        assert!(format!("{err:#}").contains(".env"));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_process_values_are_skipped() {
        use std::os::unix::ffi::OsStringExt;

        let mut process = vars(&[("DB_HOST", "postgres")]);
        process.push((
            OsString::from("SOME_UNRELATED"),
            OsString::from_vec(vec![0xff, 0xfe]),
        ));
        process.push((OsString::from_vec(vec![0xff]), OsString::from("value")));

        let ctx = load_context_from(None, process).expect("load");

        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.get("DB_HOST"), Some("postgres"));
        assert!(!ctx.contains("SOME_UNRELATED"));
    }
}
