use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbUrlError {
    Blank,
    MissingPath { raw: String },
}

impl fmt::Display for DbUrlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbUrlError::Blank => write!(f, "--db must not be blank"),
            DbUrlError::MissingPath { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for DbUrlError {}

fn is_in_memory(url: &str) -> bool {
    url == "sqlite::memory:" || url.contains("mode=memory")
}

/// Turn a bare path or relative `sqlite:` URL into an absolute `sqlite://` URL.
///
/// Query parameters such as `mode=rwc` are kept.
pub fn normalize_sqlite_url(raw: &str) -> Result<String, DbUrlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DbUrlError::Blank);
    }
    if is_in_memory(trimmed) || trimmed.starts_with("sqlite://") {
        return Ok(trimmed.to_owned());
    }

    let without_scheme = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let (path_str, query) = match without_scheme.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (without_scheme, None),
    };
    if path_str.is_empty() {
        return Err(DbUrlError::MissingPath {
            raw: raw.to_owned(),
        });
    }

    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };

    Ok(match query {
        Some(query) => format!("sqlite://{}?{query}", absolute.display()),
        None => format!("sqlite://{}", absolute.display()),
    })
}

/// Create the directory that will hold the database. The file itself is
/// created on first connect.
pub fn prepare_sqlite_dir(db_url: &str) -> anyhow::Result<()> {
    if is_in_memory(db_url) {
        return Ok(());
    }
    let Some(rest) = db_url.strip_prefix("sqlite://") else {
        return Err(DbUrlError::MissingPath {
            raw: db_url.to_owned(),
        }
        .into());
    };
    let file = rest.split_once('?').map_or(rest, |(path, _)| path);
    if let Some(dir) = Path::new(file).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}
