use std::{collections::HashMap, path::PathBuf, sync::Arc};

use crate::error::LoadError;

/// Read-only access to source bytes by path, e.g. "data/lowincome.csv"
/// or "https://example.org/counties.geojson".
pub trait SourceReader: Send + Sync {
    fn read(&self, path: &str) -> Result<Arc<[u8]>, LoadError>;
}

/// Local files, with relative paths resolved against `root`.
pub struct DiskSource {
    root: PathBuf,
}

impl DiskSource {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    fn full(&self, path: &str) -> PathBuf { self.root.join(path) }
}

impl SourceReader for DiskSource {
    fn read(&self, path: &str) -> Result<Arc<[u8]>, LoadError> {
        let full = self.full(path);
        std::fs::read(&full)
            .map(Arc::from)
            .map_err(|e| LoadError::unreachable(path, format!("{}: {e}", full.display())))
    }
}

/// Remote sources fetched with a blocking HTTP client.
#[cfg(feature = "download")]
pub struct HttpSource {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "download")]
impl HttpSource {
    pub fn new() -> Result<Self, LoadError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("countymap/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| LoadError::unreachable("<http client>", e))?;
        Ok(Self { client })
    }
}

#[cfg(feature = "download")]
impl SourceReader for HttpSource {
    fn read(&self, path: &str) -> Result<Arc<[u8]>, LoadError> {
        let resp = self.client.get(path).send()
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| LoadError::unreachable(path, e))?;
        let bytes = resp.bytes().map_err(|e| LoadError::unreachable(path, e))?;
        Ok(Arc::from(bytes.as_ref()))
    }
}

/// Routes `http(s)://` paths to the network and everything else to disk.
pub struct AutoSource {
    disk: DiskSource,
    #[cfg(feature = "download")]
    http: Option<HttpSource>,
}

impl AutoSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            disk: DiskSource::new(root),
            #[cfg(feature = "download")]
            http: None,
        }
    }

    fn is_remote(path: &str) -> bool {
        path.starts_with("http://") || path.starts_with("https://")
    }
}

impl SourceReader for AutoSource {
    fn read(&self, path: &str) -> Result<Arc<[u8]>, LoadError> {
        if Self::is_remote(path) { self.read_remote(path) } else { self.disk.read(path) }
    }
}

#[cfg(feature = "download")]
impl AutoSource {
    /// Reuse one HTTP client for every remote read.
    pub fn with_http(mut self, http: HttpSource) -> Self {
        self.http = Some(http);
        self
    }

    fn read_remote(&self, path: &str) -> Result<Arc<[u8]>, LoadError> {
        match &self.http {
            Some(http) => http.read(path),
            None => HttpSource::new()?.read(path),
        }
    }
}

#[cfg(not(feature = "download"))]
impl AutoSource {
    fn read_remote(&self, path: &str) -> Result<Arc<[u8]>, LoadError> {
        Err(LoadError::unreachable(path, "built without the `download` feature"))
    }
}

/// In-memory sources keyed by path.
#[derive(Default, Clone)]
pub struct MemSource {
    files: HashMap<String, Arc<[u8]>>,
}

impl MemSource {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, path: &str, contents: impl AsRef<[u8]>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn insert(&mut self, path: &str, contents: impl AsRef<[u8]>) {
        self.files.insert(path.to_string(), Arc::from(contents.as_ref()));
    }
}

impl SourceReader for MemSource {
    fn read(&self, path: &str) -> Result<Arc<[u8]>, LoadError> {
        self.files.get(path).cloned()
            .ok_or_else(|| LoadError::unreachable(path, "no such source"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_source_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.csv"), "County,x\nAlpine,1\n").unwrap();

        let source = DiskSource::new(dir.path());
        assert_eq!(&*source.read("a.csv").unwrap(), b"County,x\nAlpine,1\n");

        let err = source.read("missing.csv").unwrap_err();
        assert_eq!(err.path, "missing.csv");
        assert!(err.is_unreachable());
    }

    #[test]
    fn auto_source_reads_local_paths_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.csv"), "County\n").unwrap();
        let source = AutoSource::new(dir.path());
        assert_eq!(&*source.read("b.csv").unwrap(), b"County\n");
        assert!(!AutoSource::is_remote("data/b.csv"));
        assert!(AutoSource::is_remote("https://example.org/b.csv"));
    }

    #[cfg(feature = "download")]
    #[test]
    fn attached_http_client_is_kept_for_remote_reads() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("c.csv"), "County\n").unwrap();

        let source = AutoSource::new(dir.path());
        assert!(source.http.is_none());
        let source = source.with_http(HttpSource::new().unwrap());
        assert!(source.http.is_some());
        assert_eq!(&*source.read("c.csv").unwrap(), b"County\n");
    }

    #[test]
    fn mem_source_reports_missing_paths() {
        let source = MemSource::new().with("x.csv", "County\n");
        assert!(source.read("x.csv").is_ok());
        assert_eq!(source.read("y.csv").unwrap_err().path, "y.csv");
    }
}
