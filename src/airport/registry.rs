/// The registry file: airport profiles plus the subscription URLs tracked for them.
///
/// The document is kept as a raw JSON tree (with key order preserved) so that
/// a rewrite only changes the `url` values that were actually updated.
/// Fields the operator added by hand survive untouched.
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::AirportError;

/// Connection details for one airport account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AirportProfile {
    pub host: String,
    /// Sent verbatim as the `Authorization` header.
    pub authorization: String,
    /// Sent as the `Cookie` header when present.
    #[serde(default)]
    pub cookie: Option<String>,
}

/// A registry document with a checked top-level shape.
///
/// Only the `airports` object and the `subscribes` array are required up
/// front. Individual profiles are decoded on lookup, and `subscribes` entries
/// that are not objects with a string `url` are left alone.
#[derive(Debug, Clone)]
pub struct RegistryDocument {
    root: Value,
    origin: PathBuf,
}

/// Mutable view of one `subscribes` entry.
pub struct Registration<'a> {
    index: usize,
    entry: &'a mut Map<String, Value>,
}

impl Registration<'_> {
    /// Position in the `subscribes` array.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The identity this entry belongs to, if any.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.entry.get("tag").and_then(Value::as_str)
    }

    /// The stored subscription URL, if the entry has a string `url`.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.entry.get("url").and_then(Value::as_str)
    }

    /// Replace the URL in place, keeping the key's position.
    pub fn set_url(&mut self, url: &str) {
        if let Some(slot) = self.entry.get_mut("url") {
            *slot = Value::String(url.to_owned());
        }
    }
}

impl RegistryDocument {
    /// Check the top-level shape of a parsed JSON tree.
    ///
    /// # Errors
    ///
    /// Returns a description of the shape violation found.
    pub fn from_value(root: Value) -> Result<Self, String> {
        let Value::Object(top) = &root else {
            return Err("top level must be an object".to_owned());
        };
        if !top.get("airports").is_some_and(Value::is_object) {
            return Err("`airports` must be an object".to_owned());
        }
        if !top.get("subscribes").is_some_and(Value::is_array) {
            return Err("`subscribes` must be an array".to_owned());
        }
        Ok(Self {
            root,
            origin: PathBuf::new(),
        })
    }

    /// Look up and decode an airport profile by name.
    ///
    /// Other entries under `airports` are never decoded.
    ///
    /// # Errors
    ///
    /// Returns `AirportError::UnknownAirport` if `name` is not configured and
    /// `AirportError::ConfigMalformed` if its entry is not a valid profile.
    pub fn airport(&self, name: &str) -> Result<AirportProfile, AirportError> {
        let raw = self.root["airports"]
            .get(name)
            .ok_or_else(|| AirportError::UnknownAirport {
                name: name.to_owned(),
            })?;
        AirportProfile::deserialize(raw).map_err(|e| AirportError::ConfigMalformed {
            path: self.origin.clone(),
            reason: format!("airports.{name}: {e}"),
        })
    }

    /// Number of entries under `airports`.
    #[must_use]
    pub fn airport_count(&self) -> usize {
        self.root["airports"].as_object().map_or(0, Map::len)
    }

    /// Iterate over every `subscribes` entry in document order.
    pub fn registrations_mut(&mut self) -> impl Iterator<Item = Registration<'_>> {
        self.root
            .get_mut("subscribes")
            .and_then(Value::as_array_mut)
            .into_iter()
            .flatten()
            .enumerate()
            .filter_map(|(index, entry)| {
                entry
                    .as_object_mut()
                    .map(|entry| Registration { index, entry })
            })
    }

    /// The underlying JSON tree.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Serialize with 4-space indentation. Non-ASCII text is written as-is.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures (not expected for a validated tree).
    pub fn to_pretty_bytes(&self) -> serde_json::Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.as_value().serialize(&mut ser)?;
        Ok(buf)
    }
}

/// Destination for a reconciled registry.
pub trait RegistrySink {
    /// Persist `doc`.
    ///
    /// # Errors
    ///
    /// Returns `AirportError::Persistence` if the write fails.
    fn save(&mut self, doc: &RegistryDocument) -> Result<(), AirportError>;
}

/// File-backed registry.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    /// A store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The registry file as given on the command line.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate the registry file.
    ///
    /// # Errors
    ///
    /// Returns `AirportError::ConfigNotFound` if the file is absent and
    /// `AirportError::ConfigMalformed` if it cannot be read, is not JSON, or
    /// has the wrong shape.
    pub fn load(&self) -> Result<RegistryDocument, AirportError> {
        let text = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => AirportError::ConfigNotFound {
                path: self.path.clone(),
            },
            _ => self.malformed(format!("cannot read: {e}")),
        })?;
        let root: Value = serde_json::from_str(&text).map_err(|e| self.malformed(e.to_string()))?;
        let mut doc = RegistryDocument::from_value(root).map_err(|reason| self.malformed(reason))?;
        doc.origin.clone_from(&self.path);
        tracing::debug!(path = %self.path.display(), airports = doc.airport_count(), "registry loaded");
        Ok(doc)
    }

    /// Write `doc` to a temp file next to the registry, then rename it into place.
    ///
    /// Symlinks are followed so the link target is updated, and the target's
    /// permissions are applied to the temp file before any content is written.
    ///
    /// # Errors
    ///
    /// Returns `AirportError::Persistence` on any I/O failure.
    pub fn write(&self, doc: &RegistryDocument) -> Result<(), AirportError> {
        let bytes = doc
            .to_pretty_bytes()
            .map_err(|e| self.persistence(std::io::Error::other(e)))?;

        let target = match fs::canonicalize(&self.path) {
            Ok(resolved) => resolved,
            Err(e) if e.kind() == ErrorKind::NotFound => self.path.clone(),
            Err(e) => return Err(self.persistence(e)),
        };
        let permissions = match fs::metadata(&target) {
            Ok(meta) => Some(meta.permissions()),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(self.persistence(e)),
        };

        let mut tmp = OsString::from(target.as_os_str());
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        if let Err(e) = write_file(&tmp, &bytes, permissions).and_then(|()| fs::rename(&tmp, &target)) {
            let _ = fs::remove_file(&tmp);
            return Err(self.persistence(e));
        }
        tracing::debug!(path = %target.display(), bytes = bytes.len(), "registry saved");
        Ok(())
    }

    fn malformed(&self, reason: String) -> AirportError {
        AirportError::ConfigMalformed {
            path: self.path.clone(),
            reason,
        }
    }

    fn persistence(&self, source: std::io::Error) -> AirportError {
        AirportError::Persistence {
            path: self.path.clone(),
            source,
        }
    }
}

fn write_file(path: &Path, bytes: &[u8], permissions: Option<fs::Permissions>) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    if let Some(permissions) = permissions {
        file.set_permissions(permissions)?;
    }
    file.write_all(bytes)?;
    file.sync_all()
}

impl RegistrySink for RegistryStore {
    fn save(&mut self, doc: &RegistryDocument) -> Result<(), AirportError> {
        self.write(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
    "airports": {
        "alpha": {
            "host": "alpha.example",
            "authorization": "tok-a",
            "cookie": "sid=1"
        },
        "beta": {
            "host": "beta.example",
            "authorization": "tok-b"
        }
    },
    "subscribes": [
        {
            "url": "https://alpha.example/old",
            "tag": "alpha",
            "note": "主力机场"
        },
        {
            "url": "https://other.example/sub"
        }
    ],
    "extra": {
        "z": 1,
        "a": 2
    }
}"#;

    fn write_registry(contents: &str) -> (tempfile::TempDir, RegistryStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subscribes.json");
        fs::write(&path, contents).unwrap();
        (dir, RegistryStore::new(path))
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::new(dir.path().join("nope.json"));
        assert!(matches!(store.load(), Err(AirportError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_load_invalid_json() {
        let (_dir, store) = write_registry("{not json");
        assert!(matches!(store.load(), Err(AirportError::ConfigMalformed { .. })));
    }

    #[test]
    fn test_load_wrong_shape() {
        let (_dir, store) = write_registry(r#"{"airports": {}, "subscribes": {}}"#);
        match store.load() {
            Err(AirportError::ConfigMalformed { reason, .. }) => {
                assert_eq!(reason, "`subscribes` must be an array");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_load_accepts_loose_entries() {
        let (_dir, store) = write_registry(
            r#"{"airports": {"a": {"host": "h", "authorization": "t"}, "draft": {"host": "h2"}},
                "subscribes": [{"tag": "local", "path": "./nodes.txt"}, "note", {"tag": 7, "url": "u"}]}"#,
        );
        let doc = store.load().unwrap();
        assert_eq!(doc.airport("a").unwrap().host, "h");
        match doc.airport("draft") {
            Err(AirportError::ConfigMalformed { path, reason }) => {
                assert_eq!(path, store.path());
                assert!(reason.starts_with("airports.draft:"), "{reason}");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_load_airports_not_object() {
        let (_dir, store) = write_registry(r#"{"airports": [], "subscribes": []}"#);
        assert!(matches!(store.load(), Err(AirportError::ConfigMalformed { .. })));
    }

    #[test]
    fn test_airport_lookup() {
        let (_dir, store) = write_registry(SAMPLE);
        let doc = store.load().unwrap();
        let alpha = doc.airport("alpha").unwrap();
        assert_eq!(alpha.host, "alpha.example");
        assert_eq!(alpha.cookie.as_deref(), Some("sid=1"));
        assert_eq!(doc.airport("beta").unwrap().cookie, None);
        assert!(matches!(
            doc.airport("gamma"),
            Err(AirportError::UnknownAirport { .. })
        ));
    }

    #[test]
    fn test_unchanged_round_trip_is_byte_identical() {
        let (_dir, store) = write_registry(SAMPLE);
        let doc = store.load().unwrap();
        assert_eq!(String::from_utf8(doc.to_pretty_bytes().unwrap()).unwrap(), SAMPLE);
    }

    #[test]
    fn test_write_keeps_order_and_unknown_fields() {
        let (_dir, mut store) = write_registry(SAMPLE);
        let mut doc = store.load().unwrap();
        for mut reg in doc.registrations_mut() {
            if reg.tag() == Some("alpha") {
                reg.set_url("https://alpha.example/new");
            }
        }
        store.save(&doc).unwrap();

        let written = fs::read_to_string(store.path()).unwrap();
        assert_eq!(
            written,
            SAMPLE.replace("https://alpha.example/old", "https://alpha.example/new")
        );
        assert!(written.contains("主力机场"));
        assert!(!store.path().with_file_name("subscribes.json.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, mut store) = write_registry(SAMPLE);
        fs::set_permissions(store.path(), fs::Permissions::from_mode(0o600)).unwrap();
        let doc = store.load().unwrap();
        store.save(&doc).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_through_symlink() {
        let (dir, real) = write_registry(SAMPLE);
        let link = dir.path().join("link.json");
        std::os::unix::fs::symlink(real.path(), &link).unwrap();

        let mut store = RegistryStore::new(&link);
        let mut doc = store.load().unwrap();
        for mut reg in doc.registrations_mut() {
            if reg.tag() == Some("alpha") {
                reg.set_url("https://alpha.example/new");
            }
        }
        store.save(&doc).unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        let written = fs::read_to_string(real.path()).unwrap();
        assert!(written.contains("https://alpha.example/new"));
        assert!(!written.contains("https://alpha.example/old"));
    }

    #[test]
    fn test_write_failure_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let (_src, store) = write_registry(SAMPLE);
        let doc = store.load().unwrap();
        let mut missing = RegistryStore::new(dir.path().join("no-such-dir").join("r.json"));
        assert!(matches!(
            missing.save(&doc),
            Err(AirportError::Persistence { .. })
        ));
    }
}
