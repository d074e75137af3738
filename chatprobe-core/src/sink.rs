//! Timestamped artifact files for one run.
use chatprobe_common::Result;
use chrono::Local;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `YYYYMMDD_HHmmss` in local time.
pub fn timestamp_now() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Writes `<kind>_<timestamp>.<ext>` files into one directory.
///
/// The timestamp is fixed when the sink is created, so every artifact of a
/// run shares it.
///
/// ```
/// use chatprobe_core::ArtifactSink;
///
/// let dir = tempfile::tempdir().unwrap();
/// let sink = ArtifactSink::with_timestamp(dir.path(), "20250101_120000").unwrap();
/// let path = sink.save_text("response", "hello").unwrap();
/// assert!(path.ends_with("response_20250101_120000.txt"));
/// ```
#[derive(Debug, Clone)]
pub struct ArtifactSink {
    dir: PathBuf,
    timestamp: String,
}

impl ArtifactSink {
    /// Create `dir` (and parents) and stamp the sink with the current time.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_timestamp(dir, timestamp_now())
    }

    /// Like [`create`](Self::create) with `_<seq>` appended to the stamp, for
    /// runs that may start within the same second.
    pub fn create_sequenced(dir: impl Into<PathBuf>, seq: u64) -> Result<Self> {
        Self::with_timestamp(dir, format!("{}_{seq:04}", timestamp_now()))
    }

    pub fn with_timestamp(dir: impl Into<PathBuf>, timestamp: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            timestamp: timestamp.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn path_for(&self, kind: &str, ext: &str) -> PathBuf {
        self.dir.join(format!("{kind}_{}.{ext}", self.timestamp))
    }

    fn write(&self, kind: &str, ext: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(kind, ext);
        fs::write(&path, bytes)?;
        debug!(target: "chatprobe.sink", path = %path.display(), bytes = bytes.len(), "artifact saved");
        Ok(path)
    }

    pub fn save_text(&self, kind: &str, text: &str) -> Result<PathBuf> {
        self.write(kind, "txt", text.as_bytes())
    }

    pub fn save_html(&self, kind: &str, html: &str) -> Result<PathBuf> {
        self.write(kind, "html", html.as_bytes())
    }

    /// Pretty-printed JSON.
    pub fn save_json<T: Serialize + ?Sized>(&self, kind: &str, value: &T) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(value)?;
        self.write(kind, "json", json.as_bytes())
    }

    pub fn save_png(&self, kind: &str, png: &[u8]) -> Result<PathBuf> {
        self.write(kind, "png", png)
    }

    /// Question and answer as one `q_and_a` text file.
    pub fn save_q_and_a(&self, question: &str, answer: &str) -> Result<PathBuf> {
        self.save_q_and_a_as("q_and_a", question, answer)
    }

    pub fn save_q_and_a_as(&self, kind: &str, question: &str, answer: &str) -> Result<PathBuf> {
        let body = format!("# 質問\n{question}\n\n# 回答\n{answer}\n");
        self.save_text(kind, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_has_fixed_shape() {
        let ts = timestamp_now();
        assert_eq!(ts.len(), 15);
        assert_eq!(ts.as_bytes()[8], b'_');
        assert!(ts.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn create_makes_nested_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("logs/run");
        let sink = ArtifactSink::create(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(sink.dir(), dir.as_path());
    }

    #[test]
    fn sequenced_stamps_differ_within_a_second() {
        let tmp = tempfile::tempdir().unwrap();
        let a = ArtifactSink::create_sequenced(tmp.path(), 1).unwrap();
        let b = ArtifactSink::create_sequenced(tmp.path(), 2).unwrap();
        assert_ne!(a.path_for("q_and_a", "txt"), b.path_for("q_and_a", "txt"));
        assert!(a.timestamp().ends_with("_0001"));
        assert_eq!(a.timestamp()[..15].len(), timestamp_now().len());
    }

    #[test]
    fn q_and_a_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = ArtifactSink::with_timestamp(tmp.path(), "20250102_030405").unwrap();
        let path = sink.save_q_and_a("What is M5Stack?", "A modular IoT platform.").unwrap();
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("q_and_a_20250102_030405.txt")
        );
        let body = std::fs::read_to_string(path).unwrap();
        assert_eq!(body, "# 質問\nWhat is M5Stack?\n\n# 回答\nA modular IoT platform.\n");
    }

    #[test]
    fn json_and_png_extensions() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = ArtifactSink::with_timestamp(tmp.path(), "t").unwrap();
        let json = sink.save_json("bot_messages", &vec!["a", "b"]).unwrap();
        assert!(json.ends_with("bot_messages_t.json"));
        let png = sink.save_png("response", b"\x89PNG").unwrap();
        assert_eq!(std::fs::read(png).unwrap(), b"\x89PNG");
    }
}
