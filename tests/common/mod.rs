#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

/// Log output captured by a thread-local subscriber.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Capture everything at `debug` and above on the current thread until
    /// the guard drops.
    pub fn install() -> (Self, DefaultGuard) {
        let logs = Self::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (logs, guard)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Write `content` to a temporary file ending in `.{ext}`.
pub fn temp_manifest(content: &str, ext: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("gaterouter_manifest_")
        .suffix(&format!(".{ext}"))
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub const LEAD_MANIFEST_YAML: &str = r#"
routes:
  - name: lead-get
    methods: [GET]
    pattern: /lead/:id
  - name: lead-post
    methods: [post, put]
    pattern: /lead
  - name: files
    pattern: /files/:path+
  - name: catch-lead
    methods: [GET]
    pattern: /lead/:a/:b
"#;

pub const LEAD_MANIFEST_TOML: &str = r#"
[[routes]]
name = "lead-get"
methods = ["GET"]
pattern = "/lead/:id"

[[routes]]
name = "lead-post"
methods = ["post", "put"]
pattern = "/lead"

[[routes]]
name = "files"
pattern = "/files/:path+"
"#;
