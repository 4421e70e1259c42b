use std::fs;
use std::path::PathBuf;
use voteticket::SessionStorage;

/// Single-file session storage, the headless stand-in for browser
/// sessionStorage. This client only ever uses the session-key slot, so the
/// whole store is one file holding one hex line; a missing file behaves
/// like a fresh browser session.
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSessionStorage { path: path.into() }
    }
}

impl SessionStorage for FileSessionStorage {
    fn get(&self, _key: &str) -> Option<String> {
        fs::read_to_string(&self.path)
            .ok()
            .map(|s| s.trim().to_string())
    }

    fn put(&mut self, _key: &str, value: &str) {
        if let Err(e) = fs::write(&self.path, value) {
            eprintln!("voteticket: unable to persist session key: {}", e);
            std::process::exit(1);
        }
    }
}
