use directories::ProjectDirs;
use serde_json::Value;
use std::path::PathBuf;

fn prefs_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("org", "berth", "berth")?;
    Some(proj.config_dir().join("prefs-shell.json"))
}

/// Shell preferences. Absent or malformed files read as `Null`; the
/// shell never writes this file itself.
pub fn load_prefs() -> Value {
    if let Some(path) = prefs_path() {
        if let Ok(bytes) = std::fs::read(path) {
            if let Ok(v) = serde_json::from_slice::<Value>(&bytes) {
                return v;
            }
        }
    }
    Value::Null
}

/// Port preference, when one is set. Environment variables win over this.
pub fn port_override() -> Option<u16> {
    load_prefs()
        .get("port")
        .and_then(|v| v.as_u64())
        .and_then(|n| u16::try_from(n).ok())
}
