//! Host platform checks.

use std::path::Path;

use crate::core::errors::PackagerError;

/// Marker file present on Debian-derived systems.
const DEBIAN_MARKER: &str = "etc/debian_version";

/// Fail unless running on Linux.
pub fn ensure_supported_os() -> Result<(), PackagerError> {
    if cfg!(target_os = "linux") {
        Ok(())
    } else {
        Err(PackagerError::UnsupportedOs)
    }
}

/// Whether this is a Debian-based Linux system.
pub fn is_debian() -> bool {
    is_debian_at(Path::new("/"))
}

/// Whether the system rooted at `root` is Debian-based.
pub fn is_debian_at(root: &Path) -> bool {
    root.join(DEBIAN_MARKER).is_file()
}
