//! Recursive directory sizing. Blocking; call from `spawn_blocking`.

use std::fs;
use std::io;
use std::path::Path;

/// Sum of file lengths below `path`. Symlinks are not followed and entries
/// that vanish or cannot be read mid-walk are skipped. `None` if `path` does
/// not exist.
pub fn directory_size(path: &Path) -> io::Result<Option<u64>> {
    let meta = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    if !meta.is_dir() {
        return Ok(Some(meta.len()));
    }
    let mut total = 0u64;
    let mut pending = vec![path.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if meta.is_dir() {
                pending.push(entry.path());
            } else {
                total = total.saturating_add(meta.len());
            }
        }
    }
    Ok(Some(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_nested_files() {
        let td = tempfile::tempdir().unwrap();
        fs::write(td.path().join("a.bin"), vec![0u8; 1000]).unwrap();
        fs::create_dir_all(td.path().join("x/y")).unwrap();
        fs::write(td.path().join("x/b.bin"), vec![0u8; 24]).unwrap();
        fs::write(td.path().join("x/y/c.bin"), vec![0u8; 1]).unwrap();
        assert_eq!(directory_size(td.path()).unwrap(), Some(1025));
    }

    #[test]
    fn missing_directory_is_none() {
        let td = tempfile::tempdir().unwrap();
        assert_eq!(directory_size(&td.path().join("nope")).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_not_followed() {
        let td = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("big.bin"), vec![0u8; 4096]).unwrap();
        fs::create_dir(td.path().join("d")).unwrap();
        std::os::unix::fs::symlink(outside.path(), td.path().join("d/link")).unwrap();
        fs::write(td.path().join("d/small.bin"), vec![0u8; 10]).unwrap();
        let size = directory_size(&td.path().join("d")).unwrap().unwrap();
        assert!(size < 4096, "symlink target was counted: {size}");
    }
}
