use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, IoContext, Result};
use crate::{StowFS, TempArtifact, ensure_parent, normalize_path};

impl StowFS {
    /// Moves `source` onto `destination`, replacing it, and returns the
    /// normalized destination path.
    ///
    /// Readers of `destination` see either its previous content or the full
    /// content of `source`. When both paths are on one filesystem this is a
    /// single rename. When the rename fails because they are on different
    /// filesystems, the source is copied into a staging file beside the
    /// destination, the staging file is renamed into place, and only then is
    /// the source removed. A crash between those last two steps leaves both
    /// files present; callers must tolerate that.
    ///
    /// Moving a file onto itself succeeds and leaves it untouched.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `source` does not exist. Any other failure is
    /// returned unchanged and does not trigger the copy fallback.
    pub fn atomic_move<S: AsRef<Path>, D: AsRef<Path>>(source: S, destination: D) -> Result<PathBuf> {
        move_with(source.as_ref(), destination.as_ref(), |from, to| fs::rename(from, to))
    }

    /// Copies `source` over `destination` atomically: the bytes are staged
    /// beside the destination and renamed into place. The source is left as
    /// is and its permission bits are carried over.
    pub fn copy_replace<S: AsRef<Path>, D: AsRef<Path>>(source: S, destination: D) -> Result<PathBuf> {
        let source = normalize_path(source)?;
        let destination = normalize_path(destination)?;

        let mut reader = File::open(&source).with_path("open source file", &source)?;
        let permissions = reader
            .metadata()
            .with_path("read metadata of", &source)?
            .permissions();

        ensure_parent(&destination)?;
        let mut artifact = TempArtifact::create_beside(&destination)?;
        let staged = artifact.path().to_path_buf();
        let copied = io::copy(&mut reader, artifact.as_file_mut())
            .with_path("copy into temporary file", &staged)
            .and_then(|_| artifact.sync())
            .and_then(|_| {
                fs::set_permissions(&staged, permissions)
                    .with_path("set permissions on temporary file", &staged)
            });
        if let Err(error) = copied {
            artifact.discard();
            return Err(error);
        }

        artifact.persist(&destination)
    }
}

/// Runs a move with `rename` as the fast path. A rename that fails with
/// `CrossesDevices` is completed by copy, rename and source removal, in that
/// order.
fn move_with<R>(source: &Path, destination: &Path, rename: R) -> Result<PathBuf>
where
    R: FnOnce(&Path, &Path) -> io::Result<()>,
{
    let source = normalize_path(source)?;
    let destination = normalize_path(destination)?;

    if is_same_file(&source, &destination)? {
        return Ok(destination);
    }

    ensure_parent(&destination)?;
    let renamed =
        rename(&source, &destination).map_err(|e| classify_rename(&source, &destination, e));
    match renamed {
        Ok(()) => {}
        Err(Error::AtomicMoveUnsupported { .. }) => {
            debug!(
                source = %source.display(),
                destination = %destination.display(),
                "Rename crossed filesystems, falling back to copy and rename"
            );
            StowFS::copy_replace(&source, &destination)?;
            fs::remove_file(&source).with_path("remove moved source file", &source)?;
        }
        Err(error) => return Err(error),
    }

    debug!(source = %source.display(), destination = %destination.display(), "File moved");
    Ok(destination)
}

/// Separates the cross-filesystem rename failure, which has a fallback, from
/// every other failure, which does not.
fn classify_rename(source: &Path, destination: &Path, error: io::Error) -> Error {
    if error.kind() == io::ErrorKind::CrossesDevices {
        Error::AtomicMoveUnsupported {
            from: source.to_path_buf(),
            to: destination.to_path_buf(),
            source: error,
        }
    } else {
        Error::io("move", source, error)
    }
}

/// True when both paths name the same file. Symlinks are not followed, so a
/// link is never mistaken for the file it points to. The source must exist.
fn is_same_file(source: &Path, destination: &Path) -> Result<bool> {
    let source_meta = fs::symlink_metadata(source).with_path("move", source)?;
    if source == destination {
        return Ok(true);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;

        if let Ok(destination_meta) = fs::symlink_metadata(destination) {
            return Ok(source_meta.dev() == destination_meta.dev()
                && source_meta.ino() == destination_meta.ino());
        }
    }

    #[cfg(not(unix))]
    let _ = source_meta;

    Ok(false)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_atomic_move_renames_file() {
        let temp_dir = tempdir().unwrap();
        let source = temp_dir.path().join("source.txt");
        let destination = temp_dir.path().join("destination.txt");
        fs::write(&source, "payload").unwrap();

        let actual = StowFS::atomic_move(&source, &destination).unwrap();

        assert_eq!(actual, destination);
        assert_eq!(fs::read_to_string(&destination).unwrap(), "payload");
        assert!(!source.exists());
    }

    #[test]
    fn test_atomic_move_replaces_existing_destination() {
        let temp_dir = tempdir().unwrap();
        let source = temp_dir.path().join("new.txt");
        let destination = temp_dir.path().join("current.txt");
        fs::write(&source, "new").unwrap();
        fs::write(&destination, "old content that is longer").unwrap();

        StowFS::atomic_move(&source, &destination).unwrap();

        assert_eq!(fs::read_to_string(&destination).unwrap(), "new");
        assert!(!source.exists());
    }

    #[test]
    fn test_atomic_move_creates_destination_parents() {
        let temp_dir = tempdir().unwrap();
        let source = temp_dir.path().join("source.txt");
        let destination = temp_dir.path().join("a").join("b").join("dest.txt");
        fs::write(&source, "nested").unwrap();

        StowFS::atomic_move(&source, &destination).unwrap();

        assert_eq!(fs::read_to_string(&destination).unwrap(), "nested");
    }

    #[test]
    fn test_atomic_move_onto_itself_is_noop() {
        let temp_dir = tempdir().unwrap();
        let source = temp_dir.path().join("same.txt");
        fs::write(&source, "unchanged").unwrap();

        let actual = StowFS::atomic_move(&source, temp_dir.path().join("./same.txt")).unwrap();

        assert_eq!(actual, source);
        assert_eq!(fs::read_to_string(&source).unwrap(), "unchanged");
    }

    #[cfg(unix)]
    #[test]
    fn test_atomic_move_onto_hard_link_keeps_source() {
        let temp_dir = tempdir().unwrap();
        let source = temp_dir.path().join("original.txt");
        let link = temp_dir.path().join("link.txt");
        fs::write(&source, "shared").unwrap();
        fs::hard_link(&source, &link).unwrap();

        StowFS::atomic_move(&source, &link).unwrap();

        assert!(source.exists());
        assert_eq!(fs::read_to_string(&link).unwrap(), "shared");
    }

    #[test]
    fn test_atomic_move_missing_source_is_not_found() {
        let temp_dir = tempdir().unwrap();
        let source = temp_dir.path().join("missing.txt");
        let destination = temp_dir.path().join("dest.txt");

        let actual = StowFS::atomic_move(&source, &destination).unwrap_err().kind();

        let expected = ErrorKind::NotFound;
        assert_eq!(actual, expected);
        assert!(!destination.exists());
    }

    #[test]
    fn test_classify_cross_device_rename() {
        let fixture = io::Error::from(io::ErrorKind::CrossesDevices);

        let actual = classify_rename(Path::new("/mnt/a/f"), Path::new("/mnt/b/f"), fixture);

        assert_eq!(actual.kind(), ErrorKind::AtomicMoveUnsupported);
        assert!(actual.is_io());
    }

    #[test]
    fn test_classify_other_rename_failures() {
        let fixture = io::Error::from(io::ErrorKind::PermissionDenied);

        let actual = classify_rename(Path::new("a"), Path::new("b"), fixture).kind();

        let expected = ErrorKind::Io;
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_copy_replace_keeps_source_and_replaces_destination() {
        let temp_dir = tempdir().unwrap();
        let source = temp_dir.path().join("source.bin");
        let destination = temp_dir.path().join("out").join("dest.bin");
        fs::write(&source, [1u8, 2, 3]).unwrap();
        StowFS::write(&destination, "stale").unwrap();

        StowFS::copy_replace(&source, &destination).unwrap();

        assert_eq!(fs::read(&destination).unwrap(), vec![1u8, 2, 3]);
        assert_eq!(fs::read(&source).unwrap(), vec![1u8, 2, 3]);
        assert_eq!(fs::read_dir(destination.parent().unwrap()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_replace_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempdir().unwrap();
        let source = temp_dir.path().join("script.sh");
        let destination = temp_dir.path().join("copy.sh");
        fs::write(&source, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&source, fs::Permissions::from_mode(0o750)).unwrap();

        StowFS::copy_replace(&source, &destination).unwrap();

        let actual = fs::metadata(&destination).unwrap().permissions().mode() & 0o777;
        assert_eq!(actual, 0o750);
    }

    #[test]
    fn test_copy_replace_missing_source_creates_nothing() {
        let temp_dir = tempdir().unwrap();
        let destination = temp_dir.path().join("dest.txt");

        let actual = StowFS::copy_replace(temp_dir.path().join("nope"), &destination)
            .unwrap_err()
            .kind();

        assert_eq!(actual, ErrorKind::NotFound);
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    fn cross_device(_: &Path, _: &Path) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::CrossesDevices))
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_move_falls_back_to_copy_across_filesystems() {
        let temp_dir = tempdir().unwrap();
        let source = temp_dir.path().join("inbox").join("report.csv");
        let destination = temp_dir.path().join("archive").join("report.csv");
        StowFS::write(&source, "id,total\n1,42\n").unwrap();
        StowFS::write(&destination, "stale").unwrap();

        let actual = move_with(&source, &destination, cross_device).unwrap();

        assert_eq!(actual, destination);
        assert_eq!(fs::read_to_string(&destination).unwrap(), "id,total\n1,42\n");
        assert!(!source.exists());
        assert_eq!(entries(destination.parent().unwrap()), vec!["report.csv".to_string()]);
        assert!(entries(source.parent().unwrap()).is_empty());
    }

    #[test]
    fn test_failed_fallback_keeps_source() {
        let temp_dir = tempdir().unwrap();
        let source = temp_dir.path().join("source.txt");
        let destination = temp_dir.path().join("occupied");
        fs::write(&source, "precious").unwrap();
        fs::create_dir(&destination).unwrap();
        fs::write(destination.join("child"), "x").unwrap();

        let actual = move_with(&source, &destination, cross_device);

        assert!(actual.unwrap_err().is_io());
        assert_eq!(fs::read_to_string(&source).unwrap(), "precious");
        assert_eq!(
            entries(temp_dir.path()),
            vec!["occupied".to_string(), "source.txt".to_string()]
        );
    }

    #[test]
    fn test_non_boundary_rename_failure_skips_fallback() {
        let temp_dir = tempdir().unwrap();
        let source = temp_dir.path().join("source.txt");
        let destination = temp_dir.path().join("dest.txt");
        fs::write(&source, "data").unwrap();

        let actual = move_with(&source, &destination, |_, _| {
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        })
        .unwrap_err()
        .kind();

        assert_eq!(actual, ErrorKind::Io);
        assert!(source.exists());
        assert!(!destination.exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_atomic_move_between_real_filesystems() {
        use std::os::unix::fs::MetadataExt;

        let Ok(shm_dir) = tempfile::tempdir_in("/dev/shm") else {
            return;
        };
        let temp_dir = tempdir().unwrap();
        let shm_dev = fs::metadata(shm_dir.path()).unwrap().dev();
        if shm_dev == fs::metadata(temp_dir.path()).unwrap().dev() {
            return;
        }
        let source = shm_dir.path().join("source.txt");
        let destination = temp_dir.path().join("nested").join("moved.txt");
        fs::write(&source, "cross").unwrap();

        StowFS::atomic_move(&source, &destination).unwrap();

        assert_eq!(fs::read_to_string(&destination).unwrap(), "cross");
        assert!(!source.exists());
        assert_eq!(entries(destination.parent().unwrap()), vec!["moved.txt".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_atomic_move_of_symlink_replaces_its_target_path() {
        let temp_dir = tempdir().unwrap();
        let target = temp_dir.path().join("target.txt");
        let link = temp_dir.path().join("link.txt");
        fs::write(&target, "content").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        StowFS::atomic_move(&link, &target).unwrap();

        assert!(fs::symlink_metadata(&link).is_err());
        assert!(fs::symlink_metadata(&target).unwrap().file_type().is_symlink());
    }
}
