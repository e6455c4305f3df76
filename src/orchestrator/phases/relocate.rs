//! Phase 4: Relocation - move the auxiliary checkpoint under the primary one.
//!
//! Follows `mv from to`: when `to` is an existing directory the source is
//! moved inside it as `to/<name of from>`, otherwise it becomes `to`. The
//! primary checkpoint ships its own `process_checkpoint/` (pose and detection
//! models), so the usual result is `process_checkpoint/FLUX.1-Kontext-dev`.
//!
//! No existence checks are made up front. The move itself reports a missing
//! source, a missing destination parent, or a populated final target, and
//! each of those ends the bootstrap. Re-running over a finished layout
//! therefore fails here.

use crate::error::RelocateError;
use crate::log_parsed;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Move directory `from` to `to` with `mv` semantics.
///
/// A same-filesystem move is a single `rename(2)`. Across filesystems the
/// tree is copied and the source removed afterwards; a failure part-way
/// leaves both trees as they are. Returns where the tree ended up.
pub fn relocate_checkpoint(from: &Path, to: &Path) -> Result<PathBuf, RelocateError> {
    relocate_with(from, to, |a, b| fs::rename(a, b))
}

/// [`relocate_checkpoint`] with the rename step supplied by the caller.
pub(crate) fn relocate_with<R>(from: &Path, to: &Path, rename: R) -> Result<PathBuf, RelocateError>
where
    R: Fn(&Path, &Path) -> io::Result<()>,
{
    let target = move_target(from, to)?;
    log::info!("Moving {} to {}", from.display(), target.display());

    match rename(from, &target) {
        Ok(()) => {}
        Err(e) if e.raw_os_error() == Some(libc::EXDEV) => {
            log::debug!(
                "[Relocate] {} and {} are on different filesystems, copying",
                from.display(),
                target.display()
            );
            move_across_filesystems(from, &target)?;
        }
        Err(source) => {
            return Err(RelocateError::Move {
                from: from.to_path_buf(),
                to: target,
                source,
            })
        }
    }

    log_parsed!("Checkpoint staged at {}", target.display());
    Ok(target)
}

/// `to` itself, or `to/<file name of from>` when `to` is an existing directory.
pub(crate) fn move_target(from: &Path, to: &Path) -> Result<PathBuf, RelocateError> {
    if !fs::metadata(to).map(|m| m.is_dir()).unwrap_or(false) {
        return Ok(to.to_path_buf());
    }

    match from.file_name() {
        Some(name) => Ok(to.join(name)),
        None => Err(RelocateError::Move {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no directory name", from.display()),
            ),
        }),
    }
}

/// Copy `from` to the final target `to`, then delete `from`.
pub(crate) fn move_across_filesystems(from: &Path, to: &Path) -> Result<(), RelocateError> {
    copy_tree(from, to).map_err(|source| RelocateError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })?;
    fs::remove_dir_all(from).map_err(|source| RelocateError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}

/// Recursively copy directory `from` to a new directory `to`.
///
/// Mirrors rename's rules for the target: it may be absent or an empty
/// directory, and its parent must already exist. Symlinks are recreated,
/// not followed.
pub(crate) fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    let source_meta = fs::symlink_metadata(from)?;
    if !source_meta.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a directory", from.display()),
        ));
    }

    match fs::symlink_metadata(to) {
        Ok(meta) if meta.is_dir() => {
            if fs::read_dir(to)?.next().is_some() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} exists and is not empty", to.display()),
                ));
            }
        }
        Ok(_) => {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} exists and is not a directory", to.display()),
            ))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => fs::create_dir(to)?,
        Err(e) => return Err(e),
    }

    copy_contents(from, to)?;
    fs::set_permissions(to, source_meta.permissions())
}

fn copy_contents(from: &Path, to: &Path) -> io::Result<()> {
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let src = entry.path();
        let dst = to.join(entry.file_name());
        let file_type = entry.file_type()?;

        if file_type.is_symlink() {
            std::os::unix::fs::symlink(fs::read_link(&src)?, &dst)?;
        } else if file_type.is_dir() {
            fs::create_dir(&dst)?;
            copy_contents(&src, &dst)?;
            fs::set_permissions(&dst, entry.metadata()?.permissions())?;
        } else {
            fs::copy(&src, &dst)?;
        }
    }
    Ok(())
}
