//! Directory path containment.
//!
//! Accepts a directory path only when it already is the canonical path of an
//! existing directory strictly inside a given parent. Symlinks, `..`
//! segments, redundant separators and relative paths all make the literal
//! input differ from its canonical form and are refused rather than
//! silently resolved.

use crate::engine::{is_blank, Validator};
use crate::registry::DIRECTORY_NAME_TYPE;
use crate::rejection::{Rejection, RejectionKind, Validated};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Maximum length of a canonical directory path.
pub const MAX_DIRECTORY_NAME_LENGTH: usize = 255;

/// `child` is below `parent`, component-wise, and not equal to it.
///
/// Both paths must already be canonical.
pub fn is_proper_descendant(child: &Path, parent: &Path) -> bool {
    child != parent && child.starts_with(parent)
}

impl Validator {
    /// Validate that `input` names an existing directory inside `parent`.
    ///
    /// Returns the canonical path, which is then equal to `input`.
    pub fn validate_directory(
        &self,
        context: &str,
        input: &str,
        parent: &Path,
        allow_null: bool,
    ) -> Validated<PathBuf> {
        if is_blank(input) {
            if allow_null {
                return Ok(None);
            }
            return Err(self.rejected(Rejection::new(
                RejectionKind::EmptyInput,
                context,
                format!("{context}: Input directory path required."),
                format!("Input directory path required: context={context}, input={input}"),
            )));
        }

        let dir = Path::new(input);
        let reject = |kind: RejectionKind, public: &str, audit: &str| {
            self.rejected(Rejection::new(
                kind,
                context,
                format!("{context}: {public}"),
                format!(
                    "{audit}: context={context}, input={input}, parent={}",
                    parent.display()
                ),
            ))
        };
        let io_failure = |what: &str, err: io::Error| {
            tracing::error!(context, error = %err, "{what} failed during directory validation");
            reject(
                RejectionKind::IoFailure,
                "Failure to validate directory path.",
                &format!("Failure to validate directory path, {what}: {err}"),
            )
        };

        match fs::metadata(dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(reject(
                    RejectionKind::NotADirectory,
                    "Invalid directory, not a directory.",
                    "Invalid directory, specified path is not a directory",
                ))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(reject(
                    RejectionKind::DirectoryNotFound,
                    "Invalid directory, does not exist.",
                    "Invalid directory, specified path does not exist",
                ))
            }
            Err(e) => return Err(io_failure("stat directory", e)),
        }

        match fs::metadata(parent) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(reject(
                    RejectionKind::ParentNotADirectory,
                    "Invalid directory, specified parent is not a directory.",
                    "Invalid directory, specified parent is not a directory",
                ))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(reject(
                    RejectionKind::ParentNotFound,
                    "Invalid directory, specified parent does not exist.",
                    "Invalid directory, specified parent does not exist",
                ))
            }
            Err(e) => return Err(io_failure("stat parent", e)),
        }

        let canonical_dir = fs::canonicalize(dir).map_err(|e| io_failure("canonicalize directory", e))?;
        let canonical_parent =
            fs::canonicalize(parent).map_err(|e| io_failure("canonicalize parent", e))?;

        if !is_proper_descendant(&canonical_dir, &canonical_parent) {
            return Err(reject(
                RejectionKind::NotContainedInParent,
                "Invalid directory, not inside specified parent.",
                &format!(
                    "Invalid directory, {} is not inside {}",
                    canonical_dir.display(),
                    canonical_parent.display()
                ),
            ));
        }

        let Some(canonical_str) = canonical_dir.to_str() else {
            return Err(reject(
                RejectionKind::CanonicalMismatch,
                "Invalid directory name.",
                "Invalid directory name, canonical path is not valid UTF-8",
            ));
        };

        let canonical = match self.get_valid_input(
            context,
            canonical_str,
            DIRECTORY_NAME_TYPE,
            MAX_DIRECTORY_NAME_LENGTH,
            false,
        )? {
            Some(c) => c,
            None => {
                return Err(reject(
                    RejectionKind::EmptyInput,
                    "Input directory path required.",
                    "Canonical directory path is empty",
                ))
            }
        };

        if canonical != input {
            return Err(reject(
                RejectionKind::CanonicalMismatch,
                "Invalid directory name.",
                &format!("Invalid directory name does not match the canonical path, canonical={canonical}"),
            ));
        }

        Ok(Some(PathBuf::from(canonical)))
    }

    /// True if [`validate_directory`](Self::validate_directory) accepts the input.
    pub fn is_valid_directory_path(
        &self,
        context: &str,
        input: &str,
        parent: &Path,
        allow_null: bool,
    ) -> bool {
        self.validate_directory(context, input, parent, allow_null)
            .is_ok()
    }
}
