use crate::error::{Result, SplitError};
use crate::pdf::ChildDocument;
use crate::split::source::OutputStore;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// An acquired child file plus the document being written into it.
pub struct ChildFile {
    pub path: PathBuf,
    file: File,
    document: ChildDocument,
}

impl AsMut<ChildDocument> for ChildFile {
    fn as_mut(&mut self) -> &mut ChildDocument {
        &mut self.document
    }
}

/// Writes each child as `<dir>/<output_name>`, refusing to overwrite.
pub struct DirectoryOutputs {
    dir: PathBuf,
}

impl DirectoryOutputs {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        DirectoryOutputs {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl OutputStore<ChildFile> for DirectoryOutputs {
    fn open_output(&mut self, name: &str) -> Result<ChildFile> {
        let path = self.dir.join(name);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => SplitError::OutputConflict { path: path.clone() },
                _ => SplitError::Io {
                    path: path.clone(),
                    source: e,
                },
            })?;
        debug!("Opened {}", path.display());

        Ok(ChildFile {
            path,
            file,
            document: ChildDocument::new(),
        })
    }

    fn close_output(&mut self, handle: ChildFile) -> Result<()> {
        let ChildFile {
            path,
            mut file,
            document,
        } = handle;

        debug!("Closing {} ({} page(s))", path.display(), document.page_count());
        let io_error = |source| SplitError::Io {
            path: path.clone(),
            source,
        };

        let written = document
            .finish()
            .and_then(|bytes| file.write_all(&bytes))
            .and_then(|()| file.sync_all())
            .map_err(io_error);

        if written.is_err() {
            drop(file);
            let _ = std::fs::remove_file(&path);
        }
        written
    }

    fn abandon_output(&mut self, handle: ChildFile) {
        let ChildFile { path, file, .. } = handle;
        drop(file);
        if let Err(e) = std::fs::remove_file(&path) {
            warn!("Failed to remove partial output {}: {}", path.display(), e);
        }
    }
}
