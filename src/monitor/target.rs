//! Per-file tail state.
//!
//! ```text
//!   Closed ──open ok──▶ Tracking ──Modified──▶ (read appended lines) ──▶ Tracking
//!     ▲  │                  │
//!     │  └─open failed──┐   │ Moved / Deleted / truncated
//!     │   (retry next   │   ▼
//!     └──── tick) ◀─────┴── close, reopen, seek to end
//! ```
//!
//! The handle and the offset only exist while tracking, so a closed target
//! cannot be read from a stale position.

use std::fs::{self, File, Metadata};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Filesystem notification relevant to one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetEvent {
    /// Content changed (append or truncate).
    Modified,
    /// The file was renamed away from its path.
    Moved,
    /// The file was unlinked.
    Deleted,
    /// Attributes changed. Unlinking a file we hold open only shows up as
    /// this, so it triggers an identity check.
    Attributes,
}

/// Device and inode number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileId {
    dev: u64,
    ino: u64,
}

impl FileId {
    #[cfg(unix)]
    fn of(meta: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;

        Some(Self {
            dev: meta.dev(),
            ino: meta.ino(),
        })
    }

    #[cfg(not(unix))]
    fn of(_meta: &Metadata) -> Option<Self> {
        None
    }
}

#[derive(Debug)]
enum TargetState {
    Closed,
    Tracking {
        file: File,
        offset: u64,
        id: Option<FileId>,
    },
}

/// Result of reading after a modify notification.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Complete lines appended since the last read, in file order.
    Lines(Vec<String>),
    /// The file shrank below the cursor; the cursor now sits at `size`.
    Truncated { size: u64 },
    /// No open handle; nothing was read.
    Closed,
}

/// A watched log file.
#[derive(Debug)]
pub struct WatchTarget {
    path: PathBuf,
    state: TargetState,
    watched: bool,
}

impl WatchTarget {
    /// A target that has not been opened yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: TargetState::Closed,
            watched: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, TargetState::Tracking { .. })
    }

    /// Read cursor, if tracking.
    pub fn offset(&self) -> Option<u64> {
        match self.state {
            TargetState::Tracking { offset, .. } => Some(offset),
            TargetState::Closed => None,
        }
    }

    /// Whether a filesystem watch is currently registered for the path.
    pub fn is_watched(&self) -> bool {
        self.watched
    }

    pub fn set_watched(&mut self, watched: bool) {
        self.watched = watched;
    }

    /// Open the file and position the cursor at end-of-data.
    pub fn open(&mut self) -> io::Result<()> {
        let mut file = File::open(&self.path)?;
        let meta = file.metadata()?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", self.path.display()),
            ));
        }
        let offset = file.seek(SeekFrom::End(0))?;
        self.state = TargetState::Tracking {
            file,
            offset,
            id: FileId::of(&meta),
        };
        Ok(())
    }

    /// True when the open handle no longer refers to the file at the path:
    /// the path is gone or now names a different inode.
    pub fn is_replaced(&self) -> bool {
        let TargetState::Tracking { id, .. } = &self.state else {
            return false;
        };
        match fs::metadata(&self.path) {
            Err(_) => true,
            Ok(meta) => match (id, FileId::of(&meta)) {
                (Some(open), Some(current)) => *open != current,
                _ => false,
            },
        }
    }

    /// Drop the handle.
    pub fn close(&mut self) {
        self.state = TargetState::Closed;
    }

    /// Close, then open again at end-of-data.
    pub fn reopen(&mut self) -> io::Result<()> {
        self.close();
        self.open()
    }

    /// Read whatever complete lines were appended since the last call.
    ///
    /// A trailing line without a newline is left for the next call. The
    /// cursor is committed only after every returned line has been read.
    pub fn read_appended(&mut self) -> io::Result<ReadOutcome> {
        let TargetState::Tracking { file, offset, .. } = &mut self.state else {
            return Ok(ReadOutcome::Closed);
        };

        let size = file.metadata()?.len();
        if *offset > size {
            *offset = size;
            return Ok(ReadOutcome::Truncated { size });
        }
        if *offset == size {
            return Ok(ReadOutcome::Lines(Vec::new()));
        }

        file.seek(SeekFrom::Start(*offset))?;
        let mut reader = BufReader::new(&mut *file);
        let mut cursor = *offset;
        let mut lines = Vec::new();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf)?;
            if read == 0 || buf.last() != Some(&b'\n') {
                break;
            }
            cursor += read as u64;

            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
            lines.push(String::from_utf8_lossy(&buf).into_owned());
        }

        *offset = cursor;
        Ok(ReadOutcome::Lines(lines))
    }
}
