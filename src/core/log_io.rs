use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Where a newly opened tailer starts reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAt {
    /// Only lines appended after opening
    End,
    /// Replay the whole file first
    Beginning,
}

/// Follows a growing text file, handing back complete lines as they appear.
pub struct LineTailer {
    file: File,
    position: u64,
    path: PathBuf,
}

impl LineTailer {
    pub fn open(path: impl AsRef<Path>, start: StartAt) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let position = match start {
            StartAt::End => file.metadata()?.len(),
            StartAt::Beginning => 0,
        };
        Ok(Self {
            file,
            position,
            path,
        })
    }

    /// Read lines appended since the last call. A partial trailing line is
    /// left for the next call. A file that shrank is read again from the top.
    pub fn read_new_lines(&mut self) -> io::Result<Vec<String>> {
        let len = self.file.metadata()?.len();
        if len < self.position {
            log::info!("{:?} was truncated, rereading from start", self.path);
            self.position = 0;
        }

        self.file.seek(SeekFrom::Start(self.position))?;
        let mut reader = BufReader::new(&self.file);
        let mut lines = Vec::new();
        let mut buffer = String::new();

        loop {
            buffer.clear();
            let bytes_read = reader.read_line(&mut buffer)?;
            if bytes_read == 0 || !buffer.ends_with('\n') {
                break;
            }
            self.position += bytes_read as u64;
            lines.push(buffer.trim_end_matches(&['\r', '\n'][..]).to_string());
        }

        Ok(lines)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
