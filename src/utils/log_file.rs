use chrono::Local;
use parking_lot::Mutex;
use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Лог-файл с ротацией по размеру: `switch_log.txt`, `.1` ... `.N`
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    state: Mutex<OpenFile>,
}

struct OpenFile {
    file: File,
    len: u64,
}

fn open_append(path: &Path) -> io::Result<OpenFile> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let len = file.metadata()?.len();
    Ok(OpenFile { file, len })
}

impl RotatingFile {
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backups: usize) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let state = open_append(&path)?;
        Ok(Self {
            path,
            max_bytes,
            backups,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn rotate(&self, state: &mut OpenFile) -> io::Result<()> {
        state.file.flush()?;

        if self.backups == 0 {
            state.file.set_len(0)?;
            state.len = 0;
            return Ok(());
        }

        // .N-1 -> .N, ..., .1 -> .2; самая старая копия перезаписывается
        for index in (1..self.backups).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                fs::rename(&from, self.backup_path(index + 1))?;
            }
        }
        fs::rename(&self.path, self.backup_path(1))?;

        *state = open_append(&self.path)?;
        Ok(())
    }

    fn write_bytes(&self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();

        if state.len > 0 && state.len + buf.len() as u64 > self.max_bytes {
            if let Err(e) = self.rotate(&mut state) {
                // tracing здесь использовать нельзя - это и есть его writer
                eprintln!("Не удалось выполнить ротацию {:?}: {}", self.path, e);
            }
        }

        state.file.write_all(buf)?;
        state.len += buf.len() as u64;
        Ok(buf.len())
    }
}

impl Write for &RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state.lock().file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFile {
    type Writer = &'a RotatingFile;

    fn make_writer(&'a self) -> Self::Writer {
        self
    }
}

/// Формат строки лог-файла: `2024-01-31 12:00:00 - сообщение`
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "{} - ", Local::now().format(TIMESTAMP_FORMAT))?;

        let level = *event.metadata().level();
        if level == Level::WARN || level == Level::ERROR {
            write!(writer, "{}: ", level)?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{info, warn};

    #[test]
    fn test_rotation_keeps_limited_backups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("switch_log.txt");
        let file = RotatingFile::open(&path, 100, 3).unwrap();

        let line = [b'x'; 60];
        for _ in 0..10 {
            (&file).write_all(&line).unwrap();
        }

        assert!(file.backup_path(1).exists());
        assert!(file.backup_path(2).exists());
        assert!(file.backup_path(3).exists());
        assert!(!file.backup_path(4).exists());
        assert!(fs::metadata(&path).unwrap().len() <= 100);
    }

    #[test]
    fn test_zero_backups_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("switch_log.txt");
        let file = RotatingFile::open(&path, 100, 0).unwrap();

        for _ in 0..5 {
            (&file).write_all(&[b'y'; 60]).unwrap();
        }

        assert!(!file.backup_path(1).exists());
        assert_eq!(fs::metadata(&path).unwrap().len(), 60);
    }

    #[test]
    fn test_appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("switch_log.txt");
        fs::write(&path, "old line\n").unwrap();

        let file = RotatingFile::open(&path, 1024, 3).unwrap();
        (&file).write_all(b"new line\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "old line\nnew line\n");
    }

    #[test]
    fn test_line_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("switch_log.txt");
        let file = RotatingFile::open(&path, 1024 * 1024, 3).unwrap();

        let subscriber = tracing_subscriber::fmt()
            .event_format(LineFormat)
            .with_writer(file)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            info!("Script started");
            warn!("Switch failed");
        });

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let (timestamp, message) = lines[0].split_once(" - ").unwrap();
        assert_eq!(timestamp.len(), "2024-01-31 12:00:00".len());
        assert_eq!(message, "Script started");
        assert!(lines[1].ends_with(" - WARN: Switch failed"));
    }
}
