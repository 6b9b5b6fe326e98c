//! Daily rotating JSONL file.
//!
//! The active file is always `<dir>/<service>.jsonl`. When the local date
//! changes, it is archived as `<dir>/<service>-YYYY-MM-DD.jsonl` (the date the
//! lines were written) and a new active file is opened.

use chrono::{DateTime, Local, NaiveDate};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const EXTENSION: &str = "jsonl";
const DATE_FORMAT: &str = "%Y-%m-%d";

fn active_path(dir: &Path, service: &str) -> PathBuf {
    dir.join(format!("{service}.{EXTENSION}"))
}

fn archive_path(dir: &Path, service: &str, date: NaiveDate) -> PathBuf {
    dir.join(format!("{service}-{}.{EXTENSION}", date.format(DATE_FORMAT)))
}

fn open_append(path: &Path) -> io::Result<BufWriter<File>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(BufWriter::with_capacity(8192, file))
}

/// Local date of the file's last modification, if it exists.
fn modified_date(path: &Path) -> io::Result<Option<NaiveDate>> {
    match fs::metadata(path) {
        Ok(metadata) => {
            let modified: DateTime<Local> = metadata.modified()?.into();
            Ok(Some(modified.date_naive()))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Moves the active file to its archive name, appending if the archive exists.
fn archive(active: &Path, archived: &Path) -> io::Result<()> {
    if archived.exists() {
        let mut source = File::open(active)?;
        let mut target = OpenOptions::new().append(true).open(archived)?;
        io::copy(&mut source, &mut target)?;
        fs::remove_file(active)
    } else {
        fs::rename(active, archived)
    }
}

/// Deletes all but the newest `retain` archives of `service` in `dir`.
fn prune(dir: &Path, service: &str, retain: usize) -> io::Result<()> {
    if retain == 0 {
        return Ok(());
    }

    let prefix = format!("{service}-");
    let suffix = format!(".{EXTENSION}");
    let mut archives: Vec<(NaiveDate, PathBuf)> = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(date) = name
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix(&suffix))
            .and_then(|raw| NaiveDate::parse_from_str(raw, DATE_FORMAT).ok())
        else {
            continue;
        };
        archives.push((date, entry.path()));
    }

    archives.sort_by(|a, b| b.0.cmp(&a.0));
    for (_, path) in archives.into_iter().skip(retain) {
        fs::remove_file(path)?;
    }
    Ok(())
}

struct RotatingFile {
    dir: PathBuf,
    service: String,
    retain: usize,
    date: NaiveDate,
    file: BufWriter<File>,
}

impl RotatingFile {
    fn open(dir: &Path, service: &str, retain: usize, today: NaiveDate) -> io::Result<Self> {
        fs::create_dir_all(dir)?;

        let active = active_path(dir, service);
        if let Some(written) = modified_date(&active)? {
            // Left over from a run on an earlier day.
            if written < today {
                archive(&active, &archive_path(dir, service, written))?;
            }
        }
        prune(dir, service, retain)?;

        Ok(Self {
            dir: dir.to_path_buf(),
            service: service.to_string(),
            retain,
            date: today,
            file: open_append(&active)?,
        })
    }

    fn roll_if_needed(&mut self, today: NaiveDate) -> io::Result<()> {
        if today <= self.date {
            return Ok(());
        }

        self.file.flush()?;
        let active = active_path(&self.dir, &self.service);
        archive(&active, &archive_path(&self.dir, &self.service, self.date))?;
        self.file = open_append(&active)?;
        self.date = today;
        prune(&self.dir, &self.service, self.retain)
    }

    fn write_on(&mut self, buf: &[u8], today: NaiveDate) -> io::Result<usize> {
        self.roll_if_needed(today)?;
        let written = self.file.write(buf)?;
        // Flush per write so other processes tailing the file see whole lines.
        self.file.flush()?;
        Ok(written)
    }
}

/// Append-only writer over the service's daily rotating log file.
#[derive(Clone)]
pub struct RotatingFileWriter {
    inner: Arc<Mutex<RotatingFile>>,
}

impl RotatingFileWriter {
    /// Opens (creating if needed) `<dir>/<service>.jsonl`.
    ///
    /// A leftover active file from an earlier day is archived first.
    pub fn new(dir: &Path, service: &str, retain_days: usize) -> io::Result<Self> {
        Self::open_on(dir, service, retain_days, Local::now().date_naive())
    }

    fn open_on(dir: &Path, service: &str, retain_days: usize, today: NaiveDate) -> io::Result<Self> {
        let file = RotatingFile::open(dir, service, retain_days, today)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(file)),
        })
    }

    /// Path of the file currently written to.
    pub fn active_path(&self) -> PathBuf {
        let guard = self.inner.lock();
        active_path(&guard.dir, &guard.service)
    }

    fn write_on(&self, buf: &[u8], today: NaiveDate) -> io::Result<usize> {
        self.inner.lock().write_on(buf, today)
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_on(buf, Local::now().date_naive())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_writes_to_active_file() {
        let dir = tempdir().unwrap();
        let logs = dir.path().join("logs");
        let mut writer = RotatingFileWriter::new(&logs, "bot", 7).unwrap();

        writer.write_all(b"first line\n").unwrap();

        assert_eq!(writer.active_path(), logs.join("bot.jsonl"));
        let content = fs::read_to_string(logs.join("bot.jsonl")).unwrap();
        assert_eq!(content, "first line\n");
    }

    #[test]
    fn test_rolls_over_on_date_change() {
        let dir = tempdir().unwrap();
        let writer = RotatingFileWriter::open_on(dir.path(), "bot", 7, day(1)).unwrap();

        writer.write_on(b"day one\n", day(1)).unwrap();
        writer.write_on(b"day two\n", day(2)).unwrap();

        let archived = fs::read_to_string(dir.path().join("bot-2024-03-01.jsonl")).unwrap();
        let active = fs::read_to_string(dir.path().join("bot.jsonl")).unwrap();
        assert_eq!(archived, "day one\n");
        assert_eq!(active, "day two\n");
    }

    #[test]
    fn test_prunes_old_archives() {
        let dir = tempdir().unwrap();
        let writer = RotatingFileWriter::open_on(dir.path(), "bot", 2, day(1)).unwrap();

        for d in 1..=5 {
            writer.write_on(format!("day {d}\n").as_bytes(), day(d)).unwrap();
        }

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec!["bot-2024-03-03.jsonl", "bot-2024-03-04.jsonl", "bot.jsonl"]
        );
    }

    #[test]
    fn test_prune_ignores_other_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("other-2020-01-01.jsonl"), "x").unwrap();
        fs::write(dir.path().join("bot-notadate.jsonl"), "x").unwrap();
        fs::write(dir.path().join("bot-2020-01-01.jsonl"), "x").unwrap();
        fs::write(dir.path().join("bot-2020-01-02.jsonl"), "x").unwrap();

        prune(dir.path(), "bot", 1).unwrap();

        assert!(dir.path().join("other-2020-01-01.jsonl").exists());
        assert!(dir.path().join("bot-notadate.jsonl").exists());
        assert!(!dir.path().join("bot-2020-01-01.jsonl").exists());
        assert!(dir.path().join("bot-2020-01-02.jsonl").exists());
    }

    #[test]
    fn test_archives_stale_active_file_on_open() {
        let dir = tempdir().unwrap();
        let active = dir.path().join("bot.jsonl");
        fs::write(&active, "old run\n").unwrap();

        let two_days_ago = SystemTime::now() - Duration::from_secs(2 * 24 * 60 * 60);
        File::options()
            .write(true)
            .open(&active)
            .unwrap()
            .set_modified(two_days_ago)
            .unwrap();
        let written: DateTime<Local> = two_days_ago.into();

        let mut writer = RotatingFileWriter::new(dir.path(), "bot", 0).unwrap();
        writer.write_all(b"new run\n").unwrap();

        let archived = archive_path(dir.path(), "bot", written.date_naive());
        assert_eq!(fs::read_to_string(archived).unwrap(), "old run\n");
        assert_eq!(fs::read_to_string(&active).unwrap(), "new run\n");
    }

    #[test]
    fn test_archive_appends_to_existing() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bot-2024-03-01.jsonl"), "a\n").unwrap();
        let writer = RotatingFileWriter::open_on(dir.path(), "bot", 0, day(1)).unwrap();

        writer.write_on(b"b\n", day(1)).unwrap();
        writer.write_on(b"c\n", day(2)).unwrap();

        let archived = fs::read_to_string(dir.path().join("bot-2024-03-01.jsonl")).unwrap();
        assert_eq!(archived, "a\nb\n");
    }
}
