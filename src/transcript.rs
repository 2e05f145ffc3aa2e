//! Chat transcript persistence
//!
//! Appends rendered chat messages to plain-text files, one directory per
//! channel or conversation and one file per day:
//! logs/<receiver>/YYYY-MM-DD.log

use chrono::{DateTime, Local};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crate::error::ChatError;
use crate::message::ChatMessage;

/// A transcript line to be written to disk
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    pub receiver: String,
    pub timestamp: DateTime<Local>,
    pub sender: String,
    pub text: String,
    pub is_action: bool,
}

impl TranscriptEntry {
    pub fn from_message(receiver: &str, message: &ChatMessage) -> Self {
        Self {
            receiver: receiver.to_string(),
            timestamp: message.timestamp,
            sender: message.sender.clone(),
            text: message.text.clone(),
            is_action: message.is_action,
        }
    }

    /// `[HH:MM:SS] <sender> text`, or `[HH:MM:SS] * sender text` for actions
    pub fn format_line(&self) -> String {
        let ts = self.timestamp.format("%H:%M:%S");
        if self.is_action {
            format!("[{}] * {} {}", ts, self.sender, self.text)
        } else {
            format!("[{}] <{}> {}", ts, self.sender, self.text)
        }
    }
}

/// Writes transcripts on a background thread so the UI thread never blocks
pub struct Transcript {
    tx: Option<Sender<TranscriptEntry>>,
    handle: Option<JoinHandle<()>>,
}

impl Transcript {
    /// Log under the platform data directory.
    pub fn new() -> Result<Self, ChatError> {
        Self::with_dir(default_log_directory()?)
    }

    pub fn with_dir(log_dir: PathBuf) -> Result<Self, ChatError> {
        fs::create_dir_all(&log_dir)?;

        let (tx, rx) = unbounded::<TranscriptEntry>();
        let handle = thread::Builder::new()
            .name("chat-transcript".into())
            .spawn(move || run_writer_thread(rx, log_dir))?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    /// Queue an entry for writing
    pub fn log(&self, entry: TranscriptEntry) {
        if let Some(tx) = &self.tx {
            // If send fails, the writer thread has stopped
            let _ = tx.send(entry);
        }
    }
}

impl Drop for Transcript {
    fn drop(&mut self) {
        // Closing the channel lets the writer flush and exit
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_writer_thread(rx: Receiver<TranscriptEntry>, log_dir: PathBuf) {
    // Open handles keyed by receiver/date
    let mut file_cache: HashMap<String, BufWriter<File>> = HashMap::new();

    while let Ok(entry) = rx.recv() {
        if let Err(e) = write_entry(&mut file_cache, &log_dir, &entry) {
            tracing::warn!(error = %e, receiver = %entry.receiver, "failed to write transcript");
        }
    }

    for (_, mut writer) in file_cache.drain() {
        let _ = writer.flush();
    }
}

fn write_entry(
    file_cache: &mut HashMap<String, BufWriter<File>>,
    log_dir: &Path,
    entry: &TranscriptEntry,
) -> Result<(), ChatError> {
    let date = entry.timestamp.format("%Y-%m-%d").to_string();
    let receiver = sanitize_filename(&entry.receiver);
    let cache_key = format!("{}/{}", receiver, date);

    let writer = match file_cache.entry(cache_key) {
        std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
        std::collections::hash_map::Entry::Vacant(e) => {
            let dir = log_dir.join(&receiver);
            fs::create_dir_all(&dir)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(format!("{}.log", date)))?;
            e.insert(BufWriter::new(file))
        }
    };

    writeln!(writer, "{}", entry.format_line())?;
    writer.flush()?;
    Ok(())
}

fn default_log_directory() -> Result<PathBuf, ChatError> {
    let base = directories::BaseDirs::new().ok_or(ChatError::ConfigDir)?;
    Ok(base.data_dir().join("lobby-chat").join("logs"))
}

/// Make a receiver name safe to use as a directory name
fn sanitize_filename(name: &str) -> String {
    // "", "." and ".." would resolve to the log directory or its parent
    if name.chars().all(|c| c == '.') {
        return "_".repeat(name.len().max(1));
    }
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            '#' => '_',
            _ => c,
        })
        .collect()
}
