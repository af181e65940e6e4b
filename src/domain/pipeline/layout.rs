use std::path::{Path, PathBuf};

/// File locations of one episode, all under `<root>/<date>/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    date: String,
    dir: PathBuf,
}

impl RunLayout {
    pub fn new(root: &Path, date: &str) -> Self {
        Self {
            date: date.to_string(),
            dir: root.join(date),
        }
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn news_path(&self) -> PathBuf {
        self.dir.join("news.txt")
    }

    pub fn show_notes_path(&self) -> PathBuf {
        self.dir.join("show_notes.md")
    }

    pub fn script_path(&self) -> PathBuf {
        self.dir.join("talks.txt")
    }

    pub fn dialogues_path(&self) -> PathBuf {
        self.dir.join("dialogues.json")
    }

    pub fn splits_dir(&self) -> PathBuf {
        self.dir.join("splits")
    }

    /// Segments merged without the intro
    pub fn body_path(&self) -> PathBuf {
        self.dir.join("body.mp3")
    }

    pub fn final_audio_path(&self) -> PathBuf {
        self.dir.join(format!("{}.mp3", self.date))
    }
}
