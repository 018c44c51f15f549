use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use super::CredentialSource;

/// Simulates a card reader with two directories. Inserting a card means
/// placing a file named after the reader in the card slot directory;
/// confiscated cards are moved to the retained cards directory.
#[derive(Debug)]
pub struct DirectoryCardReader {
    name: String,
    card_slot_dir: PathBuf,
    retained_card_dir: PathBuf,
    confiscated: u32,
}

impl DirectoryCardReader {
    pub fn new(
        name: impl Into<String>,
        card_slot_dir: impl Into<PathBuf>,
        retained_card_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            card_slot_dir: card_slot_dir.into(),
            retained_card_dir: retained_card_dir.into(),
            confiscated: 0,
        }
    }

    pub fn card_path(&self) -> PathBuf {
        self.card_slot_dir.join(&self.name)
    }

    pub fn retained_card_dir(&self) -> &Path {
        &self.retained_card_dir
    }
}

impl CredentialSource for DirectoryCardReader {
    fn present(&mut self) -> io::Result<Option<String>> {
        match fs::read_to_string(self.card_path()) {
            Ok(contents) => Ok(Some(contents.lines().next().unwrap_or_default().to_owned())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn evict(&mut self) -> io::Result<()> {
        debug!(reader = %self.name, "ejecting card");
        match fs::remove_file(self.card_path()) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }

    fn confiscate(&mut self) -> io::Result<()> {
        self.confiscated += 1;
        let retained = self
            .retained_card_dir
            .join(format!("{}.{}", self.name, self.confiscated));
        info!(reader = %self.name, path = %retained.display(), "retaining card");
        fs::rename(self.card_path(), retained)
    }
}
