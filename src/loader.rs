use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Instant;

use tracing::{error, info, info_span};

use crate::domain::{Config, MenagerieError};
use crate::record::Record;

/// Result of loading the fixture of one table slot.
#[derive(Debug)]
pub struct LoadOutcome {
    pub slot: usize,
    pub result: Result<Vec<Record>, MenagerieError>,
}

/// Reads a JSON fixture holding an array of records.
pub fn load_records(path: &Path) -> Result<Vec<Record>, MenagerieError> {
    let wrap = |e: MenagerieError| MenagerieError::LoadingFailed(path.to_path_buf(), Box::new(e));

    let contents = fs::read_to_string(path).map_err(|e| wrap(e.into()))?;
    let records: Vec<Record> = serde_json::from_str(&contents).map_err(|e| wrap(e.into()))?;
    Ok(records)
}

/// Starts loading every configured table on the rayon pool.
///
/// Each outcome is sent as soon as its load finishes, in no particular order.
pub fn spawn_loads(config: &Config) -> Receiver<LoadOutcome> {
    let (tx, rx) = mpsc::channel();
    let paths: Vec<PathBuf> = config
        .tables
        .iter()
        .map(|spec| config.fixture_path(spec))
        .collect();

    for (slot, path) in paths.into_iter().enumerate() {
        let tx = tx.clone();
        rayon::spawn(move || {
            let _span = info_span!("load", slot, path = %path.display()).entered();
            let start_time = Instant::now();
            let result = load_records(&path);
            match &result {
                Ok(records) => info!(
                    "Loaded {} records from {} in {}ms",
                    records.len(),
                    path.display(),
                    start_time.elapsed().as_millis()
                ),
                Err(e) => error!("{e}"),
            }
            // The receiver is gone once the application quits
            let _ = tx.send(LoadOutcome { slot, result });
        });
    }
    rx
}
