use anyhow::{Context, Result};
use siege_core::MetricsSnapshot;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Maximum data rows per CSV file before rotating to a new file.
const MAX_ROWS_PER_FILE: usize = 50_000;

/// Rotating metrics CSV writer. Splits into numbered files
/// (`metrics_000.csv`, `metrics_001.csv`, ...) after [`MAX_ROWS_PER_FILE`] rows each.
/// Every file starts with its own header row.
pub struct MetricsFileWriter {
    run_dir: PathBuf,
    file_index: u32,
    rows_in_current_file: usize,
    writer: csv::Writer<File>,
}

impl MetricsFileWriter {
    pub fn new(run_dir: PathBuf) -> Result<Self> {
        let writer = open_csv_file(&run_dir, 0)?;
        Ok(Self {
            run_dir,
            file_index: 0,
            rows_in_current_file: 0,
            writer,
        })
    }

    /// Append one snapshot row, rotating to a new file if the current one is full.
    pub fn write_row(&mut self, snapshot: &MetricsSnapshot) -> Result<()> {
        if self.rows_in_current_file >= MAX_ROWS_PER_FILE {
            self.writer.flush()?;
            self.file_index += 1;
            self.writer = open_csv_file(&self.run_dir, self.file_index)?;
            self.rows_in_current_file = 0;
        }
        self.writer
            .serialize(snapshot)
            .context("serializing metrics row")?;
        self.writer.flush()?;
        self.rows_in_current_file += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("flushing metrics")
    }
}

fn open_csv_file(run_dir: &Path, index: u32) -> Result<csv::Writer<File>> {
    let path = run_dir.join(format!("metrics_{index:03}.csv"));
    csv::Writer::from_path(&path).with_context(|| format!("creating {}", path.display()))
}
