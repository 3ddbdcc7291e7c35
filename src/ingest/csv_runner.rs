use crate::engine::LedgerEngine;
use crate::ingest::Instruction;
use crate::storage::Storage;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{spawn_blocking, JoinHandle};
use tracing::{debug, error, warn};

/// Counts from one replay of an instruction file.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct RunSummary {
    pub applied: usize,
    pub rejected: usize,
    pub malformed: usize
}

/// Replays an instruction CSV against a ledger engine.
pub struct CsvRunner<S: Storage> {
    engine: Arc<LedgerEngine<S>>,
    backpressure: usize
}

impl<S: Storage> CsvRunner<S> {
    pub fn new(engine: Arc<LedgerEngine<S>>) -> Self {
        Self {
            engine,
            backpressure: 256
        }
    }

    pub fn with_backpressure(mut self, backpressure: usize) -> Self {
        self.backpressure = backpressure.max(1);
        self
    }

    /// Streams the file on a blocking task and applies each instruction in file order.
    ///
    /// Rejected instructions and malformed rows are logged and skipped; a
    /// missing file is logged and produces an empty summary.
    pub async fn run(&self, path: &str) -> anyhow::Result<RunSummary> {
        let (sender, receiver) = mpsc::channel::<Instruction>(self.backpressure);
        let csv_handle = spawn_csv_reader(path.to_string(), sender);
        let mut summary = self.process_instructions(receiver).await;

        match csv_handle.await {
            Ok(malformed) => summary.malformed = malformed,
            Err(error) => error!("CSV ingestion failed: {error}")
        }

        Ok(summary)
    }

    async fn process_instructions(&self, mut receiver: mpsc::Receiver<Instruction>) -> RunSummary {
        let mut summary = RunSummary::default();

        while let Some(instruction) = receiver.recv().await {
            match instruction.apply(&self.engine).await {
                Ok(()) => {
                    debug!("Instruction [{:?}] applied", instruction.instruction_type);
                    summary.applied += 1;
                }
                Err(error) => {
                    warn!("{error}");
                    summary.rejected += 1;
                }
            }
        }

        summary
    }
}

fn spawn_csv_reader(path: String, sender: mpsc::Sender<Instruction>) -> JoinHandle<usize> {
    spawn_blocking(move || {
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(error) => {
                error!("Error opening CSV at path: {path} | {error}");
                return 0;
            }
        };

        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(BufReader::new(file));

        let mut malformed = 0;

        for result in reader.deserialize::<Instruction>() {
            match result {
                Ok(instruction) => {
                    if sender.blocking_send(instruction).is_err() {
                        break;
                    }
                }
                Err(error) => {
                    error!("CSV deserialization error: {error}");
                    malformed += 1;
                }
            }
        }

        malformed
    })
}
