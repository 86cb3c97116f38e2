pub mod db_wait;
pub mod ingestion_worker;

pub use db_wait::wait_for_database;
pub use ingestion_worker::{IngestionWorker, WorkerConfig};
