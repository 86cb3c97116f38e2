pub mod ingestion_queue;
pub mod job_processor;

pub use ingestion_queue::IngestionQueue;
pub use job_processor::JobProcessor;
