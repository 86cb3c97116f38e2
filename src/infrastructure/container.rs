use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use crate::application::ports::TextExtractor;
use crate::application::services::{IngestionQueue, JobProcessor};
use crate::application::use_cases::{EnqueueUploadUseCase, GetJobStatusUseCase};
use crate::domain::repositories::{
    ChunkRepository, DocumentRepository, EmbeddingRepository, JobRepository,
};
use crate::infrastructure::database::{
    create_connection_pool,
    repositories::{
        PostgresChunkRepository, PostgresDocumentRepository, PostgresEmbeddingRepository,
        PostgresJobRepository,
    },
};
use crate::infrastructure::external_services::{embedder_from_env, structurer_from_env};
use crate::infrastructure::extraction::CompositeTextExtractor;
use crate::infrastructure::worker::{IngestionWorker, WorkerConfig};

pub struct AppContainer {
    pub job_repository: Arc<dyn JobRepository>,
    pub document_repository: Arc<dyn DocumentRepository>,
    pub chunk_repository: Arc<dyn ChunkRepository>,
    pub embedding_repository: Arc<dyn EmbeddingRepository>,

    pub queue: Arc<IngestionQueue>,
    pub processor: Arc<JobProcessor>,
    pub worker: Arc<IngestionWorker>,

    pub enqueue_upload_use_case: Arc<EnqueueUploadUseCase>,
    pub get_job_status_use_case: Arc<GetJobStatusUseCase>,
}

impl AppContainer {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let pool = create_connection_pool()?;

        let job_repository: Arc<dyn JobRepository> =
            Arc::new(PostgresJobRepository::new(pool.clone()));
        let document_repository: Arc<dyn DocumentRepository> =
            Arc::new(PostgresDocumentRepository::new(pool.clone()));
        let chunk_repository: Arc<dyn ChunkRepository> =
            Arc::new(PostgresChunkRepository::new(pool.clone()));
        let embedding_repository: Arc<dyn EmbeddingRepository> =
            Arc::new(PostgresEmbeddingRepository::new(pool));

        let extractor: Arc<dyn TextExtractor> = Arc::new(CompositeTextExtractor::new());
        let structurer = structurer_from_env(extractor)?;
        let embedder = embedder_from_env()?;

        let staging_root = PathBuf::from(
            env::var("UPLOAD_STAGING_DIR").unwrap_or_else(|_| "./uploads".to_string()),
        );

        let queue = Arc::new(IngestionQueue::new(
            job_repository.clone(),
            document_repository.clone(),
        ));
        let processor = Arc::new(JobProcessor::new(
            queue.clone(),
            chunk_repository.clone(),
            embedding_repository.clone(),
            structurer,
            embedder,
            staging_root,
        ));
        let worker = Arc::new(IngestionWorker::new(
            queue.clone(),
            processor.clone(),
            WorkerConfig::default(),
        ));

        let enqueue_upload_use_case = Arc::new(EnqueueUploadUseCase::new(job_repository.clone()));
        let get_job_status_use_case = Arc::new(GetJobStatusUseCase::new(
            job_repository.clone(),
            document_repository.clone(),
        ));

        Ok(Self {
            job_repository,
            document_repository,
            chunk_repository,
            embedding_repository,
            queue,
            processor,
            worker,
            enqueue_upload_use_case,
            get_job_status_use_case,
        })
    }
}
