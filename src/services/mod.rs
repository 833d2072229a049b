pub mod backend;
pub mod classifier;
pub mod exercise_extractor;
pub mod llm_service;
pub mod prompts;
pub mod reassembler;
pub mod report_writer;
pub mod retry;
pub mod taxonomy_parser;

pub use backend::{CompletionBackend, CompletionRequest};
pub use classifier::ClassificationClient;
pub use llm_service::LlmService;
pub use reassembler::reassemble;
pub use report_writer::ReportWriter;
pub use retry::{classify_failure, BackoffPolicy, FailureKind};
pub use taxonomy_parser::build_taxonomy;
