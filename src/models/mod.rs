pub mod classification;
pub mod difficulty;
pub mod exercise;
pub mod loaders;
pub mod report;
pub mod taxonomy;

pub use classification::{parse_classification, ClassificationResult, SchemaError};
pub use difficulty::Difficulty;
pub use exercise::{EnvTag, ExerciseBlock};
pub use loaders::{load_document, output_paths, OutputPaths};
pub use report::{ProcessStatus, ProcessingResult};
pub use taxonomy::{DifficultyLegend, LeafIndex, LeafKey, Taxonomy, TaxonomyLeaf, TaxonomyTree};
