pub mod extractor;
pub mod labels;

pub use extractor::{
    argmax, classify, named, positional, rank, ClassificationResult, ResultExtractor, ScoredLabel,
};
pub use labels::ClassLabelTable;
