pub mod artifact;
pub mod features;
pub mod labels;
pub mod model;
pub mod pipeline;
pub mod text;

pub use artifact::ModelArtifact;
pub use features::{FeatureVector, Vocabulary};
pub use labels::{assign, DEFAULT_THRESHOLD};
pub use model::LinearClassifier;
pub use pipeline::ClassificationPipeline;
pub use text::Normalizer;

pub mod prelude {
    pub use crate::artifact::ModelArtifact;
    pub use crate::pipeline::ClassificationPipeline;
    pub use crate::text::Normalizer;
    pub use nk_core::{ClassifiedArticle, Error, RawEntry, Result};
}
