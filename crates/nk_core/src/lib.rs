pub mod error;
pub mod storage;
pub mod types;

pub use error::Error;
pub use storage::{ArticleQuery, NewsStore};
pub use types::{CanonicalArticle, CategoryCount, ClassifiedArticle, RawEntry};

pub type Result<T> = std::result::Result<T, Error>;

pub mod prelude {
    pub use crate::storage::{ArticleQuery, NewsStore};
    pub use crate::types::{CanonicalArticle, CategoryCount, ClassifiedArticle, RawEntry};
    pub use crate::{Error, Result};
}
