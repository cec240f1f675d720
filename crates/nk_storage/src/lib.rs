pub mod backends;

pub use backends::*;

pub mod prelude {
    pub use super::backends::*;
    pub use nk_core::storage::{ArticleQuery, NewsStore};
}
