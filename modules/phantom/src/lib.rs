//! Phantom: the article generation pipeline.
//!
//! A job descriptor goes in, a published article comes out. Stages run in
//! order (ingest, write, illustrate, publish) and every external service sits
//! behind a trait in [`traits`].

pub mod draft;
pub mod error;
pub mod feed;
pub mod imagen;
pub mod ingest;
pub mod newsapi;
pub mod pipeline;
pub mod remote;
pub mod store;
pub mod traits;
pub mod unsplash;
pub mod visuals;
pub mod writer;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use draft::ArticleDraft;
pub use error::{PhantomError, Result};
pub use pipeline::{Phantom, PhantomDeps};
pub use remote::{EngineResponse, RemotePipeline};
pub use store::{PgArticleStore, PgImageStorage};
