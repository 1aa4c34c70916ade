//! # Post Extraction
//!
//! Turns a post URL into normalized post data despite an upstream that changes
//! shape and blocks scripted access.
//!
//! ## Overview
//!
//! - [`PostReference`] - shortcode and kind recovered from any URL shape
//! - [`ExtractionStrategy`] - one independently fallible extraction method
//! - [`ExtractionPipeline`] - tries strategies in order, first success wins
//! - [`PostParser`] - isolated HTML/JSON pattern matching
//! - [`ExtractionOutput`] - the contract handed to presentation and storage
//!
//! ## Usage
//!
//! ```ignore
//! use core_extract::ExtractionPipeline;
//!
//! let pipeline = ExtractionPipeline::new(http_client, &config.extraction);
//! let (reference, post) = pipeline
//!     .extract_url("https://www.instagram.com/p/ABC123/")
//!     .await?;
//! println!("{} via {}", reference, post.strategy);
//! ```

pub mod error;
pub mod model;
pub mod parse;
pub mod pipeline;
pub mod reference;
pub mod strategies;

pub use error::{ExtractError, Result, StrategyFailure};
pub use model::{ExtractedMedia, ExtractedPost, ExtractionOutput, MediaOutput, OwnerOutput};
pub use parse::{HtmlPostParser, PostParser};
pub use pipeline::ExtractionPipeline;
pub use reference::PostReference;
pub use strategies::ExtractionStrategy;
