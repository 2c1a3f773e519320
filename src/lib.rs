//! Rust client for Google's Gemini content-generation API.
//!
//! This crate provides strongly typed wrappers over the public **v1beta**
//! `generateContent` family of endpoints. Build a request with
//! [`v1beta::request::RequestBuilder`], send it with [`v1beta::rest::Client`],
//! and read the answer from a [`v1beta::response::Response`] or, when
//! streaming, from a [`v1beta::ContentStream`].
//!
//! ## Example
//!
//! ```no_run
//! use gemini::v1beta::{request::{GenerationConfig, RequestBuilder}, rest::Client};
//! use tokio_stream::StreamExt;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new("API_KEY");
//! let request = RequestBuilder::new("gemini-2.0-flash", "Write a story about a magic backpack.")
//!     .with_generation_config(GenerationConfig::new().with_max_output_tokens(64))
//!     .build()?;
//!
//! let mut stream = client.stream_content(request).await?;
//! while let Some(chunk) = stream.next().await {
//!     print!("{}", chunk?.text().unwrap_or_default());
//! }
//! println!("\n{} characters", stream.text().len());
//! # Ok(())
//! # }
//! ```
//!
//! See the `demos` directory for programs covering chat, function calling,
//! structured output, code execution, multimodal prompts and safety settings.

pub mod config;
pub mod v1beta;
