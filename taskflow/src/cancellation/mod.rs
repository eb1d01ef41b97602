//! Structured cancellation shared by the executor and the pipeline.
//!
//! Both components stop cooperatively: every worker, feeder and relay races
//! its data wait against [`CancellationToken::cancelled`].

mod token;

pub use token::CancellationToken;
