//! Cartograph core library — code graph model, normalizer, resolver,
//! assembler, and serializer.
//!
//! The main entry point is [`pipeline::GraphPipeline`], which runs
//! Classifier → Extractor → Normalizer per file in parallel, then the
//! whole-repository Resolver and Assembler, and hands back a
//! [`model::CodeGraph`] plus side-channel [`diagnostics::Diagnostics`].

pub mod assemble;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod resolve;
pub mod serialize;
