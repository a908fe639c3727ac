//! World P.A.M.: hypothesis scoring over news-feed keyword evidence.
//!
//! The pipeline runs leaf-first: [`signals::keywords`] counts keyword
//! matches in a [`corpus::Corpus`], [`signals::evidence`] normalizes them,
//! [`signals::scoring`] combines evidence with a prior in log-odds space,
//! [`signals::sampling`] adds Monte Carlo uncertainty, and [`report`] turns
//! the result into text. [`engine::Assessor`] wires the stages together
//! over a resolved [`model::Model`].

pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod feeds;
pub mod model;
pub mod report;
pub mod signals;

pub use engine::{AssessOptions, Assessment, Assessor};
pub use error::{ErrorKind, PamError, PamResult};
pub use model::Model;
