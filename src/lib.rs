#![forbid(unsafe_code)]

pub mod binary;
pub mod cli;
pub mod enhance;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod heuristic;
pub mod html;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod openai;
pub mod pipeline;
pub mod ratelimit;
pub mod sink;
pub mod validate;
