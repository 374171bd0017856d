//! G-code Post-Processor
//!
//! Rewrites multi-tool G-code so that temperature changes happen in the
//! right place around prime tower sections.
//!
//! This library provides:
//! - G-code line parsing and rewriting
//! - Annotation-driven block segmentation with temperature tracking
//! - Prime warm-up and wipe synthesis
//! - Configuration management

pub mod block;
pub mod cli;
pub mod config;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod rewrite;
pub mod synth;
pub mod tracker;
pub mod transform;

pub use block::{Block, BlockState, TriggerTable};
pub use config::Config;
pub use error::{Error, Result};
pub use parser::{parse_line, Instruction, ParsedLine};
pub use pipeline::{process_lines, render_output, ProcessOptions};
