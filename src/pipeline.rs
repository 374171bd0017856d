//! End-to-end processing of one program
//!
//! Segmentation pass, transformation pass, then an optional redundancy pass
//! over the flattened lines. Everything is in memory; I/O belongs to the
//! caller.

use log::{info, warn};

use crate::block::{BlockState, TriggerTable};
use crate::error::Result;
use crate::synth::SynthSettings;
use crate::tracker::{RedundancyFilter, Segmenter, Tracker};
use crate::transform::Transformer;

/// Everything a run needs besides the input lines
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub synth: SynthSettings,
    pub triggers: TriggerTable,
    /// Run the redundancy filter over the final output
    pub minimize_temperatures: bool,
}

impl ProcessOptions {
    /// Default synthesis settings and the standard slicer annotations
    pub fn standard() -> Result<Self> {
        Ok(Self {
            synth: SynthSettings::default(),
            triggers: TriggerTable::standard()?,
            minimize_temperatures: false,
        })
    }
}

pub fn process_lines<I, S>(lines: I, options: &ProcessOptions) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut segmenter = Segmenter::new(options.triggers.clone());
    segmenter.process_lines(lines)?;
    let (blocks, temperatures) = segmenter.into_parts();

    info!("Idle temperatures: {:?}", temperatures.idle);
    info!("Printing temperatures: {:?}", temperatures.printing);
    info!("Segmented {} blocks", blocks.len());
    if !blocks.iter().any(|b| b.state == BlockState::Prime) {
        warn!("No prime tower blocks found; output will only carry temperature changes");
    }

    let transformed = Transformer::new(&options.synth, &temperatures.idle, &temperatures.printing)
        .transform(blocks)?;
    let output: Vec<String> = transformed.into_iter().flat_map(|b| b.lines).collect();

    if !options.minimize_temperatures {
        return Ok(output);
    }

    let mut filter = RedundancyFilter::new();
    filter.process_lines(&output)?;
    info!("Dropped {} redundant temperature commands", filter.dropped());
    Ok(filter.into_lines())
}

/// Join lines with CRLF terminators, including after the last one
pub fn render_output<S: AsRef<str>>(lines: &[S]) -> String {
    let mut out = String::with_capacity(lines.iter().map(|l| l.as_ref().len() + 2).sum());
    for line in lines {
        out.push_str(line.as_ref());
        out.push_str("\r\n");
    }
    out
}
