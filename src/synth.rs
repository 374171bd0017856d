//! Prime / Wipe Synthesizers
//!
//! Both replay the geometry of a captured prime tower section. The wipe
//! trace drags the nozzle over it without extruding; the prime trace adds a
//! warm-up pass ahead of the real prime when the tool is not hot yet.

use crate::block::BlockState;
use crate::error::{Error, Result, TemperatureKind};
use crate::parser::{self, Instruction, ParsedLine};
use crate::rewrite::{is_motion, rewrite_move};
use crate::tracker::{TemperatureCommand, ToolId, ToolTemperatures};

pub const WIPE_BANNER: &str = ";WIPE-PRIME-TOWER";
pub const PRIME_BANNER: &str = ";PRE-PRIME-TOWER";

/// Tunables for synthesized traces
#[derive(Debug, Clone, PartialEq)]
pub struct SynthSettings {
    /// Wipe feed rate, mm/min
    pub feed_override: f64,
    /// Feed multiplier for repositioning before the first horizontal move
    pub fast_feed_multiplier: f64,
    /// Lines cut from the end of a wipe trace. Empirical: drops the jog
    /// back towards the part at the end of a tower section.
    pub wipe_trailing_discard: usize,
    /// How far the warm-up trace runs below the print height
    pub prime_dip: f64,
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            feed_override: 300.0,
            fast_feed_multiplier: 15.0,
            wipe_trailing_discard: 5,
            prime_dip: 0.2,
        }
    }
}

impl SynthSettings {
    pub fn fast_feed(&self) -> f64 {
        self.feed_override * self.fast_feed_multiplier
    }
}

/// Replay of a prime tower section as a non-extruding wipe
#[derive(Debug, Clone)]
pub struct WipeTrace<'a> {
    /// Tool whose section is replayed
    pub tool: ToolId,
    /// Height forced at the first horizontal move
    pub height: Option<f64>,
    /// When present, every tool is dropped to idle before the wipe and the
    /// replayed tool is waited on after it
    pub idle: Option<&'a ToolTemperatures>,
}

impl WipeTrace<'_> {
    pub fn synthesize(&self, lines: &[String], settings: &SynthSettings) -> Result<Vec<String>> {
        let mut out = vec![WIPE_BANNER.to_string()];

        let settle = match self.idle {
            Some(idle) => {
                out.extend(
                    idle.iter()
                        .map(|(&tool, &temp)| TemperatureCommand::set(tool, temp).to_line()),
                );
                let temp = idle.get(&self.tool).ok_or(Error::MissingTemperature {
                    kind: TemperatureKind::Idle,
                    tool: self.tool,
                    state: BlockState::ExtruderEnd,
                })?;
                Some(TemperatureCommand::wait(self.tool, *temp).to_line())
            }
            None => None,
        };

        let mut lowered = false;
        for line in lines {
            if lowered {
                out.push(rewrite_move(line, settings.feed_override, None)?);
                continue;
            }
            out.push(rewrite_move(line, settings.fast_feed(), None)?);
            if is_horizontal_move(&parser::parse_line(line)?) {
                out.push(rewrite_move(line, settings.feed_override, self.height)?);
                lowered = true;
            }
        }

        out.truncate(out.len().saturating_sub(settings.wipe_trailing_discard));
        out.extend(settle);
        Ok(out)
    }
}

/// G0/G1 moving in X or Y
fn is_horizontal_move(line: &ParsedLine) -> bool {
    line.operation().is_some_and(is_motion) && (line.has('X') || line.has('Y'))
}

/// Prime section preceded by its temperature ramp and, if `pre_ramp`, a
/// warm-up wipe run slightly below the print height
pub fn prime_trace(
    lines: &[String],
    tool: ToolId,
    pre_ramp: bool,
    printing: &ToolTemperatures,
    settings: &SynthSettings,
) -> Result<Vec<String>> {
    let temp = printing.get(&tool).ok_or(Error::MissingTemperature {
        kind: TemperatureKind::Printing,
        tool,
        state: BlockState::Prime,
    })?;

    let mut out = vec![
        PRIME_BANNER.to_string(),
        TemperatureCommand::set(tool, *temp).to_line(),
    ];

    if pre_ramp {
        let warm_up = WipeTrace {
            tool,
            height: None,
            idle: None,
        }
        .synthesize(lines, settings)?;

        out.extend(relative_dip(-settings.prime_dip));
        out.extend(warm_up);
        out.extend(relative_dip(settings.prime_dip));
    }

    out.extend(lines.iter().cloned());
    Ok(out)
}

fn relative_dip(dz: f64) -> [String; 3] {
    [
        "G91".to_string(),
        Instruction::new("G0").with('Z', dz).serialize(),
        "G90".to_string(),
    ]
}
