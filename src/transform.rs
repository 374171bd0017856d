//! Block Transformer
//!
//! Second pass over the segmented blocks. Native temperature control is
//! replaced with synthesized ramps once every tool has printed part
//! geometry, prime tower sections get their ramp and warm-up, and every
//! extruder unload is preceded by a wipe over the last prime section.

use std::collections::BTreeSet;

use log::info;

use crate::block::{Block, BlockState};
use crate::error::{Error, Result, TemperatureKind};
use crate::parser;
use crate::synth::{prime_trace, SynthSettings, WipeTrace};
use crate::tracker::temperature::is_temperature;
use crate::tracker::{Target, Targets, Temperature, TemperatureCommand, ToolId, ToolTemperatures};

/// Insert a printing-temperature command for the block's tool before its
/// first extruding line
///
/// The command is skipped when `previous` already shows the tool waited to
/// printing temperature. Unless the block's own snapshot already targets
/// printing temperature, it records `reached = wait` whether or not the
/// command was skipped.
pub fn inject_temperatures(
    block: Block,
    wait: bool,
    printing: &ToolTemperatures,
    previous: &Targets,
) -> Result<Block> {
    let tool = block.active_tool;
    let mut finish_targets = block.finish_targets.clone();
    let mut lines = Vec::with_capacity(block.lines.len() + 1);
    let mut extruding = false;

    for line in &block.lines {
        if !extruding && parser::parse_line(line)?.has('E') {
            let temp = printing_temperature(printing, tool, block.state)?;
            let satisfied = previous.get(&tool).is_some_and(|t| t.satisfies(temp));
            if !satisfied {
                let command = TemperatureCommand {
                    tool,
                    temperature: temp,
                    wait,
                };
                lines.push(command.to_line());
            }
            if finish_targets.get(&tool).map(|t| t.temperature) != Some(temp) {
                finish_targets.insert(
                    tool,
                    Target {
                        temperature: temp,
                        reached: wait,
                    },
                );
            }
            extruding = true;
        }
        lines.push(line.clone());
    }

    let mut injected = block.with_lines(lines);
    injected.finish_targets = finish_targets;
    Ok(injected)
}

fn printing_temperature(
    printing: &ToolTemperatures,
    tool: ToolId,
    state: BlockState,
) -> Result<Temperature> {
    printing
        .get(&tool)
        .copied()
        .ok_or(Error::MissingTemperature {
            kind: TemperatureKind::Printing,
            tool,
            state,
        })
}

/// Fold state carried from block to block
#[derive(Debug, Default)]
struct Fold {
    output: Vec<Block>,
    /// Finish snapshot of the last emitted block
    last_targets: Targets,
    last_prime: Option<Block>,
    /// Tools that have printed at least one part block
    part_tools: BTreeSet<ToolId>,
}

impl Fold {
    fn emit(&mut self, block: Block) {
        self.last_targets = block.finish_targets.clone();
        self.output.push(block);
    }
}

pub struct Transformer<'a> {
    settings: &'a SynthSettings,
    idle: &'a ToolTemperatures,
    printing: &'a ToolTemperatures,
}

impl<'a> Transformer<'a> {
    pub fn new(
        settings: &'a SynthSettings,
        idle: &'a ToolTemperatures,
        printing: &'a ToolTemperatures,
    ) -> Self {
        Self {
            settings,
            idle,
            printing,
        }
    }

    pub fn transform(&self, blocks: Vec<Block>) -> Result<Vec<Block>> {
        let mut fold = Fold::default();

        for block in blocks {
            if block.state == BlockState::Init {
                fold.emit(block);
                continue;
            }

            // First-layer heuristic: native temperatures stay until every
            // tool has printed part geometry once.
            let block = if fold.part_tools.iter().eq(self.idle.keys()) {
                block.without_operations(is_temperature)?
            } else {
                block
            };

            match block.state {
                BlockState::Prime => self.prime(&mut fold, block)?,
                BlockState::Part => {
                    let tool = block.active_tool;
                    let part =
                        inject_temperatures(block, false, self.printing, &fold.last_targets)?;
                    fold.emit(part);
                    fold.part_tools.insert(tool);
                }
                BlockState::ExtruderEnd => self.extruder_end(&mut fold, block)?,
                _ => fold.emit(block),
            }
        }

        let end = self.end_block(fold.output.last());
        fold.output.push(end);
        Ok(fold.output)
    }

    fn prime(&self, fold: &mut Fold, block: Block) -> Result<()> {
        let tool = block.active_tool;
        let temp = printing_temperature(self.printing, tool, block.state)?;
        let previous = fold.last_targets.get(&tool).copied();
        let pre_ramp = !previous.is_some_and(|t| t.satisfies(temp));
        if pre_ramp {
            match previous {
                Some(t) => info!(
                    "Pre-ramping T{} to {} (prev: {} reached: {})",
                    tool, temp, t.temperature, t.reached
                ),
                None => info!("Pre-ramping T{} to {} (no previous target)", tool, temp),
            }
        }

        let lines = prime_trace(&block.lines, tool, pre_ramp, self.printing, self.settings)?;
        let primed = inject_temperatures(
            block.with_lines(lines),
            true,
            self.printing,
            &fold.last_targets,
        )?;

        fold.last_prime = Some(block);
        fold.emit(primed);
        Ok(())
    }

    // Assumes the last prime section belongs to the tool being unloaded.
    // Not true on the first layer, where the tower base is printed by one
    // tool with the others' brims unannotated.
    fn extruder_end(&self, fold: &mut Fold, block: Block) -> Result<()> {
        let prime = fold.last_prime.as_ref().ok_or(Error::MissingPrimeBlock {
            tool: block.active_tool,
        })?;
        info!(
            "End extruder block on T{}, last prime block on T{} at Z{}",
            block.active_tool, prime.active_tool, prime.finish_height
        );

        let lines = WipeTrace {
            tool: prime.active_tool,
            height: Some(prime.finish_height),
            idle: Some(self.idle),
        }
        .synthesize(&prime.lines, self.settings)?;

        let mut wipe = prime.with_lines(lines);
        wipe.state = BlockState::PrimeWipe;
        wipe.active_tool = block.active_tool;

        fold.emit(wipe);
        fold.emit(block);
        Ok(())
    }

    /// Every tool with a known idle temperature is switched off
    fn end_block(&self, last: Option<&Block>) -> Block {
        let (tool, height) = last.map_or((0, 0.0), |b| (b.active_tool, b.finish_height));
        let mut end = Block::new(BlockState::End, tool, height);
        end.lines = self
            .idle
            .keys()
            .map(|&t| TemperatureCommand::set(t, 0).to_line())
            .collect();
        end
    }
}
