//! Block Segmenter
//!
//! Partitions the stream into typed blocks at annotation triggers. The open
//! block is sealed, with a snapshot of the per-tool targets, the moment a
//! trigger is seen; the trigger line starts the new block.

use super::temperature::TemperatureTracker;
use super::{apply_transitions, SourceLine, Tracker, Transition};
use crate::block::{Block, BlockState, TriggerTable};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Segmenter {
    temperatures: TemperatureTracker,
    triggers: TriggerTable,
    blocks: Vec<Block>,
    current: Block,
}

const TRANSITIONS: [Transition<Segmenter>; 2] = [track_temperatures, segment];

impl Segmenter {
    pub fn new(triggers: TriggerTable) -> Self {
        Self {
            temperatures: TemperatureTracker::new(),
            triggers,
            blocks: Vec::new(),
            current: Block::new(BlockState::Init, 0, 0.0),
        }
    }

    /// Sealed blocks followed by the open one, which is snapshotted as if
    /// the stream ended here
    pub fn blocks(&self) -> Vec<Block> {
        let mut blocks = self.blocks.clone();
        blocks.push(self.closing_block());
        blocks
    }

    pub fn into_parts(self) -> (Vec<Block>, TemperatureTracker) {
        let last = self.closing_block();
        let mut blocks = self.blocks;
        blocks.push(last);
        (blocks, self.temperatures)
    }

    fn closing_block(&self) -> Block {
        let mut block = self.current.clone();
        block.finish_targets = self.temperatures.targets.clone();
        block
    }

    fn seal(&mut self, next: BlockState) {
        let opened = Block::new(
            next,
            self.temperatures.active_tool(),
            self.temperatures.height(),
        );
        let mut sealed = std::mem::replace(&mut self.current, opened);
        sealed.finish_targets = self.temperatures.targets.clone();

        log::debug!(
            "Sealed {} block on T{} ({} lines, Z{} -> Z{})",
            sealed.state,
            sealed.active_tool,
            sealed.lines.len(),
            sealed.start_height,
            sealed.finish_height
        );
        self.blocks.push(sealed);
    }
}

impl Tracker for Segmenter {
    fn observe(&mut self, line: &SourceLine<'_>) -> Result<()> {
        apply_transitions(self, &TRANSITIONS, line)
    }
}

fn track_temperatures(segmenter: &mut Segmenter, line: &SourceLine<'_>) -> Result<()> {
    segmenter.temperatures.observe(line)
}

fn segment(segmenter: &mut Segmenter, line: &SourceLine<'_>) -> Result<()> {
    let next: Vec<BlockState> = segmenter.triggers.matches(line.text).collect();
    for state in next {
        segmenter.seal(state);
    }

    segmenter.current.finish_height = segmenter.temperatures.height();
    segmenter.current.lines.push(line.text.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::Target;

    fn segment_lines(lines: &[&str]) -> Vec<Block> {
        let mut segmenter = Segmenter::new(TriggerTable::standard().unwrap());
        segmenter.process_lines(lines).unwrap();
        segmenter.blocks()
    }

    const PROGRAM: &[&str] = &[
        "M104 T0 S210",
        "M109 T1 S205",
        ";END-INIT",
        "G0 Z0.3",
        ";TYPE:WALL-OUTER",
        "G1 X1 Y1 E1",
        ";TYPE:PRIME-TOWER",
        "G1 X50 Y50 E2",
        "G0 Z0.5",
        "; EXTRUDER END HOME",
        "T1",
        "; EXTRUDER START HOME",
        "  ;TYPE:SKIN  ",
        "G1 X2 Y2 E3",
    ];

    #[test]
    fn test_blocks_follow_triggers() {
        let blocks = segment_lines(PROGRAM);
        let states: Vec<_> = blocks.iter().map(|b| b.state).collect();
        assert_eq!(
            states,
            vec![
                BlockState::Init,
                BlockState::PostInit,
                BlockState::Part,
                BlockState::Prime,
                BlockState::ExtruderEnd,
                BlockState::ExtruderStart,
                BlockState::Part,
            ]
        );
        assert_eq!(blocks[2].lines[0], ";TYPE:WALL-OUTER");
        assert_eq!(blocks[6].lines[0], ";TYPE:SKIN");
    }

    #[test]
    fn test_concatenation_reproduces_input() {
        let blocks = segment_lines(PROGRAM);
        let flattened: Vec<&str> = blocks
            .iter()
            .flat_map(|b| b.lines.iter().map(String::as_str))
            .collect();
        let trimmed: Vec<&str> = PROGRAM.iter().map(|l| l.trim()).collect();
        assert_eq!(flattened, trimmed);
    }

    #[test]
    fn test_heights_and_tools() {
        let blocks = segment_lines(PROGRAM);

        let prime = &blocks[3];
        assert_eq!(prime.active_tool, 0);
        assert_eq!(prime.start_height, 0.3);
        assert_eq!(prime.finish_height, 0.5);

        let part = &blocks[6];
        assert_eq!(part.active_tool, 1);
        assert_eq!(part.start_height, 0.5);
    }

    #[test]
    fn test_snapshot_taken_at_seal() {
        let blocks = segment_lines(&[
            "M104 S200",
            ";TYPE:PRIME-TOWER",
            "M109 S200",
            ";TYPE:FILL",
            "M104 S180",
        ]);

        assert_eq!(
            blocks[0].finish_targets[&0],
            Target {
                temperature: 200,
                reached: false
            }
        );
        assert!(blocks[1].finish_targets[&0].satisfies(200));
        assert_eq!(blocks[2].finish_targets[&0].temperature, 180);
    }

    #[test]
    fn test_no_triggers_single_init_block() {
        let blocks = segment_lines(&["G28", "G1 X1 Y1"]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].state, BlockState::Init);
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let mut segmenter = Segmenter::new(TriggerTable::standard().unwrap());
        let err = segmenter
            .process_lines(["G28", "G1 Xnope"])
            .unwrap_err();
        assert!(err.to_string().starts_with("line 2"));
    }
}
