//! Sliding window over the most recent layout rounds.

use std::collections::VecDeque;

use qlc_circuit::MeasurementRecordsMap;
use qlc_core::{ErrorInfo, QlcError};
use qlc_plaquette::Plaquettes;

use crate::blocks::LayoutTemplate;

/// One visited round.
#[derive(Debug, Clone, PartialEq)]
pub struct LookbackEntry {
    /// Template of the round.
    pub template: LayoutTemplate,
    /// Plaquettes filling the template.
    pub plaquettes: Plaquettes,
    /// Measurements performed by the round alone.
    pub records: MeasurementRecordsMap,
}

/// Rounds selected by [`LookbackStack::lookback`], oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct LookbackWindow {
    /// Templates of the window.
    pub templates: Vec<LayoutTemplate>,
    /// Plaquettes of the window, one collection per template.
    pub plaquettes: Vec<Plaquettes>,
    /// Measurements of the whole window, the most recent one at offset `-1`.
    pub records: MeasurementRecordsMap,
}

#[derive(Debug, Clone, Default)]
struct Frame {
    entries: VecDeque<LookbackEntry>,
    dropped: usize,
}

impl Frame {
    fn len(&self) -> usize {
        self.dropped + self.entries.len()
    }

    fn push(&mut self, entry: LookbackEntry, depth: Option<usize>) {
        self.entries.push_back(entry);
        if let Some(depth) = depth {
            while self.entries.len() > depth {
                self.entries.pop_front();
                self.dropped += 1;
            }
        }
    }
}

/// Stack of rounds mirroring the nesting of repeat blocks.
///
/// Only the innermost frame receives new rounds. Closing a repeat block
/// replays its rounds into the enclosing frame. With a depth, each frame
/// only keeps that many of its most recent rounds.
#[derive(Debug, Clone)]
pub struct LookbackStack {
    frames: Vec<Frame>,
    depth: Option<usize>,
}

impl Default for LookbackStack {
    fn default() -> Self {
        Self::new()
    }
}

impl LookbackStack {
    /// Stack keeping every round.
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
            depth: None,
        }
    }

    /// Stack keeping at most `depth` rounds per frame.
    pub fn with_depth(depth: usize) -> Result<Self, QlcError> {
        check_depth(depth)?;
        Ok(Self {
            frames: vec![Frame::default()],
            depth: Some(depth),
        })
    }

    /// Records a round in the innermost frame.
    pub fn append(
        &mut self,
        template: LayoutTemplate,
        plaquettes: Plaquettes,
        records: MeasurementRecordsMap,
    ) {
        let depth = self.depth;
        if let Some(frame) = self.frames.last_mut() {
            frame.push(
                LookbackEntry {
                    template,
                    plaquettes,
                    records,
                },
                depth,
            );
        }
    }

    /// Opens a frame for the body of a repeat block.
    pub fn enter_repeat_block(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Closes the innermost repeat block, executed `repetitions` times.
    pub fn close_repeat_block(&mut self, repetitions: u64) -> Result<(), QlcError> {
        if self.frames.len() < 2 {
            return Err(QlcError::Precondition(ErrorInfo::new(
                "no-open-repeat-block",
                "cannot close a repeat block that was never entered",
            )));
        }
        if repetitions < 1 {
            return Err(QlcError::Construction(
                ErrorInfo::new("invalid-repetitions", "a repeat block runs at least once")
                    .with_context("repetitions", repetitions.to_string()),
            ));
        }
        let Some(body) = self.frames.pop() else {
            return Ok(());
        };
        let depth = self.depth;
        let Some(parent) = self.frames.last_mut() else {
            return Ok(());
        };
        if body.entries.is_empty() {
            parent.dropped += body.dropped * repetitions as usize;
            return Ok(());
        }
        let body_len = body.len();
        let replayed = match depth {
            Some(depth) => (repetitions as usize).min(depth / body.entries.len() + 1),
            None => repetitions as usize,
        };
        parent.dropped += (repetitions as usize - replayed) * body_len + replayed * body.dropped;
        for _ in 0..replayed {
            for entry in &body.entries {
                parent.push(entry.clone(), depth);
            }
        }
        Ok(())
    }

    /// Number of rounds recorded so far, including evicted ones.
    pub fn len(&self) -> Result<usize, QlcError> {
        match self.frames.as_slice() {
            [frame] => Ok(frame.len()),
            _ => Err(QlcError::Precondition(
                ErrorInfo::new(
                    "open-repeat-block",
                    "the length is only defined outside of repeat blocks",
                )
                .with_context("open_blocks", (self.frames.len() - 1).to_string()),
            )),
        }
    }

    /// Returns `true` before the first round.
    pub fn is_empty(&self) -> bool {
        self.frames.iter().all(|frame| frame.len() == 0)
    }

    /// The `length` most recent rounds, looking into enclosing frames when
    /// the innermost one is too short. Fewer rounds are returned when less
    /// history is available.
    pub fn lookback(&self, length: usize) -> Result<LookbackWindow, QlcError> {
        check_depth(length)?;
        let mut selected: Vec<&LookbackEntry> = Vec::with_capacity(length);
        for frame in self.frames.iter().rev() {
            for entry in frame.entries.iter().rev() {
                if selected.len() == length {
                    break;
                }
                selected.push(entry);
            }
        }
        selected.reverse();
        let records = selected
            .iter()
            .fold(MeasurementRecordsMap::default(), |merged, entry| {
                merged.with_added_measurements(&entry.records)
            });
        Ok(LookbackWindow {
            templates: selected.iter().map(|entry| entry.template.clone()).collect(),
            plaquettes: selected.iter().map(|entry| entry.plaquettes.clone()).collect(),
            records,
        })
    }
}

fn check_depth(depth: usize) -> Result<(), QlcError> {
    if depth < 1 {
        return Err(QlcError::Construction(
            ErrorInfo::new("invalid-lookback", "the lookback depth must be at least 1")
                .with_context("lookback", depth.to_string()),
        ));
    }
    Ok(())
}
