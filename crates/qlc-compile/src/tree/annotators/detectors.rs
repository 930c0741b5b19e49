//! Computes the detectors ending in every leaf.

use qlc_circuit::MeasurementRecordsMap;
use qlc_core::{ErrorInfo, QlcError};
use tracing::debug;

use crate::detectors::{compute_detectors_for_fixed_radius, DetectorEngine, LookbackStack};
use crate::tree::annotations::DetectorAnnotation;
use crate::tree::node::{LayerNode, NodeWalker};

/// Walks leaves in time order, keeping the last `lookback` rounds to search
/// the detectors of each new round.
///
/// Detectors of a repeated body are computed once, against the rounds
/// preceding its first repetition.
#[derive(Debug)]
pub struct AnnotateDetectorsOnLayoutNode<'a> {
    k: u32,
    manhattan_radius: usize,
    lookback: usize,
    engine: &'a DetectorEngine,
    stack: LookbackStack,
}

impl<'a> AnnotateDetectorsOnLayoutNode<'a> {
    /// Walker for scale `k`; `lookback` must be at least 1.
    pub fn new(
        k: u32,
        manhattan_radius: usize,
        lookback: usize,
        engine: &'a DetectorEngine,
    ) -> Result<Self, QlcError> {
        Ok(Self {
            k,
            manhattan_radius,
            lookback,
            engine,
            stack: LookbackStack::with_depth(lookback)?,
        })
    }
}

impl NodeWalker for AnnotateDetectorsOnLayoutNode<'_> {
    fn enter_node(&mut self, node: &mut LayerNode) -> Result<(), QlcError> {
        if node.is_repeated() {
            self.stack.enter_repeat_block();
        }
        Ok(())
    }

    fn visit_node(&mut self, node: &mut LayerNode) -> Result<(), QlcError> {
        let Some(layout) = node.layout() else {
            return Ok(());
        };
        let Some(circuit) = node.annotations(self.k).and_then(|a| a.circuit.as_ref()) else {
            return Err(QlcError::Precondition(
                ErrorInfo::new(
                    "missing-circuit",
                    "leaf circuits must be annotated before detectors",
                )
                .with_context("k", self.k.to_string()),
            ));
        };
        let records = MeasurementRecordsMap::from_scheduled_circuit(circuit);
        let (template, plaquettes) = layout.to_template_and_plaquettes()?;
        let origin = layout.frame_origin(self.k);
        self.stack.append(template, plaquettes, records);

        let window = self.stack.lookback(self.lookback)?;
        let detectors = compute_detectors_for_fixed_radius(
            &window.templates,
            self.k,
            &window.plaquettes,
            self.manhattan_radius,
            self.engine,
        )?;
        let annotations = detectors
            .iter()
            .map(|detector| {
                let shifted = detector.offset_spatially_by(origin);
                DetectorAnnotation::from_detector(&shifted, &window.records)
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            k = self.k,
            rounds = window.templates.len(),
            detectors = annotations.len(),
            "annotated detectors"
        );
        node.annotations_mut(self.k).detectors = annotations;
        Ok(())
    }

    fn exit_node(&mut self, node: &mut LayerNode) -> Result<(), QlcError> {
        if node.is_repeated() {
            self.stack.close_repeat_block(node.repetitions_at(self.k)?)?;
        }
        Ok(())
    }
}
