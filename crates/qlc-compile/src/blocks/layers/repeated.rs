use std::collections::BTreeSet;

use qlc_core::{ErrorInfo, LinearFunction, QlcError, Scalable2D};

use super::{Layer, SequencedLayers, TemporalReplacements};
use crate::blocks::enums::{SpatialBlockBorder, TemporalBlockBorder};

/// Body layer executed a scalable number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatedLayer {
    body: Box<Layer>,
    repetitions: LinearFunction,
}

impl RepeatedLayer {
    /// Repeats `body`.
    ///
    /// `repetitions` must be non-decreasing and at least 1 for every `k >= 1`,
    /// and at most one of `repetitions` and the body duration may scale.
    pub fn new(body: Layer, repetitions: LinearFunction) -> Result<Self, QlcError> {
        if repetitions.slope < 0 || repetitions.integer_eval(1) < 1 {
            return Err(QlcError::Construction(
                ErrorInfo::new(
                    "invalid-repetitions",
                    "repetitions must be at least 1 for every k >= 1",
                )
                .with_context("repetitions", repetitions.to_string()),
            ));
        }
        let body_timesteps = body.scalable_timesteps();
        if repetitions.is_scalable() && body_timesteps.is_scalable() {
            return Err(QlcError::Construction(
                ErrorInfo::new(
                    "non-linear-timesteps",
                    "a scalable body cannot be repeated a scalable number of times",
                )
                .with_context("repetitions", repetitions.to_string())
                .with_context("body", body_timesteps.to_string()),
            ));
        }
        Ok(Self {
            body: Box::new(body),
            repetitions,
        })
    }

    /// Repeated layer.
    pub fn body(&self) -> &Layer {
        &self.body
    }

    /// Number of repetitions.
    pub fn repetitions(&self) -> LinearFunction {
        self.repetitions
    }

    /// Footprint of the body.
    pub fn scalable_shape(&self) -> Scalable2D {
        self.body.scalable_shape()
    }

    /// `repetitions * body timesteps`, affine by construction.
    pub fn scalable_timesteps(&self) -> LinearFunction {
        let body = self.body.scalable_timesteps();
        match self.repetitions.as_constant() {
            Some(repetitions) => body * repetitions,
            None => self.repetitions * body.offset,
        }
    }

    /// Copy with `borders` trimmed from the body.
    pub fn with_spatial_borders_trimmed(
        &self,
        borders: &BTreeSet<SpatialBlockBorder>,
    ) -> Result<Self, QlcError> {
        Self::new(self.body.with_spatial_borders_trimmed(borders)?, self.repetitions)
    }

    /// Unrolls the first and/or last repetition and replaces their borders.
    ///
    /// The result is `[first?, Repeated(repetitions - n), last?]` where `n` is
    /// the number of unrolled repetitions. The remaining `repetitions - n` must
    /// be a constant `0` or at least 1 at every `k >= 1`: replacing both
    /// borders of `2k - 1` repetitions leaves `2k - 3`, which is negative at
    /// `k = 1`, and fails with `too-few-repetitions`.
    pub fn with_temporal_borders_replaced(
        &self,
        replacements: &TemporalReplacements,
    ) -> Result<Option<Layer>, QlcError> {
        if replacements.is_empty() {
            return Ok(Some(Layer::Repeated(self.clone())));
        }
        let unrolled = replacements.len() as i64;
        let mut layers = Vec::with_capacity(3);
        if let Some(replacement) = replacements.get(&TemporalBlockBorder::ZNegative) {
            let single =
                TemporalReplacements::from([(TemporalBlockBorder::ZNegative, replacement.clone())]);
            layers.extend(self.body.with_temporal_borders_replaced(&single)?);
        }
        let middle = self.repetitions - LinearFunction::constant(unrolled);
        if middle.as_constant() != Some(0) && middle.integer_eval(1) < 1 {
            return Err(QlcError::Construction(
                ErrorInfo::new(
                    "too-few-repetitions",
                    "not enough repetitions to unroll the replaced borders at every k",
                )
                .with_context("repetitions", self.repetitions.to_string())
                .with_context("unrolled", unrolled.to_string()),
            ));
        }
        match middle.as_constant() {
            Some(0) => {}
            Some(1) => layers.push((*self.body).clone()),
            _ => layers.push(Layer::Repeated(Self::new((*self.body).clone(), middle)?)),
        }
        if let Some(replacement) = replacements.get(&TemporalBlockBorder::ZPositive) {
            let single =
                TemporalReplacements::from([(TemporalBlockBorder::ZPositive, replacement.clone())]);
            layers.extend(self.body.with_temporal_borders_replaced(&single)?);
        }
        match layers.len() {
            0 => Ok(None),
            1 => Ok(layers.pop()),
            _ => Ok(Some(Layer::Sequenced(SequencedLayers::new(layers)?))),
        }
    }

    /// Splits the repetitions into consecutive chunks lasting `schedule`.
    ///
    /// Only possible when the body has a constant duration dividing every entry
    /// of `schedule`.
    pub fn to_sequenced_layer_with_schedule(
        &self,
        schedule: &[LinearFunction],
    ) -> Result<SequencedLayers, QlcError> {
        let total: LinearFunction = schedule.iter().copied().sum();
        if total != self.scalable_timesteps() {
            return Err(QlcError::Construction(
                ErrorInfo::new(
                    "schedule-mismatch",
                    "schedule duration differs from the repeated layer duration",
                )
                .with_context("schedule", total.to_string())
                .with_context("layer", self.scalable_timesteps().to_string()),
            ));
        }
        let body_timesteps = self.body.scalable_timesteps();
        let Some(body_duration) = body_timesteps.as_constant() else {
            return Err(QlcError::Unsupported(
                ErrorInfo::new(
                    "scalable-repeated-body",
                    "cannot split the repetitions of a body with a scalable duration",
                )
                .with_context("body", body_timesteps.to_string()),
            ));
        };
        let mut layers = Vec::with_capacity(schedule.len());
        for duration in schedule {
            let repetitions = duration.exact_integer_div(body_duration)?;
            if repetitions == LinearFunction::constant(1) {
                layers.push((*self.body).clone());
            } else {
                layers.push(Layer::Repeated(Self::new((*self.body).clone(), repetitions)?));
            }
        }
        SequencedLayers::new(layers)
    }
}
