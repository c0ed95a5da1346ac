//! Countdown sequence
//!
//! A countdown is a fixed script: tick the number down, cue the smile,
//! capture, hold the freeze preview, then advance the shot counter.

use std::time::Duration;

use super::camera::FREEZE_DURATION;
use crate::settings::CountdownSettings;

/// Text shown right before the shutter fires
pub const SMILE_TEXT: &str = "SMILE!";

/// Pause between the smile cue and the capture
pub const SMILE_DELAY: Duration = Duration::from_millis(250);

/// One step of a countdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountdownStep {
    /// Replace the countdown text ("" clears it)
    Show(String),
    Wait(Duration),
    Capture,
    /// Increment the shot counter
    Advance,
}

/// The full script for one shot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownPlan {
    steps: Vec<CountdownStep>,
}

impl CountdownPlan {
    pub fn new(settings: &CountdownSettings) -> Self {
        let step = Duration::from_millis(settings.step_ms);
        let mut steps = Vec::new();

        // The first number is shown immediately, later ones after each tick
        steps.push(CountdownStep::Show(settings.seconds.to_string()));
        steps.push(CountdownStep::Wait(step));
        for remaining in (1..settings.seconds).rev() {
            steps.push(CountdownStep::Show(remaining.to_string()));
            steps.push(CountdownStep::Wait(step));
        }

        steps.push(CountdownStep::Show(SMILE_TEXT.to_string()));
        steps.push(CountdownStep::Wait(SMILE_DELAY));
        steps.push(CountdownStep::Capture);
        steps.push(CountdownStep::Show(String::new()));
        steps.push(CountdownStep::Wait(FREEZE_DURATION));
        steps.push(CountdownStep::Advance);

        Self { steps }
    }

    pub fn steps(&self) -> &[CountdownStep] {
        &self.steps
    }

    /// Text displayed as soon as the countdown starts
    pub fn initial_text(&self) -> &str {
        match self.steps.first() {
            Some(CountdownStep::Show(text)) => text,
            _ => "",
        }
    }

    /// Time from trigger to shot counter advance
    pub fn total_duration(&self) -> Duration {
        self.steps
            .iter()
            .filter_map(|s| match s {
                CountdownStep::Wait(d) => Some(*d),
                _ => None,
            })
            .sum()
    }

    /// Time from trigger to capture
    pub fn capture_offset(&self) -> Duration {
        self.steps
            .iter()
            .take_while(|s| **s != CountdownStep::Capture)
            .filter_map(|s| match s {
                CountdownStep::Wait(d) => Some(*d),
                _ => None,
            })
            .sum()
    }
}
