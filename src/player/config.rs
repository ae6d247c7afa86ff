use std::time::Duration;

use super::error::PlaybackError;

/// The dataset a motion was generated for. Each dataset is sampled at its own frame rate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, strum::Display)]
pub enum Dataset {
    #[default]
    #[strum(to_string = "Babel")]
    Babel,
    #[value(name = "humanml3d")]
    #[strum(to_string = "HumanML3D")]
    HumanMl3d,
}

impl Dataset {
    pub fn frame_rate(self) -> f32 {
        match self {
            Dataset::Babel => 30.0,
            Dataset::HumanMl3d => 20.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackConfig {
    /// Frames advanced per second while playing.
    pub frame_rate: f32,
    /// Frame shown when the session opens.
    pub start_frame: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self::for_dataset(Dataset::default())
    }
}

impl PlaybackConfig {
    pub fn for_dataset(dataset: Dataset) -> Self {
        Self {
            frame_rate: dataset.frame_rate(),
            start_frame: 0,
        }
    }

    /// Time between two frames. Fails unless the frame rate is finite and positive.
    pub fn frame_interval(&self) -> Result<Duration, PlaybackError> {
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(PlaybackError::InvalidFrameRate(self.frame_rate));
        }

        Duration::try_from_secs_f32(self.frame_rate.recip())
            .map_err(|_| PlaybackError::InvalidFrameRate(self.frame_rate))
    }
}
