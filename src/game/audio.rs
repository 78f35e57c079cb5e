#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioCue {
    Music,
    CarNoise,
    Jump,
    CoinPickup,
    Death,
}

impl AudioCue {
    pub const ALL: [AudioCue; 5] = [
        AudioCue::Music,
        AudioCue::CarNoise,
        AudioCue::Jump,
        AudioCue::CoinPickup,
        AudioCue::Death,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AudioCue::Music => "Music",
            AudioCue::CarNoise => "Car Noise",
            AudioCue::Jump => "Player Jump",
            AudioCue::CoinPickup => "Click",
            AudioCue::Death => "Player Death",
        }
    }

    pub fn looping(&self) -> bool {
        matches!(self, AudioCue::Music | AudioCue::CarNoise)
    }
}

pub trait AudioSink {
    fn play(&mut self, cue: AudioCue);
    fn stop(&mut self, cue: AudioCue);
}

/// Sink for headless runs.
#[derive(Default, Debug, Clone)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&mut self, cue: AudioCue) {
        log::trace!("play {}", cue.name());
    }

    fn stop(&mut self, cue: AudioCue) {
        log::trace!("stop {}", cue.name());
    }
}
