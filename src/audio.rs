use std::collections::HashMap;

use web_sys::HtmlAudioElement;

use crate::game::audio::{AudioCue, AudioSink};

fn file_name(cue: AudioCue) -> &'static str {
    match cue {
        AudioCue::Music => "music.mp3",
        AudioCue::CarNoise => "car_noise.mp3",
        AudioCue::Jump => "player_jump.mp3",
        AudioCue::CoinPickup => "click.mp3",
        AudioCue::Death => "player_death.mp3",
    }
}

/// Plays cues through `<audio>` elements loaded from `/assets/audio/`.
/// Cues whose file fails to load are skipped silently.
pub struct BrowserAudio {
    tracks: HashMap<AudioCue, HtmlAudioElement>,
}

impl BrowserAudio {
    pub fn load() -> Self {
        let mut tracks = HashMap::new();
        for cue in AudioCue::ALL {
            let url = format!("/assets/audio/{}", file_name(cue));
            match HtmlAudioElement::new_with_src(&url) {
                Ok(element) => {
                    element.set_loop(cue.looping());
                    tracks.insert(cue, element);
                }
                Err(err) => log::warn!("no audio for {}: {:?}", cue.name(), err),
            }
        }
        BrowserAudio { tracks }
    }
}

impl AudioSink for BrowserAudio {
    fn play(&mut self, cue: AudioCue) {
        let Some(track) = self.tracks.get(&cue) else {
            return;
        };
        if !cue.looping() {
            track.set_current_time(0.0);
        }
        // Rejected until the page has seen a user gesture
        if let Err(err) = track.play() {
            log::debug!("{} did not start: {:?}", cue.name(), err);
        }
    }

    fn stop(&mut self, cue: AudioCue) {
        if let Some(track) = self.tracks.get(&cue) {
            if let Err(err) = track.pause() {
                log::debug!("{} did not stop: {:?}", cue.name(), err);
            }
            track.set_current_time(0.0);
        }
    }
}
