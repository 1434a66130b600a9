//! Audio playback controller: reads messages aloud, one clip at a time.
//!
//! `play(id)` on the message that is already playing acts as a stop toggle.
//! Each request gets a generation number; a synthesis result or an `ended`
//! callback belonging to an older generation is dropped.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use assistant_types::{Result, config::AudioConfig, message::MessageId};

use crate::pcm::decode_pcm16;
use crate::ports::{ActiveClip, AudioContextPort, AudioOutputPort, SpeechSynthesisPort};
use crate::store::SessionStore;

#[derive(Default)]
struct PlaybackInner {
    /// Created on first use and reused afterwards
    context: Option<Rc<dyn AudioContextPort>>,
    clip: Option<Box<dyn ActiveClip>>,
    generation: u64,
}

#[derive(Clone)]
pub struct PlaybackController {
    store: SessionStore,
    synthesis: Rc<dyn SpeechSynthesisPort>,
    output: Rc<dyn AudioOutputPort>,
    audio: AudioConfig,
    inner: Rc<RefCell<PlaybackInner>>,
}

impl PlaybackController {
    pub fn new(
        store: SessionStore,
        synthesis: Rc<dyn SpeechSynthesisPort>,
        output: Rc<dyn AudioOutputPort>,
        audio: AudioConfig,
    ) -> Self {
        Self {
            store,
            synthesis,
            output,
            audio,
            inner: Rc::new(RefCell::new(PlaybackInner::default())),
        }
    }

    pub fn playing(&self) -> Option<MessageId> {
        self.store.read(|s| s.playing)
    }

    /// Stop whatever is playing or loading. Returns the id that was playing.
    pub fn stop(&self) -> Option<MessageId> {
        let previous = self.playing()?;
        let clip = {
            let mut inner = self.inner.borrow_mut();
            inner.generation += 1;
            inner.clip.take()
        };
        if let Some(clip) = clip {
            clip.stop();
        }
        self.store.set_playing(None);
        Some(previous)
    }

    pub async fn play(&self, id: MessageId) {
        let Some(text) = self
            .store
            .read(|s| s.messages.iter().find(|m| m.id == id).map(|m| m.content.clone()))
        else {
            log::warn!("play requested for unknown message {:?}", id);
            return;
        };

        if self.stop() == Some(id) {
            log::debug!("playback of {:?} toggled off", id);
            return;
        }

        let context = match self.context() {
            Ok(context) => context,
            Err(e) => {
                self.store.push_error(&e);
                return;
            }
        };

        let generation = {
            let mut inner = self.inner.borrow_mut();
            inner.generation += 1;
            inner.generation
        };
        // Marked before synthesis so presentation can show a loading state
        self.store.set_playing(Some(id));

        let decoded = match self.synthesis.synthesize(&text).await {
            Ok(bytes) => decode_pcm16(&bytes, self.audio.sample_rate, self.audio.channels),
            Err(e) => Err(e),
        };

        if self.inner.borrow().generation != generation {
            log::debug!("discarding superseded speech for {:?}", id);
            return;
        }

        let started = decoded.and_then(|clip| {
            log::debug!("playing {:.1}s of speech for {:?}", clip.duration_secs(), id);
            context.play(clip, self.on_ended(generation))
        });
        match started {
            Ok(clip) => {
                let mut inner = self.inner.borrow_mut();
                if inner.generation == generation {
                    inner.clip = Some(clip);
                }
            }
            Err(e) => {
                self.store.push_error(&e);
                self.store.set_playing(None);
            }
        }
    }

    fn context(&self) -> Result<Rc<dyn AudioContextPort>> {
        if let Some(context) = self.inner.borrow().context.clone() {
            return Ok(context);
        }
        let context = self.output.open(self.audio.sample_rate)?;
        self.inner.borrow_mut().context = Some(context.clone());
        Ok(context)
    }

    fn on_ended(&self, generation: u64) -> Box<dyn FnOnce()> {
        let inner: Weak<RefCell<PlaybackInner>> = Rc::downgrade(&self.inner);
        let store = self.store.clone();
        Box::new(move || {
            let Some(inner) = inner.upgrade() else { return };
            {
                let mut inner = inner.borrow_mut();
                if inner.generation != generation {
                    return;
                }
                // Bump so a late duplicate callback is ignored too
                inner.generation += 1;
                inner.clip = None;
            }
            store.set_playing(None);
        })
    }
}
