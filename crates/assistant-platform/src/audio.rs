//! Web Audio output: plays decoded speech through one shared `AudioContext`.

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{AudioBufferSourceNode, AudioContext, AudioContextOptions, AudioContextState};

use assistant_core::pcm::PcmClip;
use assistant_core::ports::{ActiveClip, AudioContextPort, AudioOutputPort};
use assistant_types::{AssistantError, Result};

#[derive(Default)]
pub struct WebAudioOutput;

impl WebAudioOutput {
    pub fn new() -> Self {
        Self
    }
}

impl AudioOutputPort for WebAudioOutput {
    fn open(&self, sample_rate: u32) -> Result<Rc<dyn AudioContextPort>> {
        let options = AudioContextOptions::new();
        options.set_sample_rate(sample_rate as f32);
        let context = AudioContext::new_with_context_options(&options).map_err(audio_error)?;
        log::info!("AudioContext opened at {} Hz", sample_rate);
        Ok(Rc::new(WebAudioContext { context }))
    }
}

struct WebAudioContext {
    context: AudioContext,
}

impl AudioContextPort for WebAudioContext {
    fn play(&self, clip: PcmClip, on_ended: Box<dyn FnOnce()>) -> Result<Box<dyn ActiveClip>> {
        let buffer = self
            .context
            .create_buffer(clip.channel_count() as u32, clip.frames() as u32, clip.sample_rate as f32)
            .map_err(audio_error)?;
        for (channel, samples) in clip.channels.iter().enumerate() {
            buffer
                .copy_to_channel(samples, channel as i32)
                .map_err(audio_error)?;
        }

        let source = self.context.create_buffer_source().map_err(audio_error)?;
        source.set_buffer(Some(&buffer));
        source
            .connect_with_audio_node(&self.context.destination())
            .map_err(audio_error)?;

        let ended = Closure::once_into_js(move || on_ended());
        source.set_onended(Some(ended.unchecked_ref()));

        // Contexts created outside a user gesture start suspended
        if self.context.state() == AudioContextState::Suspended {
            if let Err(e) = self.context.resume() {
                log::warn!("AudioContext.resume failed: {:?}", e);
            }
        }
        source.start().map_err(audio_error)?;

        Ok(Box::new(WebClip { source }))
    }
}

struct WebClip {
    source: AudioBufferSourceNode,
}

impl ActiveClip for WebClip {
    fn stop(&self) {
        // Throws if the node already finished; nothing to undo then
        if let Err(e) = self.source.stop() {
            log::debug!("AudioBufferSourceNode.stop: {:?}", e);
        }
    }
}

fn audio_error(value: JsValue) -> AssistantError {
    AssistantError::Audio(format!("{:?}", value))
}
