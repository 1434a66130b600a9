//! Speech recognition adapter: wraps the Web Speech API.
//!
//! `SpeechRecognition` is still prefixed in Chromium and absent from
//! web-sys stable bindings, so the object is driven through `Reflect`.

use std::rc::Rc;

use js_sys::{Array, Function, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use assistant_core::ports::{
    RecognitionEvent, RecognitionOptions, RecognitionSession, RecognitionSink, SpeechRecognitionPort,
};
use assistant_core::voice::RECOGNITION_UNSUPPORTED;
use assistant_types::{AssistantError, Result};

const CONSTRUCTORS: [&str; 2] = ["SpeechRecognition", "webkitSpeechRecognition"];
const HANDLERS: [&str; 3] = ["onresult", "onerror", "onend"];

type EventHandler = Closure<dyn FnMut(JsValue)>;

#[derive(Default)]
pub struct WebSpeechRecognition;

impl WebSpeechRecognition {
    pub fn new() -> Self {
        Self
    }

    fn constructor() -> Option<Function> {
        let window = web_sys::window()?;
        CONSTRUCTORS.iter().find_map(|name| {
            Reflect::get(&window, &JsValue::from_str(name))
                .ok()
                .and_then(|value| value.dyn_into::<Function>().ok())
        })
    }
}

impl SpeechRecognitionPort for WebSpeechRecognition {
    fn is_available(&self) -> bool {
        Self::constructor().is_some()
    }

    fn start(
        &self,
        options: RecognitionOptions,
        sink: RecognitionSink,
    ) -> Result<Rc<dyn RecognitionSession>> {
        let constructor = Self::constructor()
            .ok_or_else(|| AssistantError::Unsupported(RECOGNITION_UNSUPPORTED.to_string()))?;
        let recognition = Reflect::construct(&constructor, &Array::new()).map_err(js_error)?;

        set(&recognition, "lang", &JsValue::from_str(&options.language))?;
        set(&recognition, "continuous", &JsValue::from_bool(options.continuous))?;
        set(&recognition, "interimResults", &JsValue::from_bool(options.interim_results))?;

        let on_result = {
            let sink = sink.clone();
            Closure::wrap(Box::new(move |event: JsValue| {
                sink(RecognitionEvent::Transcript(transcripts(&event)));
            }) as Box<dyn FnMut(JsValue)>)
        };
        let on_error = {
            let sink = sink.clone();
            Closure::wrap(Box::new(move |event: JsValue| {
                let reason = Reflect::get(&event, &JsValue::from_str("error"))
                    .ok()
                    .and_then(|value| value.as_string())
                    .unwrap_or_else(|| "unknown".to_string());
                sink(RecognitionEvent::Error(reason));
            }) as Box<dyn FnMut(JsValue)>)
        };
        let on_end = Closure::wrap(Box::new(move |_event: JsValue| {
            sink(RecognitionEvent::End);
        }) as Box<dyn FnMut(JsValue)>);

        let handlers = [on_result, on_error, on_end];
        for (name, handler) in HANDLERS.iter().zip(handlers.iter()) {
            set(&recognition, name, handler.as_ref())?;
        }

        invoke(&recognition, "start")?;
        log::debug!("SpeechRecognition started ({})", options.language);

        Ok(Rc::new(WebRecognitionSession {
            recognition,
            _handlers: handlers,
        }))
    }
}

/// One live `SpeechRecognition` object and the closures it calls into
struct WebRecognitionSession {
    recognition: JsValue,
    _handlers: [EventHandler; 3],
}

impl RecognitionSession for WebRecognitionSession {
    fn stop(&self) {
        if let Err(e) = invoke(&self.recognition, "stop") {
            log::warn!("SpeechRecognition.stop failed: {}", e);
        }
    }
}

impl Drop for WebRecognitionSession {
    fn drop(&mut self) {
        // Detach first: the closures are freed with this struct
        for name in HANDLERS {
            let _ = Reflect::set(&self.recognition, &JsValue::from_str(name), &JsValue::NULL);
        }
        let _ = invoke(&self.recognition, "abort");
    }
}

/// Top alternative of every result in a `SpeechRecognitionEvent`
fn transcripts(event: &JsValue) -> Vec<String> {
    let Ok(results) = Reflect::get(event, &JsValue::from_str("results")) else {
        return Vec::new();
    };
    let length = Reflect::get(&results, &JsValue::from_str("length"))
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(0.0) as u32;

    (0..length)
        .filter_map(|index| {
            let result = Reflect::get_u32(&results, index).ok()?;
            let alternative = Reflect::get_u32(&result, 0).ok()?;
            Reflect::get(&alternative, &JsValue::from_str("transcript"))
                .ok()?
                .as_string()
        })
        .collect()
}

fn set(target: &JsValue, name: &str, value: &JsValue) -> Result<()> {
    Reflect::set(target, &JsValue::from_str(name), value)
        .map(|_| ())
        .map_err(js_error)
}

fn invoke(target: &JsValue, method: &str) -> Result<()> {
    let function: Function = Reflect::get(target, &JsValue::from_str(method))
        .map_err(js_error)?
        .dyn_into()
        .map_err(|_| AssistantError::JsInterop(format!("SpeechRecognition has no {}()", method)))?;
    function.call0(target).map(|_| ()).map_err(js_error)
}

fn js_error(value: JsValue) -> AssistantError {
    AssistantError::JsInterop(format!("{:?}", value))
}
