//! Mode dispatch: turns a submission into exactly one gateway exchange.
//!
//! Routing is decided from the state at submit time (`Exchange::plan`);
//! `Exchange::execute` only talks to the gateways and never touches state.

use assistant_types::{
    AssistantError, Result,
    config::SourceLanguage,
    file::{DocumentSource, FileSelection},
    history::HistoryEntry,
    message::{GroundingSource, MessageDraft},
    mode::Mode,
};

use crate::ports::Gateways;
use crate::store::SessionState;

pub const SUMMARY_PROMPT: &str = "Provide a concise, well-structured summary of this document.";
pub const SUMMARY_QUICK_REPLIES: [&str; 3] = [
    "What are the key points?",
    "Who is the author?",
    "Explain the main purpose.",
];
pub const IMAGE_REPLY: &str = "Here is the image you asked for.";
pub const IMAGE_HISTORY_RESPONSE: &str = "Image generated.";
pub const MISSING_FILE: &str = "Please select a file.";
pub const MISSING_TOKEN: &str = "Sign in to cloud storage to analyse this file.";

/// One request/response round trip with a gateway
#[derive(Debug, Clone)]
pub enum Exchange {
    Document {
        source: DocumentSource,
        question: String,
    },
    Encyclopedia {
        term: String,
    },
    Image {
        prompt: String,
    },
    Translation {
        text: String,
        target: String,
        source: SourceLanguage,
    },
    /// Follow-up on a grounding source the user clicked
    SourceFollowUp {
        title: String,
    },
}

/// What a settled exchange adds to the session
#[derive(Debug, Clone)]
pub struct Outcome {
    pub reply: MessageDraft,
    pub history: HistoryEntry,
}

/// Canned prompt posted when a grounding source is clicked
pub fn follow_up_prompt(title: &str) -> String {
    format!("Tell me more about \"{}\"", title)
}

/// Suggestions attached to a source follow-up answer
pub fn follow_up_quick_replies(title: &str) -> Vec<String> {
    let subject = title.split(' ').next().unwrap_or(title);
    vec![
        format!("Who was {}?", subject),
        format!("Main achievements of {}", title),
        format!("What is the legacy of {}?", title),
    ]
}

impl Exchange {
    /// Route `prompt` by the current mode. Validation failures never reach a gateway.
    pub fn plan(state: &SessionState, prompt: &str) -> Result<Exchange> {
        let prompt = prompt.to_string();
        match state.mode {
            Mode::Document => {
                let source = match &state.selection {
                    Some(FileSelection::Local(file)) => DocumentSource::Local(file.clone()),
                    Some(FileSelection::Remote(file)) => match &state.auth_token {
                        Some(token) => DocumentSource::Remote {
                            file: file.clone(),
                            token: token.clone(),
                        },
                        None => return Err(AssistantError::Validation(MISSING_TOKEN.to_string())),
                    },
                    None => return Err(AssistantError::Validation(MISSING_FILE.to_string())),
                };
                Ok(Exchange::Document { source, question: prompt })
            }
            Mode::Encyclopedia => Ok(Exchange::Encyclopedia { term: prompt }),
            Mode::Image => Ok(Exchange::Image { prompt }),
            Mode::Translation => Ok(Exchange::Translation {
                text: prompt,
                target: state.languages.target.clone(),
                source: state.languages.source.clone(),
            }),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Exchange::Document { .. } => "document",
            Exchange::Encyclopedia { .. } => "encyclopedia",
            Exchange::Image { .. } => "image",
            Exchange::Translation { .. } => "translation",
            Exchange::SourceFollowUp { .. } => "source follow-up",
        }
    }

    /// The text recorded as the history entry's prompt
    fn history_prompt(&self) -> String {
        match self {
            Exchange::Document { question, .. } => question.clone(),
            Exchange::Encyclopedia { term } => term.clone(),
            Exchange::Image { prompt } => prompt.clone(),
            Exchange::Translation { text, .. } => text.clone(),
            Exchange::SourceFollowUp { title } => follow_up_prompt(title),
        }
    }

    pub async fn execute(&self, gateways: &Gateways) -> Result<Outcome> {
        let prompt = self.history_prompt();
        match self {
            Exchange::Document { source, question } => {
                let answer = gateways.documents.analyze(source, question).await?;
                Ok(Outcome {
                    history: HistoryEntry::new(Mode::Document, prompt, answer.clone())
                        .with_file_name(Some(source.name().to_string())),
                    reply: MessageDraft::model(answer),
                })
            }
            Exchange::Encyclopedia { term } => {
                let result = gateways.encyclopedia.search(term).await?;
                let mut sources = result.sources.into_iter();
                match sources.next() {
                    Some(primary) => {
                        let summary = gateways.encyclopedia.summary(&primary.title).await?;
                        let related: Vec<GroundingSource> = sources.collect();
                        Ok(Outcome {
                            history: HistoryEntry::new(Mode::Encyclopedia, prompt, summary.clone()),
                            reply: MessageDraft::model(summary).with_sources(related),
                        })
                    }
                    None => Ok(Outcome {
                        history: HistoryEntry::new(Mode::Encyclopedia, prompt, result.content.clone()),
                        reply: MessageDraft::model(result.content),
                    }),
                }
            }
            Exchange::Image { prompt: text } => {
                let image = gateways.images.generate(text).await?;
                Ok(Outcome {
                    history: HistoryEntry::new(Mode::Image, prompt, IMAGE_HISTORY_RESPONSE)
                        .with_image(image.clone()),
                    reply: MessageDraft::model(IMAGE_REPLY).with_image(image),
                })
            }
            Exchange::Translation { text, target, source } => {
                let translated = gateways
                    .translation
                    .translate(text, target, source.hint())
                    .await?;
                Ok(Outcome {
                    history: HistoryEntry::new(Mode::Translation, prompt, translated.clone()),
                    reply: MessageDraft::model(translated),
                })
            }
            Exchange::SourceFollowUp { title } => {
                let summary = gateways.encyclopedia.summary(title).await?;
                Ok(Outcome {
                    history: HistoryEntry::new(Mode::Encyclopedia, prompt, summary.clone()),
                    reply: MessageDraft::model(summary)
                        .with_quick_replies(follow_up_quick_replies(title)),
                })
            }
        }
    }
}
