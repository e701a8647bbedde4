//! Rebuilds the display timeline from persisted turns.

use quatuor_core::{ChatMode, DisplayMessage, ReplyRecord, Turn};

/// Convert turns into display messages, one exchange at a time.
///
/// Each turn yields its user message followed by the reply as live sending
/// would have shown it: one `AiCompare` for compare turns, one `AiSingle`
/// for single-provider turns with a non-empty answer, nothing for turns with
/// an unrecognised mode. Pure: the same input always gives the same output.
pub fn reconstruct(turns: &[Turn]) -> Vec<DisplayMessage> {
    let mut timeline = Vec::with_capacity(turns.len() * 2);
    for turn in turns {
        timeline.push(DisplayMessage::User {
            text: turn.message.clone(),
            timestamp: turn.timestamp,
        });
        if let Some(reply) = stored_reply(turn) {
            timeline.push(reply_message(&reply, turn.timestamp));
        }
    }
    timeline
}

/// The reply a stored turn should display. Single-provider turns whose
/// answer is empty display nothing.
fn stored_reply(turn: &Turn) -> Option<ReplyRecord> {
    match turn.mode? {
        ChatMode::Compare => Some(ReplyRecord::Compare {
            answers: turn.answers.clone(),
        }),
        ChatMode::Single(provider) => {
            let answer = turn.answers.get(provider);
            answer.non_empty_text()?;
            Some(ReplyRecord::Single {
                provider,
                answer: answer.clone(),
                sources: turn.sources.clone(),
            })
        }
    }
}

/// The AI message for a reply, shared by live sends and reconstruction.
///
/// A single-provider reply always yields a message; a missing answer shows
/// as empty text.
pub fn reply_message(
    reply: &ReplyRecord,
    timestamp: chrono::DateTime<chrono::Utc>,
) -> DisplayMessage {
    match reply {
        ReplyRecord::Compare { answers } => DisplayMessage::AiCompare {
            answers: answers.clone(),
            timestamp,
        },
        ReplyRecord::Single {
            provider,
            answer,
            sources,
        } => DisplayMessage::AiSingle {
            text: answer.text.clone().unwrap_or_default(),
            provider: *provider,
            response_time: answer.response_time,
            sources: sources.clone(),
            timestamp,
        },
    }
}

// =============================================================================
// Tests
// =============================================================================
