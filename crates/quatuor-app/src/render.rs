//! Plain-text rendering of the timeline and session list for the terminal.

use quatuor_core::{DisplayMessage, ProviderAnswer, SessionSummary, Source};

fn timing(response_time: Option<f64>) -> String {
    match response_time {
        Some(secs) => format!(" ({secs:.1}s)"),
        None => String::new(),
    }
}

fn sources_line(sources: &[Source]) -> Option<String> {
    if sources.is_empty() {
        return None;
    }
    let listed: Vec<String> = sources
        .iter()
        .map(|s| match s.page {
            Some(page) => format!("{} p.{page}", s.filename),
            None => s.filename.clone(),
        })
        .collect();
    Some(format!("    sources: {}", listed.join(", ")))
}

fn answer_text(answer: &ProviderAnswer) -> &str {
    answer.non_empty_text().unwrap_or("(no answer)")
}

pub fn format_message(message: &DisplayMessage) -> String {
    match message {
        DisplayMessage::User { text, timestamp } => {
            format!("[{}] you: {text}", timestamp.format("%H:%M"))
        }
        DisplayMessage::AiCompare { answers, .. } => answers
            .iter()
            .map(|(provider, answer)| {
                format!(
                    "  {}{}: {}",
                    provider.display_name(),
                    timing(answer.response_time),
                    answer_text(answer)
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        DisplayMessage::AiSingle {
            text,
            provider,
            response_time,
            sources,
            ..
        } => {
            let shown = if text.trim().is_empty() { "(no answer)" } else { text.as_str() };
            let mut out = format!(
                "  {}{}: {shown}",
                provider.display_name(),
                timing(*response_time)
            );
            if let Some(line) = sources_line(sources) {
                out.push('\n');
                out.push_str(&line);
            }
            out
        }
        DisplayMessage::System { text, .. } => format!("! {text}"),
    }
}

pub fn format_sessions(sessions: &[SessionSummary], active: &str) -> String {
    if sessions.is_empty() {
        return "No saved conversations.".to_string();
    }
    sessions
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let marker = if s.session_id.as_str() == active { '*' } else { ' ' };
            format!(
                "{marker}{:>3}. {} ({} messages, {})",
                i + 1,
                s.session_name,
                s.message_count,
                s.updated_at.format("%Y-%m-%d %H:%M")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
