//! Terminal rendering of feed signals.

use std::collections::HashMap;

use colored::{ColoredString, Colorize};
use livefeed_core::event::{EventKind, FeedEvent};
use livefeed_core::filter::{FeedFilter, highlight};
use livefeed_core::session::{DeliveryMode, ModeState, PinnedItem};
use livefeed_core::signal::FeedSignal;

/// What the terminal currently shows.
#[derive(Debug, Default)]
pub struct ViewState {
    /// Handle that commands without an explicit handle act on.
    pub focus: Option<String>,
    pub filter: FeedFilter,
    /// Latest pinned set per handle.
    pub pins: HashMap<String, Vec<PinnedItem>>,
}

fn kind_tag(kind: EventKind) -> ColoredString {
    match kind {
        EventKind::Comment => "COMMENT".bright_white(),
        EventKind::Gift => "GIFT".bright_magenta(),
        EventKind::Subscription => "SUB".bright_green(),
        EventKind::InvalidUser => "ERROR".bright_red(),
    }
}

fn highlighted(text: &str, query: &str) -> String {
    highlight(text, query)
        .into_iter()
        .map(|segment| {
            if segment.matched {
                segment.text.black().on_yellow().to_string()
            } else {
                segment.text.to_string()
            }
        })
        .collect()
}

/// One feed line: `[index] KIND id | name | text`, with search hits marked.
pub fn render_event(index: usize, event: &FeedEvent, filter: &FeedFilter) -> String {
    format!(
        "{} {} {} | {} | {}",
        format!("[{}]", index).bright_black(),
        kind_tag(event.kind),
        highlighted(event.identity(), &filter.user_query),
        highlighted(event.display_name(), &filter.user_query),
        highlighted(&event.text, &filter.text_query),
    )
}

pub fn render_mode(state: &ModeState) -> String {
    let label = match state.mode {
        DeliveryMode::Live => "LIVE".bright_green(),
        DeliveryMode::Paused => "PAUSED".bright_yellow(),
        DeliveryMode::SlowDrip => "SLOW".bright_cyan(),
    };
    format!(
        "mode {} (paused: {}, slow: {})",
        label, state.paused, state.slow_mode
    )
}

pub fn render_pins(pins: &[PinnedItem], filter: &FeedFilter) -> Vec<String> {
    if pins.is_empty() {
        return vec!["No pinned events".bright_black().to_string()];
    }
    pins.iter()
        .filter(|pin| filter.matches(&pin.event))
        .map(|pin| format!("📌 {}", render_event(pin.index, &pin.event, filter)))
        .collect()
}

/// Lines to print for one signal. Filtered-out events produce nothing.
pub fn render_signal(signal: &FeedSignal, view: &mut ViewState) -> Vec<String> {
    let tag = format!("@{}", signal.handle()).bright_blue();
    match signal {
        FeedSignal::SessionStarted { handle, session_id } => {
            view.pins.remove(handle);
            if view.focus.is_none() {
                view.focus = Some(handle.clone());
            }
            vec![format!("── {} started ({}) ──", tag, session_id).bold().to_string()]
        }
        FeedSignal::SessionStopped { handle } => {
            view.pins.remove(handle);
            if view.focus.as_deref() == Some(handle.as_str()) {
                view.focus = None;
            }
            vec![format!("── {} stopped ──", tag).bold().to_string()]
        }
        FeedSignal::Event { index, event, .. } => {
            if view.filter.matches(event) {
                vec![format!("{} {}", tag, render_event(*index, event, &view.filter))]
            } else {
                Vec::new()
            }
        }
        FeedSignal::Batch {
            first_index,
            events,
            ..
        } => {
            let mut lines = vec![format!("{} released {} held events", tag, events.len())
                .bright_black()
                .to_string()];
            lines.extend(
                events
                    .iter()
                    .enumerate()
                    .filter(|(_, event)| view.filter.matches(event))
                    .map(|(offset, event)| {
                        format!(
                            "{} {}",
                            tag,
                            render_event(first_index + offset, event, &view.filter)
                        )
                    }),
            );
            lines
        }
        FeedSignal::PinnedChanged { handle, pins } => {
            view.pins.insert(handle.clone(), pins.clone());
            vec![format!("{} {} pinned", tag, pins.len()).bright_black().to_string()]
        }
        FeedSignal::OpenPinnedView { handle } => {
            let mut lines = vec![format!("── {} pinned ──", tag).bold().to_string()];
            let pins = view.pins.get(handle).cloned().unwrap_or_default();
            lines.extend(render_pins(&pins, &view.filter));
            lines
        }
        FeedSignal::ModeChanged { state, .. } => vec![format!("{} {}", tag, render_mode(state))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livefeed_core::event::{RawEvent, build_event};
    use serde_json::json;

    fn comment(text: &str) -> FeedEvent {
        build_event(
            0,
            RawEvent::chat(json!({ "uniqueId": "alice", "nickname": "Alice", "comment": text })),
        )
        .0
    }

    fn event_signal(index: usize, event: FeedEvent) -> FeedSignal {
        FeedSignal::Event {
            handle: "host".to_string(),
            index,
            event,
        }
    }

    #[test]
    fn test_render_event_plain() {
        colored::control::set_override(false);
        let line = render_event(2, &comment("hello"), &FeedFilter::default());
        assert_eq!(line, "[2] COMMENT alice | Alice | hello");
    }

    #[test]
    fn test_filtered_event_renders_nothing() {
        colored::control::set_override(false);
        let mut view = ViewState::default();
        view.filter.kinds.toggle(EventKind::Comment);
        assert!(render_signal(&event_signal(0, comment("hi")), &mut view).is_empty());
    }

    #[test]
    fn test_open_pinned_view_uses_latest_pins() {
        colored::control::set_override(false);
        let mut view = ViewState::default();
        let pins = vec![PinnedItem {
            index: 0,
            event: comment("keep me"),
        }];
        render_signal(
            &FeedSignal::PinnedChanged {
                handle: "host".to_string(),
                pins,
            },
            &mut view,
        );
        let lines = render_signal(
            &FeedSignal::OpenPinnedView {
                handle: "host".to_string(),
            },
            &mut view,
        );
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("keep me"));
    }

    #[test]
    fn test_stop_clears_focus() {
        colored::control::set_override(false);
        let mut view = ViewState {
            focus: Some("host".to_string()),
            ..Default::default()
        };
        render_signal(
            &FeedSignal::SessionStopped {
                handle: "host".to_string(),
            },
            &mut view,
        );
        assert!(view.focus.is_none());
    }
}
