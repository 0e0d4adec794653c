//! Horizontal sub-tab bar used inside a screen (e.g. the routes filter).

use ratatui::text::{Line, Span};

use crate::theme;

/// One line of tab labels with the active one bracketed and highlighted.
pub fn render_sub_tabs<'a>(labels: &[&'a str], active_index: usize) -> Line<'a> {
    let mut spans = Vec::with_capacity(labels.len() * 2);

    for (i, label) in labels.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ", theme::key_hint()));
        }
        if i == active_index {
            spans.push(Span::styled(format!("[{label}]"), theme::tab_active()));
        } else {
            spans.push(Span::styled(*label, theme::tab_inactive()));
        }
    }

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_tab_is_bracketed() {
        let line = render_sub_tabs(&["All", "Active"], 1);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "All  [Active]");
    }
}
