use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::ui::styles;
use crate::utils::{color_name, format_file_size, format_upload_age};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = app
        .detail
        .as_ref()
        .map(|d| format!(" {} ", d.image.filename))
        .unwrap_or_else(|| " Image ".to_string());

    let block = Block::default()
        .title(Span::styled(title, styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.detail_loading && app.detail.is_none() {
        frame.render_widget(
            Paragraph::new(Span::styled("Loading image...", styles::muted_style())),
            inner,
        );
        return;
    }

    if let Some(ref error) = app.detail_error {
        frame.render_widget(
            Paragraph::new(Span::styled(error.as_str(), styles::error_style())),
            inner,
        );
        return;
    }

    let Some(ref detail) = app.detail else {
        return;
    };

    let metadata = &detail.metadata;
    let mut lines = Vec::new();

    lines.push(Line::from(vec![
        Span::styled("Size:        ", styles::muted_style()),
        Span::styled(format_file_size(detail.image.file_size), styles::list_item_style()),
    ]));

    if let Some(ref uploaded_at) = detail.image.uploaded_at {
        lines.push(Line::from(vec![
            Span::styled("Uploaded:    ", styles::muted_style()),
            Span::styled(format_upload_age(uploaded_at), styles::list_item_style()),
        ]));
    }

    if let Some(ref status) = metadata.ai_processing_status {
        let style = if status == "completed" {
            styles::success_style()
        } else {
            styles::highlight_style()
        };
        lines.push(Line::from(vec![
            Span::styled("AI status:   ", styles::muted_style()),
            Span::styled(status.as_str(), style),
        ]));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled("Description", styles::title_style())));
    match metadata.description {
        Some(ref description) if !description.is_empty() => {
            lines.push(Line::from(Span::styled(
                description.as_str(),
                styles::list_item_style(),
            )));
        }
        _ => lines.push(Line::from(Span::styled("(none)", styles::muted_style()))),
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled("Tags", styles::title_style())));
    if metadata.tags.is_empty() {
        lines.push(Line::from(Span::styled("(none)", styles::muted_style())));
    } else {
        lines.push(Line::from(Span::styled(
            metadata.tags.join(", "),
            styles::highlight_style(),
        )));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled("Colors", styles::title_style())));
    if metadata.colors.is_empty() {
        lines.push(Line::from(Span::styled("(none)", styles::muted_style())));
    } else {
        let names: Vec<String> = metadata
            .colors
            .iter()
            .map(|c| format!("{} ({})", color_name(c), c))
            .collect();
        lines.push(Line::from(Span::styled(
            names.join(", "),
            styles::highlight_style(),
        )));
    }

    lines.push(Line::default());
    lines.push(Line::from(vec![
        Span::styled("[e]", styles::help_key_style()),
        Span::styled(" edit  ", styles::help_desc_style()),
        Span::styled("[s]", styles::help_key_style()),
        Span::styled(" similar  ", styles::help_desc_style()),
        Span::styled("[d]", styles::help_key_style()),
        Span::styled(" delete  ", styles::help_desc_style()),
        Span::styled("[Esc]", styles::help_key_style()),
        Span::styled(" back", styles::help_desc_style()),
    ]));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
