use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::App;
use crate::ui::styles;
use crate::utils::truncate;

/// Maximum display-name length shown in the similarity list.
const MAX_NAME_LENGTH: usize = 32;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.detail {
        Some(ref detail) => format!(" Similar to {} ", detail.image.filename),
        None => " Similar images ".to_string(),
    };

    let block = Block::default()
        .title(Span::styled(title, styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.similar_loading && app.similar.is_none() {
        frame.render_widget(
            Paragraph::new(Span::styled("Searching for similar images...", styles::muted_style())),
            inner,
        );
        return;
    }

    if let Some(ref error) = app.similar_error {
        frame.render_widget(
            Paragraph::new(Span::styled(error.as_str(), styles::error_style())),
            inner,
        );
        return;
    }

    let Some(ref similar) = app.similar else {
        return;
    };

    if similar.similar_images.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled("No similar images found.", styles::muted_style())),
            inner,
        );
        return;
    }

    let items: Vec<ListItem> = similar
        .similar_images
        .iter()
        .map(|image| {
            let mut spans = vec![
                Span::styled(
                    format!("{:>5.1}%  ", image.similarity_percentage),
                    styles::success_style(),
                ),
                Span::styled(
                    format!("{:<w$}", truncate(image.name(), MAX_NAME_LENGTH), w = MAX_NAME_LENGTH + 2),
                    styles::list_item_style(),
                ),
            ];
            if !image.tags.is_empty() {
                spans.push(Span::styled(
                    truncate(&image.tags.join(", "), 30),
                    styles::muted_style(),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items).highlight_style(styles::selected_style());

    let mut state = ListState::default();
    state.select(Some(app.similar_selection));
    frame.render_stateful_widget(list, inner, &mut state);
}
