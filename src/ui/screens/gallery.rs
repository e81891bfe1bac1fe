use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::{App, AppState, GalleryFocus};
use crate::ui::styles;
use crate::utils::{color_name, format_file_size, format_upload_age, truncate};

/// Sidebar width in columns.
const SIDEBAR_WIDTH: u16 = 30;

/// Maximum filename length shown in the image list.
const MAX_NAME_LENGTH: usize = 40;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(area);

    render_sidebar(frame, app, chunks[0]);
    render_image_list(frame, app, chunks[1]);
}

fn render_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_tag_panel(frame, app, chunks[0]);
    render_color_panel(frame, app, chunks[1]);
}

fn render_tag_panel(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.gallery_focus == GalleryFocus::Tags;

    let items: Vec<ListItem> = if app.tag_options.is_empty() {
        vec![ListItem::new(Span::styled("no tags yet", styles::muted_style()))]
    } else {
        app.tag_options
            .iter()
            .map(|tag| {
                let marker = if app.selected_tags.contains(tag) {
                    "[x] "
                } else {
                    "[ ] "
                };
                let style = if app.selected_tags.contains(tag) {
                    styles::highlight_style()
                } else {
                    styles::list_item_style()
                };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, styles::muted_style()),
                    Span::styled(truncate(tag, 22), style),
                ]))
            })
            .collect()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .title(" Tags ")
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .highlight_style(styles::selected_style());

    let mut state = ListState::default();
    if focused && !app.tag_options.is_empty() {
        state.select(Some(app.tag_selection));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_color_panel(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.gallery_focus == GalleryFocus::Colors;

    let items: Vec<ListItem> = if app.color_options.is_empty() {
        vec![ListItem::new(Span::styled("no colors yet", styles::muted_style()))]
    } else {
        app.color_options
            .iter()
            .map(|item| {
                let marker = if app.selected_colors.contains(&item.color) {
                    "[x] "
                } else {
                    "[ ] "
                };
                let label = if item.count > 0 {
                    format!("{} ({})", color_name(&item.color), item.count)
                } else {
                    color_name(&item.color).to_string()
                };
                let style = if app.selected_colors.contains(&item.color) {
                    styles::highlight_style()
                } else {
                    styles::list_item_style()
                };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, styles::muted_style()),
                    Span::styled(truncate(&label, 22), style),
                ]))
            })
            .collect()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .title(" Colors ")
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .highlight_style(styles::selected_style());

    let mut state = ListState::default();
    if focused && !app.color_options.is_empty() {
        state.select(Some(app.color_selection));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_image_list(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.gallery_focus == GalleryFocus::Images;

    let mut title = format!(" Images ({}) ", app.total_items);
    if app.total_pages > 1 {
        title = format!(
            " Images ({}) · page {}/{} ",
            app.total_items, app.page_number, app.total_pages
        );
    }

    let block = Block::default()
        .title(Span::styled(title, styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    // Reserve the first inner line for the search/filter summary
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);

    render_filter_line(frame, app, chunks[0]);

    if app.images_loading && app.images.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled("Loading images...", styles::muted_style())),
            chunks[1],
        );
        return;
    }

    if let Some(ref error) = app.gallery_error {
        frame.render_widget(
            Paragraph::new(Span::styled(error.as_str(), styles::error_style())),
            chunks[1],
        );
        return;
    }

    if app.images.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No images found. Press [u] to upload.",
                styles::muted_style(),
            )),
            chunks[1],
        );
        return;
    }

    let items: Vec<ListItem> = app
        .images
        .iter()
        .map(|image| {
            let age = image
                .uploaded_at
                .as_deref()
                .map(format_upload_age)
                .unwrap_or_default();
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<w$}", truncate(&image.filename, MAX_NAME_LENGTH), w = MAX_NAME_LENGTH + 2),
                    styles::list_item_style(),
                ),
                Span::styled(
                    format!("{:>10}  ", format_file_size(image.file_size)),
                    styles::muted_style(),
                ),
                Span::styled(age, styles::muted_style()),
            ]))
        })
        .collect();

    let list = List::new(items).highlight_style(styles::selected_style());

    let mut state = ListState::default();
    state.select(Some(app.gallery_selection));
    frame.render_stateful_widget(list, chunks[1], &mut state);
}

fn render_filter_line(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = Vec::new();

    if app.state == AppState::Searching || !app.search_query.is_empty() {
        let cursor = if app.state == AppState::Searching { "_" } else { "" };
        spans.push(Span::styled(
            format!("/{}{}", app.search_query, cursor),
            styles::search_style(),
        ));
        spans.push(Span::raw("  "));
    }

    if !app.selected_tags.is_empty() {
        spans.push(Span::styled(
            format!("tags: {}  ", app.selected_tags.join(",")),
            styles::highlight_style(),
        ));
    }
    if !app.selected_colors.is_empty() {
        let names: Vec<&str> = app.selected_colors.iter().map(|c| color_name(c)).collect();
        spans.push(Span::styled(
            format!("colors: {}  ", names.join(",")),
            styles::highlight_style(),
        ));
    }

    spans.push(Span::styled(
        format!("sort: {}", app.sort_by.label()),
        styles::muted_style(),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
