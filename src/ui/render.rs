use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState, EditField, LoginFocus, Screen};
use crate::auth::PromptState;

use super::screens::{detail, gallery, similar};
use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }

    if matches!(app.state, AppState::LoggingIn) {
        render_login_overlay(frame, app);
    }

    if matches!(app.state, AppState::Uploading) {
        render_upload_overlay(frame, app);
    }

    if matches!(app.state, AppState::EditingMetadata) {
        render_edit_overlay(frame, app);
    }

    if matches!(app.state, AppState::ConfirmingDelete) {
        render_delete_overlay(frame, app);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }

    // The session-expired prompt paints over everything else and cannot
    // be dismissed
    if app.expiry.is_visible() {
        render_session_expired_overlay(frame, app);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  Lumina";
    let breadcrumb = match app.screen {
        Screen::Gallery => "gallery",
        Screen::Detail => "gallery / image",
        Screen::Similar => "gallery / image / similar",
    };
    let help_hint = "[?] Help";

    let left = format!("{}  ·  {}", title, breadcrumb);
    let padding = (area.width as usize).saturating_sub(left.len() + help_hint.len() + 4);

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::styled(format!("  ·  {}", breadcrumb), styles::muted_style()),
        Span::raw(" ".repeat(padding)),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.screen {
        Screen::Gallery => gallery::render(frame, app, area),
        Screen::Detail => detail::render(frame, app, area),
        Screen::Similar => similar::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = if let Some(ref message) = app.status_message {
        format!(" {} ", message)
    } else if app.screen == Screen::Gallery && app.total_items > 0 {
        format!(
            " {} image{} ",
            app.total_items,
            if app.total_items == 1 { "" } else { "s" }
        )
    } else {
        String::new()
    };

    let user = app
        .session
        .user()
        .map(|u| u.email.clone())
        .unwrap_or_default();
    let right_text = if user.is_empty() {
        " [u]pload | [q]uit ".to_string()
    } else {
        format!(" {} | [u]pload | [q]uit ", user)
    };

    let width = area.width as usize;
    let padding = width
        .saturating_sub(left_text.len())
        .saturating_sub(right_text.len());

    let line = Line::from(vec![
        Span::raw(left_text),
        Span::raw(" ".repeat(padding)),
        Span::styled(right_text, styles::muted_style()),
    ]);

    frame.render_widget(
        Paragraph::new(line).style(styles::status_bar_style()),
        area,
    );
}

/// Rect of the given size centered in `r`, clamped to fit.
fn centered_rect(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    Rect {
        x: r.x + (r.width - width) / 2,
        y: r.y + (r.height - height) / 2,
        width,
        height,
    }
}

fn overlay_block(title: &str) -> Block<'_> {
    Block::default()
        .title(Span::styled(format!(" {} ", title), styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect(56, 20, frame.area());
    frame.render_widget(Clear, area);

    let entries = [
        ("j/k, arrows", "move selection"),
        ("Tab", "switch panel (images / tags / colors)"),
        ("Space", "toggle tag or color filter"),
        ("/", "search"),
        ("o", "cycle sort order"),
        ("c", "clear search and filters"),
        ("n / p", "next / previous page"),
        ("Enter", "open image"),
        ("e", "edit metadata (detail view)"),
        ("s", "similar images (detail view)"),
        ("d", "delete image (detail view)"),
        ("u", "upload images"),
        ("r", "reload current view"),
        ("L", "log out"),
        ("Esc", "back / close"),
        ("q", "quit"),
    ];

    let mut lines = Vec::with_capacity(entries.len());
    for (key, description) in entries {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<12}", key), styles::help_key_style()),
            Span::styled(description, styles::help_desc_style()),
        ]));
    }

    frame.render_widget(
        Paragraph::new(lines).block(overlay_block("Help")),
        area,
    );
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect(52, 13, frame.area());
    frame.render_widget(Clear, area);

    let title = if app.signup_mode { "Create Account" } else { "Sign In" };

    let email_cursor = if app.login_focus == LoginFocus::Email { "_" } else { "" };
    let password_cursor = if app.login_focus == LoginFocus::Password { "_" } else { "" };
    let masked: String = "*".repeat(app.login_password.len());

    let submit_label = if app.signup_mode { "[ Sign Up ]" } else { "[ Sign In ]" };
    let toggle_label = if app.signup_mode {
        "Have an account? Switch to sign in"
    } else {
        "No account? Switch to sign up"
    };

    let mut lines = vec![
        Line::default(),
        Line::from(vec![
            Span::styled("  Email:    ", styles::field_style(app.login_focus == LoginFocus::Email)),
            Span::raw(format!("{}{}", app.login_email, email_cursor)),
        ]),
        Line::default(),
        Line::from(vec![
            Span::styled(
                "  Password: ",
                styles::field_style(app.login_focus == LoginFocus::Password),
            ),
            Span::raw(format!("{}{}", masked, password_cursor)),
        ]),
        Line::default(),
        Line::from(Span::styled(
            format!("  {}", submit_label),
            styles::field_style(app.login_focus == LoginFocus::Submit),
        )),
        Line::from(Span::styled(
            format!("  {}", toggle_label),
            styles::field_style(app.login_focus == LoginFocus::ToggleMode),
        )),
        Line::default(),
    ];

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            styles::error_style(),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "  Tab: next field · Enter: select",
            styles::muted_style(),
        )));
    }

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(overlay_block(title)),
        area,
    );
}

fn render_upload_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect(64, 9, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::default(),
        Line::from(vec![
            Span::styled("  Paths: ", styles::field_style(true)),
            Span::raw(format!("{}_", app.upload_input)),
        ]),
        Line::default(),
        Line::from(Span::styled(
            "  Space-separated file paths · jpg png gif webp bmp · 10MB max",
            styles::muted_style(),
        )),
        Line::default(),
    ];

    if let Some(ref error) = app.upload_error {
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            styles::error_style(),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "  Enter: upload · Esc: cancel",
            styles::muted_style(),
        )));
    }

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(overlay_block("Upload Images")),
        area,
    );
}

fn render_edit_overlay(frame: &mut Frame, app: &App) {
    let Some(ref form) = app.edit_form else {
        return;
    };

    let area = centered_rect(64, 15, frame.area());
    frame.render_widget(Clear, area);

    let description_cursor = if form.field == EditField::Description { "_" } else { "" };
    let tag_cursor = if form.field == EditField::TagInput { "_" } else { "" };
    let color_cursor = if form.field == EditField::ColorInput { "_" } else { "" };

    let mut lines = vec![
        Line::default(),
        Line::from(vec![
            Span::styled(
                "  Description: ",
                styles::field_style(form.field == EditField::Description),
            ),
            Span::raw(format!("{}{}", form.description, description_cursor)),
        ]),
        Line::default(),
        Line::from(vec![
            Span::styled("  Tags:   ", styles::field_style(form.field == EditField::TagInput)),
            Span::styled(form.tags.join(", "), styles::highlight_style()),
        ]),
        Line::from(vec![
            Span::styled("    add: ", styles::muted_style()),
            Span::raw(format!("{}{}", form.tag_input, tag_cursor)),
        ]),
        Line::default(),
        Line::from(vec![
            Span::styled(
                "  Colors: ",
                styles::field_style(form.field == EditField::ColorInput),
            ),
            Span::styled(form.colors.join(", "), styles::highlight_style()),
        ]),
        Line::from(vec![
            Span::styled("    add: ", styles::muted_style()),
            Span::raw(format!("{}{}", form.color_input, color_cursor)),
        ]),
        Line::default(),
        Line::from(Span::styled(
            "  [ Save ]",
            styles::field_style(form.field == EditField::Save),
        )),
        Line::default(),
    ];

    if let Some(ref error) = form.error {
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            styles::error_style(),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "  Tab: next field · Enter: add/save · empty Backspace: remove last · Esc: cancel",
            styles::muted_style(),
        )));
    }

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(overlay_block("Edit Metadata")),
        area,
    );
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect(50, 7, frame.area());
    frame.render_widget(Clear, area);

    let name = app
        .detail
        .as_ref()
        .map(|d| d.image.filename.clone())
        .unwrap_or_else(|| "this image".to_string());

    let lines = vec![
        Line::default(),
        Line::from(Span::styled(
            format!("  Delete {}?", name),
            styles::list_item_style(),
        )),
        Line::from(Span::styled(
            "  This cannot be undone.",
            styles::muted_style(),
        )),
        Line::default(),
        Line::from(vec![
            Span::styled("  [y]", styles::help_key_style()),
            Span::styled(" delete   ", styles::help_desc_style()),
            Span::styled("[n]", styles::help_key_style()),
            Span::styled(" cancel", styles::help_desc_style()),
        ]),
    ];

    frame.render_widget(
        Paragraph::new(lines).block(overlay_block("Confirm Delete")),
        area,
    );
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect(36, 5, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::default(),
        Line::from(vec![
            Span::styled("  Quit?  ", styles::list_item_style()),
            Span::styled("[y]", styles::help_key_style()),
            Span::styled(" yes  ", styles::help_desc_style()),
            Span::styled("[n]", styles::help_key_style()),
            Span::styled(" no", styles::help_desc_style()),
        ]),
    ];

    frame.render_widget(
        Paragraph::new(lines).block(overlay_block("Confirm")),
        area,
    );
}

fn render_session_expired_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect(54, 10, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::default(),
        Line::from(Span::styled(
            "  Your session has expired",
            styles::list_item_style(),
        )),
        Line::from(Span::styled(
            "  Would you like to refresh your session and continue?",
            styles::muted_style(),
        )),
        Line::default(),
    ];

    if app.expiry.state() == PromptState::Refreshing {
        lines.push(Line::from(Span::styled(
            "  Refreshing...",
            styles::highlight_style(),
        )));
    } else {
        lines.push(Line::from(vec![
            Span::styled("  [c]", styles::help_key_style()),
            Span::styled(" Continue Session   ", styles::help_desc_style()),
            Span::styled("[l]", styles::help_key_style()),
            Span::styled(" Log Out", styles::help_desc_style()),
        ]));
    }

    if let Some(error) = app.expiry.error() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            styles::error_style(),
        )));
    }

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(overlay_block("Session Expired")),
        area,
    );
}
