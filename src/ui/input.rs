//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes. The session-expired prompt captures all
//! input while visible; it offers exactly two actions and cannot be
//! dismissed.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, AppState, EditField, GalleryFocus, LoginFocus, Screen, PAGE_SCROLL_SIZE};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // The session-expired prompt is blocking: no other input is processed
    // while it is visible
    if app.expiry.is_visible() {
        handle_expiry_input(app, key).await;
        return Ok(false);
    }

    match app.state {
        AppState::LoggingIn => {
            handle_login_input(app, key).await;
            Ok(false)
        }
        AppState::Searching => {
            handle_search_input(app, key);
            Ok(false)
        }
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            Ok(false)
        }
        AppState::EditingMetadata => {
            handle_edit_input(app, key);
            Ok(false)
        }
        AppState::Uploading => {
            handle_upload_input(app, key);
            Ok(false)
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_delete(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_delete(),
                _ => {}
            }
            Ok(false)
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            Ok(false)
        }
        AppState::Quitting => Ok(true),
        AppState::Normal => handle_normal_input(app, key),
    }
}

async fn handle_expiry_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('C') | KeyCode::Enter => {
            app.continue_session_from_prompt().await;
        }
        KeyCode::Char('l') | KeyCode::Char('L') => {
            app.logout_from_prompt();
        }
        // Everything else, including Esc, is swallowed
        _ => {}
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Tab | KeyCode::Down => {
            app.login_focus = next_login_focus(app.login_focus);
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.login_focus = prev_login_focus(app.login_focus);
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Submit => app.attempt_auth().await,
            LoginFocus::ToggleMode => {
                app.signup_mode = !app.signup_mode;
                app.login_error = None;
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Email => {
                app.login_email.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            _ => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email if app.can_add_email_char() => app.login_email.push(c),
            LoginFocus::Password if app.can_add_password_char() => app.login_password.push(c),
            _ => {}
        },
        // The login overlay guards every screen; there is nothing to
        // dismiss to while unauthenticated
        _ => {}
    }
}

fn next_login_focus(focus: LoginFocus) -> LoginFocus {
    match focus {
        LoginFocus::Email => LoginFocus::Password,
        LoginFocus::Password => LoginFocus::Submit,
        LoginFocus::Submit => LoginFocus::ToggleMode,
        LoginFocus::ToggleMode => LoginFocus::Email,
    }
}

fn prev_login_focus(focus: LoginFocus) -> LoginFocus {
    match focus {
        LoginFocus::Email => LoginFocus::ToggleMode,
        LoginFocus::Password => LoginFocus::Email,
        LoginFocus::Submit => LoginFocus::Password,
        LoginFocus::ToggleMode => LoginFocus::Submit,
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter => {
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => {
            if app.search_query.pop().is_some() {
                app.mark_search_dirty();
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            if !app.search_query.is_empty() {
                app.search_query.clear();
                app.mark_search_dirty();
            }
        }
        KeyCode::Char(c) => {
            app.search_query.push(c);
            app.mark_search_dirty();
        }
        _ => {}
    }
}

fn handle_edit_input(app: &mut App, key: KeyEvent) {
    let Some(field) = app.edit_form.as_ref().map(|f| f.field) else {
        app.state = AppState::Normal;
        return;
    };

    match key.code {
        KeyCode::Esc => app.cancel_edit(),
        KeyCode::Tab | KeyCode::Down => {
            if let Some(form) = app.edit_form.as_mut() {
                form.next_field();
                form.error = None;
            }
        }
        KeyCode::Enter => match field {
            EditField::Save => app.save_edit(),
            EditField::TagInput => {
                if let Some(form) = app.edit_form.as_mut() {
                    form.add_tag();
                }
            }
            EditField::ColorInput => {
                if let Some(form) = app.edit_form.as_mut() {
                    form.add_color();
                }
            }
            EditField::Description => {
                if let Some(form) = app.edit_form.as_mut() {
                    form.next_field();
                }
            }
        },
        KeyCode::Backspace => {
            if let Some(form) = app.edit_form.as_mut() {
                match field {
                    EditField::Description => {
                        form.description.pop();
                    }
                    // An empty input removes the most recent entry
                    EditField::TagInput => {
                        if form.tag_input.pop().is_none() {
                            form.tags.pop();
                        }
                    }
                    EditField::ColorInput => {
                        if form.color_input.pop().is_none() {
                            form.colors.pop();
                        }
                    }
                    EditField::Save => {}
                }
            }
        }
        KeyCode::Char(c) => {
            if let Some(form) = app.edit_form.as_mut() {
                match field {
                    EditField::Description => form.description.push(c),
                    EditField::TagInput => form.tag_input.push(c),
                    EditField::ColorInput => form.color_input.push(c),
                    EditField::Save => {}
                }
            }
        }
        _ => {}
    }
}

fn handle_upload_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_upload(),
        KeyCode::Enter => app.submit_upload(),
        KeyCode::Backspace => {
            app.upload_input.pop();
        }
        KeyCode::Char(c) => {
            app.upload_input.push(c);
        }
        _ => {}
    }
}

fn handle_normal_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Keys shared by every screen
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char('u') => {
            app.start_upload();
            return Ok(false);
        }
        KeyCode::Char('r') => {
            app.reload_current_screen();
            return Ok(false);
        }
        KeyCode::Char('L') => {
            app.logout();
            return Ok(false);
        }
        _ => {}
    }

    match app.screen {
        Screen::Gallery => handle_gallery_input(app, key),
        Screen::Detail => handle_detail_input(app, key),
        Screen::Similar => handle_similar_input(app, key),
    }

    Ok(false)
}

fn handle_gallery_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Tab => {
            app.gallery_focus = match app.gallery_focus {
                GalleryFocus::Images => GalleryFocus::Tags,
                GalleryFocus::Tags => GalleryFocus::Colors,
                GalleryFocus::Colors => GalleryFocus::Images,
            };
        }
        KeyCode::BackTab => {
            app.gallery_focus = match app.gallery_focus {
                GalleryFocus::Images => GalleryFocus::Colors,
                GalleryFocus::Tags => GalleryFocus::Images,
                GalleryFocus::Colors => GalleryFocus::Tags,
            };
        }
        KeyCode::Char('/') => {
            app.state = AppState::Searching;
        }
        KeyCode::Char('o') => app.cycle_sort(),
        KeyCode::Char('c') => app.clear_filters(),
        KeyCode::Char('n') | KeyCode::Right => app.next_page(),
        KeyCode::Char('p') | KeyCode::Left => app.prev_page(),
        KeyCode::Char('j') | KeyCode::Down => move_gallery_selection(app, 1),
        KeyCode::Char('k') | KeyCode::Up => move_gallery_selection(app, -1),
        KeyCode::PageDown => move_gallery_selection(app, PAGE_SCROLL_SIZE as isize),
        KeyCode::PageUp => move_gallery_selection(app, -(PAGE_SCROLL_SIZE as isize)),
        KeyCode::Char(' ') => match app.gallery_focus {
            GalleryFocus::Tags => app.toggle_selected_tag(),
            GalleryFocus::Colors => app.toggle_selected_color(),
            GalleryFocus::Images => {}
        },
        KeyCode::Enter => match app.gallery_focus {
            GalleryFocus::Images => {
                if let Some(image_id) = app.selected_image().map(|i| i.id) {
                    app.open_detail(image_id);
                }
            }
            GalleryFocus::Tags => app.toggle_selected_tag(),
            GalleryFocus::Colors => app.toggle_selected_color(),
        },
        _ => {}
    }
}

fn handle_detail_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.back_to_gallery(),
        KeyCode::Char('e') => app.open_edit(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
        KeyCode::Char('s') => app.open_similar(),
        _ => {}
    }
}

fn handle_similar_input(app: &mut App, key: KeyEvent) {
    let count = app
        .similar
        .as_ref()
        .map(|s| s.similar_images.len())
        .unwrap_or(0);

    match key.code {
        KeyCode::Esc => app.back_to_detail(),
        KeyCode::Char('j') | KeyCode::Down => {
            app.similar_selection = step(app.similar_selection, 1, count);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.similar_selection = step(app.similar_selection, -1, count);
        }
        KeyCode::Enter => {
            if let Some(image_id) = app
                .similar
                .as_ref()
                .and_then(|s| s.similar_images.get(app.similar_selection))
                .map(|i| i.id)
            {
                app.open_detail(image_id);
            }
        }
        _ => {}
    }
}

fn move_gallery_selection(app: &mut App, delta: isize) {
    match app.gallery_focus {
        GalleryFocus::Images => {
            app.gallery_selection = step(app.gallery_selection, delta, app.images.len());
        }
        GalleryFocus::Tags => {
            app.tag_selection = step(app.tag_selection, delta, app.tag_options.len());
        }
        GalleryFocus::Colors => {
            app.color_selection = step(app.color_selection, delta, app.color_options.len());
        }
    }
}

/// Move `current` by `delta`, clamped to `[0, len)`.
fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let target = current as isize + delta;
    target.clamp(0, len as isize - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_clamps_to_bounds() {
        assert_eq!(step(0, -1, 5), 0);
        assert_eq!(step(4, 1, 5), 4);
        assert_eq!(step(2, 10, 5), 4);
        assert_eq!(step(2, -10, 5), 0);
        assert_eq!(step(0, 1, 0), 0);
    }

    #[test]
    fn login_focus_cycles_both_ways() {
        let mut focus = LoginFocus::Email;
        for _ in 0..4 {
            focus = next_login_focus(focus);
        }
        assert_eq!(focus, LoginFocus::Email);
        assert_eq!(prev_login_focus(LoginFocus::Email), LoginFocus::ToggleMode);
    }
}
