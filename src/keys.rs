use crate::app::{App, MenuItem};
use crate::state::app_state::{FormMode, GameView};
use crate::state::messages::StorageRequest;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::error;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use ulti_engine::PointState;

/// Returns `false` once the user asked to quit.
pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    storage_requests: &mpsc::Sender<StorageRequest>,
) -> bool {
    let mut guard = app.lock().await;
    let keep_running = dispatch(&mut guard, key_event);
    let requests = guard.take_requests();
    drop(guard);

    for request in requests {
        if let Err(e) = storage_requests.send(request).await {
            error!("Failed to queue storage request: {e}");
        }
    }
    keep_running
}

pub fn dispatch(app: &mut App, key_event: KeyEvent) -> bool {
    let (code, modifiers) = (key_event.code, key_event.modifiers);
    if code == Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return false;
    }

    // A pending y/n question swallows every other key.
    if app.state.confirm.is_some() {
        match code {
            Char('y') | Char('Y') => app.confirm_yes(),
            Char('n') | Char('N') | KeyCode::Esc => app.confirm_no(),
            _ => {}
        }
        return true;
    }

    let tab = app.state.active_tab;
    if tab == MenuItem::Roster && app.state.roster.form.is_some() {
        handle_player_form(app, code);
        return true;
    }
    if tab == MenuItem::Game && app.state.game.view == GameView::Setup {
        handle_setup(app, code);
        return true;
    }
    if tab == MenuItem::Game && app.state.game.swap.is_some() {
        match code {
            Char('j') | KeyCode::Down => app.swap_down(),
            Char('k') | KeyCode::Up => app.swap_up(),
            KeyCode::Enter => app.swap_apply(),
            KeyCode::Esc => app.swap_cancel(),
            _ => {}
        }
        return true;
    }

    match (tab, code) {
        // Quit
        (_, Char('q')) => return false,

        // Tab switching
        (_, Char('1')) => app.update_tab(MenuItem::Roster),
        (_, Char('2')) => app.update_tab(MenuItem::Game),
        (_, Char('3')) => app.update_tab(MenuItem::Stats),
        (_, Char('?')) => app.update_tab(MenuItem::Help),
        (MenuItem::Help, KeyCode::Esc) => app.exit_help(),

        // Roster
        (MenuItem::Roster, Char('j') | KeyCode::Down) => app.roster_down(),
        (MenuItem::Roster, Char('k') | KeyCode::Up) => app.roster_up(),
        (MenuItem::Roster, Char('a')) => app.roster_open_form(FormMode::Add),
        (MenuItem::Roster, Char('A')) => app.roster_open_form(FormMode::QuickAdd),
        (MenuItem::Roster, Char('e') | KeyCode::Enter) => app.roster_edit_selected(),
        (MenuItem::Roster, Char('d')) => app.roster_request_delete(),
        (MenuItem::Roster, Char('C')) => app.roster_request_clear(),
        (MenuItem::Roster, Char('L')) => app.roster_request_reload(),

        (MenuItem::Game, _) => handle_game(app, code),

        // Stats
        (MenuItem::Stats, Char('v')) => app.stats_cycle_scope(),
        (MenuItem::Stats, Char('g')) => app.stats_cycle_gender(),
        (MenuItem::Stats, Char('r')) => app.stats_cycle_role(),
        (MenuItem::Stats, Char('l') | KeyCode::Right) => app.stats_column_next(),
        (MenuItem::Stats, Char('h') | KeyCode::Left) => app.stats_column_prev(),
        (MenuItem::Stats, KeyCode::Enter) => app.stats_select_column(),

        // Global
        (_, Char('f')) => app.toggle_full_screen(),
        (_, Char('"')) => app.toggle_show_logs(),
        (_, KeyCode::Esc) => app.dismiss_status(),

        _ => {}
    }
    true
}

fn handle_game(app: &mut App, code: KeyCode) {
    let in_progress = app
        .state
        .tournament
        .active()
        .is_ok_and(|g| g.current_state() == Some(PointState::InProgress));
    match (app.state.game.view.clone(), code) {
        (GameView::Hub, Char('j') | KeyCode::Down) => app.hub_down(),
        (GameView::Hub, Char('k') | KeyCode::Up) => app.hub_up(),
        (GameView::Hub, KeyCode::Enter) => app.hub_open(),
        (GameView::Hub, Char('n')) => app.hub_new_game(),
        (GameView::Hub, Char('d')) => app.hub_request_delete(),

        (GameView::Live | GameView::Review(_), Char('j') | KeyCode::Down) => app.cursor_down(),
        (GameView::Live | GameView::Review(_), Char('k') | KeyCode::Up) => app.cursor_up(),
        (GameView::Live | GameView::Review(_), Char('h') | KeyCode::Left) => app.view_prev_point(),
        (GameView::Live | GameView::Review(_), Char('l') | KeyCode::Right) => {
            app.view_next_point()
        }
        (GameView::Live | GameView::Review(_), Char('g')) => app.mark_goal(),
        (GameView::Live | GameView::Review(_), Char('a')) => app.mark_assist(),
        (GameView::Live | GameView::Review(_), Char('e')) => app.begin_edit(),
        (GameView::Live | GameView::Review(_), KeyCode::Enter) => app.game_enter(),
        (GameView::Live | GameView::Review(_), KeyCode::Esc) => app.game_back(),

        (GameView::Live, Char('s')) => app.swap_open(),
        (GameView::Live, Char('o')) => app.record_opponent_score(),
        (GameView::Live, Char('t')) if in_progress => app.toggle_halftime(),
        (GameView::Live, Char('E')) => app.request_end_game(),

        (_, Char('f')) => app.toggle_full_screen(),
        (_, Char('"')) => app.toggle_show_logs(),
        _ => {}
    }
}

fn handle_player_form(app: &mut App, code: KeyCode) {
    let on_name = app.state.is_typing();
    match code {
        KeyCode::Esc => app.form_cancel(),
        KeyCode::Enter => app.form_submit(),
        KeyCode::Tab | KeyCode::Down => app.form_next_field(),
        KeyCode::BackTab | KeyCode::Up => app.form_prev_field(),
        KeyCode::Backspace if on_name => app.form_backspace(),
        Char(c) if on_name => app.form_input(c),
        KeyCode::Left | KeyCode::Right | Char(' ') => app.form_cycle(),
        _ => {}
    }
}

fn handle_setup(app: &mut App, code: KeyCode) {
    let on_name = app.state.is_typing();
    match code {
        KeyCode::Esc => app.setup_cancel(),
        KeyCode::Enter => app.setup_start(),
        KeyCode::Tab | KeyCode::Down | KeyCode::Up => app.setup_next_field(),
        KeyCode::Backspace if on_name => app.setup_backspace(),
        Char(c) if on_name => app.setup_input(c),
        KeyCode::Left | KeyCode::Right | Char(' ') => app.setup_cycle(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::app_settings::AppSettings;
    use crate::state::app_state::PendingConfirm;
    use ulti_engine::{Gender, LinePreference, Role, Team, Tournament};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press(app: &mut App, keys: &str) {
        for c in keys.chars() {
            assert!(dispatch(app, key(Char(c))));
        }
    }

    fn app() -> App {
        let mut tournament = Tournament::default();
        tournament
            .roster
            .quick_add("Ann, Bea, Cat, Dee", Gender::Fmp, LinePreference::Flex, Role::Handler);
        tournament
            .roster
            .quick_add("Al, Bo, Cy, Di", Gender::Mmp, LinePreference::Flex, Role::Hybrid);
        App::new(AppSettings::default(), tournament)
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        assert!(!dispatch(&mut app, key(Char('q'))));
        assert!(!dispatch(&mut app, KeyEvent::new(Char('c'), KeyModifiers::CONTROL)));
    }

    #[test]
    fn test_typing_q_in_a_form_does_not_quit() {
        let mut app = app();
        press(&mut app, "a");
        press(&mut app, "Quinn");
        assert_eq!(app.state.roster.form.as_ref().unwrap().name, "Quinn");
        dispatch(&mut app, key(KeyCode::Tab));
        dispatch(&mut app, key(KeyCode::Right));
        dispatch(&mut app, key(KeyCode::Enter));
        let quinn = app.state.tournament.roster.players().last().unwrap().clone();
        assert_eq!(quinn.name, "Quinn");
        assert_eq!(quinn.gender, Gender::Fmp);
    }

    #[test]
    fn test_tabs_and_help() {
        let mut app = app();
        press(&mut app, "3");
        assert_eq!(app.state.active_tab, MenuItem::Stats);
        press(&mut app, "?");
        assert_eq!(app.state.active_tab, MenuItem::Help);
        dispatch(&mut app, key(KeyCode::Esc));
        assert_eq!(app.state.active_tab, MenuItem::Stats);
    }

    #[test]
    fn test_setup_and_play_a_point_by_keys() {
        let mut app = app();
        press(&mut app, "2n");
        assert_eq!(app.state.game.view, GameView::Setup);
        press(&mut app, "Riot");
        dispatch(&mut app, key(KeyCode::Tab));
        dispatch(&mut app, key(KeyCode::Right));
        dispatch(&mut app, key(KeyCode::Enter));

        let game = app.state.tournament.active().unwrap();
        assert_eq!(game.opponent_name, "Riot");
        assert_eq!(game.initial_offense, Team::Opponent);
        assert_eq!(app.state.game.view, GameView::Live);

        dispatch(&mut app, key(KeyCode::Enter));
        press(&mut app, "gja");
        dispatch(&mut app, key(KeyCode::Enter));
        assert_eq!(app.state.tournament.active().unwrap().moonlight_score, 1);

        dispatch(&mut app, key(KeyCode::Enter));
        press(&mut app, "o");
        assert_eq!(app.state.tournament.active().unwrap().opponent_score, 1);

        press(&mut app, "E");
        assert_eq!(app.state.confirm, Some(PendingConfirm::EndGame));
        press(&mut app, "n");
        assert!(app.state.tournament.active.is_some());
        press(&mut app, "Ey");
        assert!(app.state.tournament.active.is_none());
        assert_eq!(app.state.tournament.history[0].result_label(), "L 1 - 1");
    }

    #[test]
    fn test_halftime_key_needs_a_point_in_play() {
        let mut app = app();
        press(&mut app, "2n");
        dispatch(&mut app, key(KeyCode::Enter));
        press(&mut app, "t");
        assert!(!app.state.tournament.active().unwrap().halftime_armed);

        dispatch(&mut app, key(KeyCode::Enter));
        press(&mut app, "t");
        assert!(app.state.tournament.active().unwrap().halftime_armed);
    }

    #[tokio::test]
    async fn test_closed_storage_channel_keeps_the_ui_running() {
        let app = Arc::new(Mutex::new(app()));
        let (tx, rx) = mpsc::channel(4);
        drop(rx);

        assert!(handle_key_bindings(key(Char('d')), &app, &tx).await);
        assert!(handle_key_bindings(key(Char('y')), &app, &tx).await);
        let mut guard = app.lock().await;
        assert_eq!(guard.state.tournament.roster.len(), 7);
        assert!(guard.take_requests().is_empty());
    }

    #[test]
    fn test_key_handlers_queue_saves() {
        let mut app = app();
        press(&mut app, "dy");
        let requests = app.take_requests();
        assert!(matches!(requests.as_slice(), [StorageRequest::Save(_)]));
        assert_eq!(app.state.tournament.roster.len(), 7);
    }
}
