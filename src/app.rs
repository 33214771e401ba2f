use crate::state::app_settings::AppSettings;
use crate::state::app_state::{
    AppState, FormMode, GameView, PendingConfirm, PlayerForm, SetupForm, StatusMessage,
    SwapPicker,
};
use crate::state::messages::StorageRequest;
use log::{debug, info};
use ulti_engine::{
    EngineError, EngineResult, Game, GameConfig, MIN_ROSTER, Player, PlayerStats, Point,
    PointState, Roster, ScoreEvent, Severity, StatsScope, Tournament,
};

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Roster,
    Game,
    Stats,
    Help,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
    /// Storage work queued by the last handler, drained by the key loop.
    outbox: Vec<StorageRequest>,
}

impl App {
    pub fn new(settings: AppSettings, tournament: Tournament) -> Self {
        let mut app = Self {
            state: AppState::new(tournament),
            settings,
            outbox: Vec::new(),
        };

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        if app.state.tournament.active.is_some() {
            app.state.active_tab = MenuItem::Game;
            app.enter_live();
        }

        app
    }

    pub fn take_requests(&mut self) -> Vec<StorageRequest> {
        std::mem::take(&mut self.outbox)
    }

    fn persist(&mut self) {
        let snapshot = self.state.tournament.snapshot();
        self.outbox.push(StorageRequest::Save(Box::new(snapshot)));
    }

    fn report(&mut self, err: EngineError) {
        debug!("rejected: {err}");
        self.state.status = Some(match err.severity() {
            Severity::Warning => StatusMessage::warning(err.to_string()),
            Severity::Validation | Severity::InvalidTransition => {
                StatusMessage::error(err.to_string())
            }
        });
    }

    fn notify(&mut self, text: impl Into<String>) {
        self.state.status = Some(StatusMessage::info(text));
    }

    // -----------------------------------------------------------------------
    // Storage response handlers — called from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_error(&mut self, message: String) {
        self.state.status = Some(StatusMessage::error(message));
    }

    pub fn on_roster_loaded(&mut self, roster: Option<Roster>) {
        match roster {
            Some(roster) => {
                info!("roster reloaded: {} players", roster.len());
                self.notify(format!("Roster reloaded ({} players).", roster.len()));
                self.state.tournament.roster = roster;
                self.state.roster.clamp(self.state.tournament.roster.len());
            }
            None => self.on_error("No saved roster found.".to_string()),
        }
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
        if next == MenuItem::Stats {
            let scopes = self.state.tournament.stats_scopes().len();
            if self.state.stats.scope >= scopes {
                self.state.stats.scope = 0;
            }
        }
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    pub fn dismiss_status(&mut self) {
        self.state.status = None;
    }

    // -----------------------------------------------------------------------
    // Confirmations
    // -----------------------------------------------------------------------

    pub fn confirm_yes(&mut self) {
        let Some(pending) = self.state.confirm.take() else {
            return;
        };
        match pending {
            PendingConfirm::DeletePlayer { id, name } => {
                match self.state.tournament.delete_player(&id) {
                    Ok(_) => {
                        self.state.roster.clamp(self.state.tournament.roster.len());
                        self.notify(format!("Deleted {name}."));
                        self.persist();
                    }
                    Err(err) => self.report(err),
                }
            }
            PendingConfirm::ClearRoster => {
                self.state.tournament.roster.clear();
                self.state.roster.selected = 0;
                self.notify("Roster cleared.");
                self.persist();
            }
            PendingConfirm::ReloadRoster => self.outbox.push(StorageRequest::LoadRoster),
            PendingConfirm::DeleteGame { id, label } => {
                match self.state.tournament.delete_game(&id) {
                    Ok(_) => {
                        self.state.game.hub_selected = self.state.game.hub_selected.saturating_sub(1);
                        self.state.stats.scope = 0;
                        self.notify(format!("Deleted game {label}."));
                        self.persist();
                    }
                    Err(err) => self.report(err),
                }
            }
            PendingConfirm::EndGame => match self.state.tournament.end_active_game() {
                Ok(id) => {
                    self.game_over(&id);
                    self.persist();
                }
                Err(err) => self.report(err),
            },
            PendingConfirm::AcceptLine(_) => self.set_line(true),
        }
    }

    pub fn confirm_no(&mut self) {
        self.state.confirm = None;
    }

    // -----------------------------------------------------------------------
    // Roster tab
    // -----------------------------------------------------------------------

    pub fn roster_down(&mut self) {
        let len = self.state.tournament.roster.len();
        self.state.roster.select_down(len);
    }

    pub fn roster_up(&mut self) {
        self.state.roster.select_up();
    }

    fn selected_player(&self) -> Option<&Player> {
        self.state.tournament.roster.get(self.state.roster.selected)
    }

    pub fn roster_open_form(&mut self, mode: FormMode) {
        self.state.roster.form = Some(PlayerForm::new(mode));
    }

    pub fn roster_edit_selected(&mut self) {
        if let Some(player) = self.selected_player() {
            self.state.roster.form = Some(PlayerForm::edit(player));
        }
    }

    pub fn roster_request_delete(&mut self) {
        if let Some(player) = self.selected_player() {
            self.state.confirm = Some(PendingConfirm::DeletePlayer {
                id: player.id.clone(),
                name: player.name.clone(),
            });
        }
    }

    pub fn roster_request_clear(&mut self) {
        if !self.state.tournament.roster.is_empty() {
            self.state.confirm = Some(PendingConfirm::ClearRoster);
        }
    }

    pub fn roster_request_reload(&mut self) {
        self.state.confirm = Some(PendingConfirm::ReloadRoster);
    }

    pub fn form_input(&mut self, c: char) {
        if let Some(form) = self.state.roster.form.as_mut() {
            form.name.push(c);
        }
    }

    pub fn form_backspace(&mut self) {
        if let Some(form) = self.state.roster.form.as_mut() {
            form.name.pop();
        }
    }

    pub fn form_next_field(&mut self) {
        if let Some(form) = self.state.roster.form.as_mut() {
            form.focus = form.focus.next();
        }
    }

    pub fn form_prev_field(&mut self) {
        if let Some(form) = self.state.roster.form.as_mut() {
            form.focus = form.focus.prev();
        }
    }

    pub fn form_cycle(&mut self) {
        if let Some(form) = self.state.roster.form.as_mut() {
            form.cycle();
        }
    }

    pub fn form_cancel(&mut self) {
        self.state.roster.form = None;
    }

    pub fn form_submit(&mut self) {
        let Some(form) = self.state.roster.form.clone() else {
            return;
        };
        let roster = &mut self.state.tournament.roster;
        let result = match &form.mode {
            FormMode::Add => roster
                .add(&form.name, form.gender, form.line, form.role)
                .map(|_| format!("Added {}.", form.name.trim())),
            FormMode::QuickAdd => {
                let added = roster.quick_add(&form.name, form.gender, form.line, form.role);
                Ok(format!("Added {} players.", added.len()))
            }
            FormMode::Edit(id) => roster
                .edit(id, &form.name, form.gender, form.line, form.role)
                .map(|_| format!("Updated {}.", form.name.trim())),
        };
        match result {
            Ok(message) => {
                if form.mode == FormMode::Add {
                    self.state.roster.selected = self.state.tournament.roster.len().saturating_sub(1);
                }
                self.state.roster.form = None;
                self.notify(message);
                self.persist();
            }
            Err(err) => self.report(err),
        }
    }

    // -----------------------------------------------------------------------
    // Game hub and setup
    // -----------------------------------------------------------------------

    /// Rows of the hub list: the active game first, then history.
    pub fn hub_rows(&self) -> Vec<&Game> {
        self.state
            .tournament
            .active
            .iter()
            .chain(self.state.tournament.history.iter())
            .collect()
    }

    pub fn hub_down(&mut self) {
        if self.state.game.hub_selected + 1 < self.hub_rows().len() {
            self.state.game.hub_selected += 1;
        }
    }

    pub fn hub_up(&mut self) {
        self.state.game.hub_selected = self.state.game.hub_selected.saturating_sub(1);
    }

    fn hub_selected_game(&self) -> Option<(bool, String)> {
        let game = self.hub_rows().get(self.state.game.hub_selected).copied()?;
        Some((!game.is_complete, game.id.clone()))
    }

    pub fn hub_open(&mut self) {
        match self.hub_selected_game() {
            Some((true, _)) => self.enter_live(),
            Some((false, id)) => {
                self.state.game.back_to_hub();
                self.state.game.view = GameView::Review(id);
            }
            None => {}
        }
    }

    pub fn hub_new_game(&mut self) {
        if self.state.tournament.active.is_some() {
            self.report(EngineError::GameInProgress);
            return;
        }
        let found = self.state.tournament.roster.len();
        if found < MIN_ROSTER {
            self.report(EngineError::RosterTooSmall { required: MIN_ROSTER, found });
            return;
        }
        self.state.game.setup = SetupForm::default();
        self.state.game.view = GameView::Setup;
    }

    pub fn hub_request_delete(&mut self) {
        match self.hub_selected_game() {
            Some((true, _)) => self.on_error("End the game before deleting it.".to_string()),
            Some((false, id)) => {
                let label = self
                    .state
                    .tournament
                    .history_game(&id)
                    .map(|g| format!("vs {} ({})", g.opponent_name, g.result_label()))
                    .unwrap_or_else(|_| id.clone());
                self.state.confirm = Some(PendingConfirm::DeleteGame { id, label });
            }
            None => {}
        }
    }

    pub fn setup_input(&mut self, c: char) {
        self.state.game.setup.opponent.push(c);
    }

    pub fn setup_backspace(&mut self) {
        self.state.game.setup.opponent.pop();
    }

    pub fn setup_next_field(&mut self) {
        let setup = &mut self.state.game.setup;
        setup.focus = setup.focus.next();
    }

    pub fn setup_cycle(&mut self) {
        self.state.game.setup.cycle();
    }

    pub fn setup_cancel(&mut self) {
        self.state.game.back_to_hub();
    }

    pub fn setup_start(&mut self) {
        let setup = &self.state.game.setup;
        let config = GameConfig {
            initial_offense: setup.initial_offense,
            a_gender: setup.a_gender,
            opponent_name: setup.opponent.clone(),
        };
        match self.state.tournament.start_game(config) {
            Ok(game) => {
                let message = format!("Game on vs {}.", game.opponent_name);
                self.notify(message);
                self.state.game.hub_selected = 0;
                self.enter_live();
                self.persist();
            }
            Err(err) => self.report(err),
        }
    }

    // -----------------------------------------------------------------------
    // Live game and review
    // -----------------------------------------------------------------------

    pub fn enter_live(&mut self) {
        self.state.game.view = GameView::Live;
        self.state.game.viewed_point = None;
        self.state.game.clear_selection();
        self.refresh_draft();
    }

    /// Suggest a fresh line if the current point is waiting for one.
    fn refresh_draft(&mut self) {
        let draft = match self.state.tournament.active() {
            Ok(game) if game.current_state() == Some(PointState::LinePending) => {
                game.propose_line().ok()
            }
            _ => None,
        };
        if let Some(issue) = draft.as_ref().and_then(|d| d.issue()).filter(|i| i.is_fatal()) {
            self.on_error(issue.to_string());
        }
        self.state.game.draft = draft;
    }

    pub fn displayed_game(&self) -> Option<&Game> {
        match &self.state.game.view {
            GameView::Live => self.state.tournament.active.as_ref(),
            GameView::Review(id) => self.state.tournament.history_game(id).ok(),
            GameView::Hub | GameView::Setup => None,
        }
    }

    pub fn displayed_point(&self) -> Option<&Point> {
        let game = self.displayed_game()?;
        match self.state.game.viewed_point {
            Some(number) => game.point(number),
            None => game.points.last(),
        }
    }

    /// Whether the displayed point is the live point of the active game.
    fn viewing_current(&self) -> bool {
        self.state.game.view == GameView::Live
            && self.state.game.viewed_point.is_none()
            && self.displayed_point().is_some_and(|p| !p.outcome.is_complete())
    }

    /// The rows the cursor moves over: the draft while picking a line,
    /// otherwise the displayed point's line.
    pub fn displayed_line(&self) -> Vec<Player> {
        if self.viewing_current()
            && let Some(draft) = &self.state.game.draft
        {
            return draft.line.clone();
        }
        self.displayed_point().map(|p| p.line.clone()).unwrap_or_default()
    }

    pub fn cursor_down(&mut self) {
        let len = self.displayed_line().len();
        if self.state.game.cursor + 1 < len {
            self.state.game.cursor += 1;
        }
    }

    pub fn cursor_up(&mut self) {
        self.state.game.cursor = self.state.game.cursor.saturating_sub(1);
    }

    pub fn view_prev_point(&mut self) {
        let Some(current) = self.displayed_point().map(|p| p.number) else {
            return;
        };
        if current > 1 {
            self.state.game.viewed_point = Some(current - 1);
            self.state.game.clear_selection();
        }
    }

    pub fn view_next_point(&mut self) {
        let Some(game) = self.displayed_game() else {
            return;
        };
        let last = game.points.last().map_or(0, |p| p.number);
        let Some(current) = self.state.game.viewed_point else {
            return;
        };
        self.state.game.viewed_point = if current + 1 >= last { None } else { Some(current + 1) };
        self.state.game.clear_selection();
    }

    fn cursor_player(&self) -> Option<Player> {
        self.displayed_line().get(self.state.game.cursor).cloned()
    }

    fn can_pick_scorers(&self) -> bool {
        self.state.game.editing
            || (self.viewing_current()
                && self.displayed_point().map(Point::state) == Some(PointState::InProgress))
    }

    pub fn mark_goal(&mut self) {
        if !self.can_pick_scorers() {
            return;
        }
        if let Some(player) = self.cursor_player() {
            let game = &mut self.state.game;
            game.goal = if game.goal.as_ref() == Some(&player.id) { None } else { Some(player.id) };
        }
    }

    pub fn mark_assist(&mut self) {
        if !self.can_pick_scorers() {
            return;
        }
        if let Some(player) = self.cursor_player() {
            let game = &mut self.state.game;
            game.assist = if game.assist.as_ref() == Some(&player.id) { None } else { Some(player.id) };
        }
    }

    /// Enter: save an edit, confirm the line or record our score, depending
    /// on where the displayed point is.
    pub fn game_enter(&mut self) {
        if self.state.game.editing {
            self.save_edit();
            return;
        }
        if !self.viewing_current() {
            return;
        }
        match self.displayed_point().map(Point::state) {
            Some(PointState::LinePending) => self.set_line(false),
            Some(PointState::InProgress) => self.record_own_score(),
            _ => {}
        }
    }

    fn set_line(&mut self, acknowledge_warning: bool) {
        let Some(line) = self.state.game.draft.as_ref().map(|d| d.line.clone()) else {
            self.report(EngineError::NoActiveGame);
            return;
        };
        match self
            .state
            .tournament
            .with_active(|game| game.set_line(line, acknowledge_warning))
        {
            Ok(()) => {
                self.state.game.draft = None;
                self.state.game.clear_selection();
                self.dismiss_status();
                self.persist();
            }
            Err(EngineError::LineWarning(issue)) => {
                self.state.confirm = Some(PendingConfirm::AcceptLine(issue));
            }
            Err(err) => self.report(err),
        }
    }

    pub fn record_own_score(&mut self) {
        let goal = self.state.game.goal.clone();
        let assist = self.state.game.assist.clone();
        let result = self
            .state
            .tournament
            .with_active(|game| game.record_own_score(goal.as_ref(), assist.as_ref()));
        match result {
            Ok(event) => self.after_score(event),
            Err(err) => self.report(err),
        }
    }

    pub fn record_opponent_score(&mut self) {
        if !self.viewing_current() {
            return;
        }
        match self.state.tournament.with_active(Game::record_opponent_score) {
            Ok(event) => self.after_score(event),
            Err(err) => self.report(err),
        }
    }

    fn after_score(&mut self, event: ScoreEvent) {
        self.state.game.clear_selection();
        self.dismiss_status();
        if event.ended.is_some() {
            let id = self.state.tournament.history.first().map(|g| g.id.clone());
            if let Some(id) = id {
                self.game_over(&id);
            }
        } else {
            if event.halftime_triggered
                && let Some(side) = event.next_side
            {
                self.notify(format!("Halftime! Next point starts on {}.", side.label()));
            }
            self.refresh_draft();
        }
        self.persist();
    }

    fn game_over(&mut self, id: &str) {
        let summary = self
            .state
            .tournament
            .history_game(id)
            .map(|g| format!("Game over vs {}: {}.", g.opponent_name, g.result_label()))
            .unwrap_or_else(|_| "Game over.".to_string());
        self.state.game.back_to_hub();
        self.state.game.hub_selected = 0;
        self.notify(summary);
    }

    pub fn toggle_halftime(&mut self) {
        let Ok(game) = self.state.tournament.active() else {
            return;
        };
        if game.is_halftime {
            self.on_error("Halftime has already happened.".to_string());
            return;
        }
        let armed = !game.halftime_armed;
        match self.state.tournament.with_active(|game| game.arm_halftime(armed)) {
            Ok(()) => {
                if armed {
                    self.notify("Halftime after the next score.");
                } else {
                    self.notify("Halftime no longer armed.");
                }
                self.persist();
            }
            Err(err) => self.report(err),
        }
    }

    pub fn request_end_game(&mut self) {
        if self.state.tournament.active.is_some() {
            self.state.confirm = Some(PendingConfirm::EndGame);
        }
    }

    pub fn swap_open(&mut self) {
        if !self.viewing_current() {
            return;
        }
        let (Some(draft), Some(outgoing)) = (self.state.game.draft.as_ref(), self.cursor_player())
        else {
            return;
        };
        let Ok(game) = self.state.tournament.active() else {
            return;
        };
        let candidates: Vec<(Player, usize)> = draft
            .replacement_candidates(&game.roster, &outgoing.id)
            .into_iter()
            .map(|p| (p.clone(), game.play_count(&p.id)))
            .collect();
        if candidates.is_empty() {
            self.report(EngineError::NoReplacement);
            return;
        }
        self.state.game.swap = Some(SwapPicker {
            outgoing: outgoing.id,
            candidates,
            selected: 0,
        });
    }

    pub fn swap_down(&mut self) {
        if let Some(swap) = self.state.game.swap.as_mut()
            && swap.selected + 1 < swap.candidates.len()
        {
            swap.selected += 1;
        }
    }

    pub fn swap_up(&mut self) {
        if let Some(swap) = self.state.game.swap.as_mut() {
            swap.selected = swap.selected.saturating_sub(1);
        }
    }

    pub fn swap_cancel(&mut self) {
        self.state.game.swap = None;
    }

    pub fn swap_apply(&mut self) {
        let Some(swap) = self.state.game.swap.take() else {
            return;
        };
        let Some((incoming, _)) = swap.candidates.get(swap.selected) else {
            return;
        };
        let Some(draft) = self.state.game.draft.as_mut() else {
            return;
        };
        match draft.swap(&swap.outgoing, incoming) {
            Ok(Some(issue)) => self.state.status = Some(StatusMessage::warning(issue.to_string())),
            Ok(None) => self.dismiss_status(),
            Err(err) => self.report(err),
        }
    }

    pub fn begin_edit(&mut self) {
        let Some(point) = self.displayed_point() else {
            return;
        };
        if point.scored_by() != Some(ulti_engine::Team::Moonlight) {
            self.on_error("Only Moonlight scores can be edited.".to_string());
            return;
        }
        let (goal, assist) = (point.goal.clone(), point.assist.clone());
        let game = &mut self.state.game;
        game.clear_selection();
        game.editing = true;
        game.goal = goal;
        game.assist = assist;
    }

    fn save_edit(&mut self) {
        let Some(number) = self.displayed_point().map(|p| p.number) else {
            return;
        };
        let goal = self.state.game.goal.clone();
        let assist = self.state.game.assist.clone();
        let result: EngineResult<()> = match self.state.game.view.clone() {
            GameView::Live => self
                .state
                .tournament
                .with_active(|game| game.edit_outcome(number, goal.as_ref(), assist.as_ref())),
            GameView::Review(id) => self.state.tournament.edit_history_outcome(
                &id,
                number,
                goal.as_ref(),
                assist.as_ref(),
            ),
            GameView::Hub | GameView::Setup => return,
        };
        match result {
            Ok(()) => {
                self.state.game.clear_selection();
                self.notify(format!("Point {number} updated."));
                self.persist();
            }
            Err(err) => self.report(err),
        }
    }

    /// Esc inside the game screens peels back one layer.
    pub fn game_back(&mut self) {
        let game = &mut self.state.game;
        if game.swap.is_some() {
            game.swap = None;
        } else if game.editing {
            game.clear_selection();
        } else if game.viewed_point.is_some() && game.view == GameView::Live {
            game.viewed_point = None;
            game.clear_selection();
        } else {
            game.back_to_hub();
        }
    }

    // -----------------------------------------------------------------------
    // Stats tab
    // -----------------------------------------------------------------------

    pub fn stats_scope(&self) -> StatsScope {
        self.state
            .tournament
            .stats_scopes()
            .into_iter()
            .nth(self.state.stats.scope)
            .unwrap_or(StatsScope::Tournament)
    }

    pub fn stats_rows(&self) -> EngineResult<Vec<PlayerStats>> {
        self.state
            .tournament
            .stats(&self.stats_scope(), &self.state.stats.query)
    }

    pub fn stats_cycle_scope(&mut self) {
        let count = self.state.tournament.stats_scopes().len();
        self.state.stats.scope = (self.state.stats.scope + 1) % count.max(1);
    }

    pub fn stats_cycle_gender(&mut self) {
        self.state.stats.query.filter.cycle_gender();
    }

    pub fn stats_cycle_role(&mut self) {
        self.state.stats.query.filter.cycle_role();
    }

    pub fn stats_column_next(&mut self) {
        let stats = &mut self.state.stats;
        stats.column_cursor = stats.column_cursor.next();
    }

    pub fn stats_column_prev(&mut self) {
        let stats = &mut self.state.stats;
        stats.column_cursor = stats.column_cursor.prev();
    }

    pub fn stats_select_column(&mut self) {
        let column = self.state.stats.column_cursor;
        self.state.stats.query.sort.select(column);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::app_state::StatusKind;
    use ulti_engine::{Gender, LinePreference, Outcome, Role, StatsColumn};

    fn app_with_roster(per_gender: usize) -> App {
        let mut tournament = Tournament::default();
        for gender in [Gender::Mmp, Gender::Fmp] {
            for i in 0..per_gender {
                let role = if i % 2 == 0 { Role::Handler } else { Role::Cutter };
                tournament
                    .roster
                    .add(&format!("{gender}{i}"), gender, LinePreference::Flex, role)
                    .unwrap();
            }
        }
        App::new(AppSettings::default(), tournament)
    }

    fn start(app: &mut App) {
        app.update_tab(MenuItem::Game);
        app.hub_new_game();
        app.state.game.setup.opponent = "Fury".to_string();
        app.setup_start();
        assert_eq!(app.state.game.view, GameView::Live);
    }

    fn saves(app: &mut App) -> usize {
        app.take_requests()
            .iter()
            .filter(|r| matches!(r, StorageRequest::Save(_)))
            .count()
    }

    #[test]
    fn test_start_game_proposes_a_line() {
        let mut app = app_with_roster(5);
        start(&mut app);
        let draft = app.state.game.draft.as_ref().unwrap();
        assert_eq!(draft.line.len(), 7);
        assert_eq!(saves(&mut app), 1);
    }

    #[test]
    fn test_halftime_toggle_saves_only_on_change() {
        let mut app = app_with_roster(5);
        start(&mut app);
        app.game_enter();
        saves(&mut app);

        app.toggle_halftime();
        assert!(app.state.tournament.active().unwrap().halftime_armed);
        assert_eq!(saves(&mut app), 1);

        if let Some(game) = app.state.tournament.active.as_mut() {
            game.is_halftime = true;
            game.halftime_armed = false;
        }
        app.toggle_halftime();
        assert!(!app.state.tournament.active().unwrap().halftime_armed);
        assert_eq!(app.state.status.as_ref().unwrap().kind, StatusKind::Error);
        assert_eq!(saves(&mut app), 0);
    }

    #[test]
    fn test_small_roster_cannot_start() {
        let mut app = app_with_roster(3);
        app.update_tab(MenuItem::Game);
        app.hub_new_game();
        assert_eq!(app.state.game.view, GameView::Hub);
        let status = app.state.status.clone().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert!(status.text.contains("at least 7"));
        assert!(app.take_requests().is_empty());
    }

    #[test]
    fn test_full_point_flow() {
        let mut app = app_with_roster(5);
        start(&mut app);
        app.game_enter();
        assert!(app.state.game.draft.is_none());
        assert_eq!(
            app.state.tournament.active().unwrap().current_state(),
            Some(PointState::InProgress)
        );

        app.game_enter();
        assert_eq!(app.state.status.as_ref().unwrap().text, "Please select both a Goal and an Assist.");

        app.mark_goal();
        app.cursor_down();
        app.mark_assist();
        app.game_enter();

        let game = app.state.tournament.active().unwrap();
        assert_eq!(game.moonlight_score, 1);
        assert_eq!(game.points[0].outcome, Outcome::MoonlightScore);
        assert_eq!(game.points.len(), 2);
        assert!(app.state.game.draft.is_some());
        assert!(app.state.game.goal.is_none());
    }

    #[test]
    fn test_line_warning_needs_confirmation() {
        let mut app = app_with_roster(5);
        for player in app.state.tournament.roster.players().to_vec() {
            app.state
                .tournament
                .roster
                .edit(&player.id, &player.name, player.gender, player.line, Role::Cutter)
                .unwrap();
        }
        start(&mut app);
        app.game_enter();
        assert!(matches!(app.state.confirm, Some(PendingConfirm::AcceptLine(_))));
        assert_eq!(
            app.state.tournament.active().unwrap().current_state(),
            Some(PointState::LinePending)
        );

        app.confirm_yes();
        assert_eq!(
            app.state.tournament.active().unwrap().current_state(),
            Some(PointState::InProgress)
        );
    }

    #[test]
    fn test_swap_keeps_gender() {
        let mut app = app_with_roster(6);
        start(&mut app);
        let outgoing = app.displayed_line()[0].clone();
        app.swap_open();
        let swap = app.state.game.swap.clone().unwrap();
        assert!(swap.candidates.iter().all(|(p, _)| p.gender == outgoing.gender));
        let incoming = swap.candidates[0].0.clone();
        app.swap_apply();
        let line = app.displayed_line();
        assert!(line.iter().any(|p| p.id == incoming.id));
        assert!(line.iter().all(|p| p.id != outgoing.id));
    }

    #[test]
    fn test_opponent_score_and_end_game() {
        let mut app = app_with_roster(5);
        start(&mut app);
        app.game_enter();
        app.record_opponent_score();
        assert_eq!(app.state.tournament.active().unwrap().opponent_score, 1);

        app.request_end_game();
        app.confirm_yes();
        assert!(app.state.tournament.active.is_none());
        assert_eq!(app.state.game.view, GameView::Hub);
        assert_eq!(app.state.tournament.history.len(), 1);
        assert_eq!(app.state.tournament.history[0].points.len(), 1);
        assert!(app.state.status.as_ref().unwrap().text.contains("L 0 - 1"));
    }

    #[test]
    fn test_edit_past_score_in_review() {
        let mut app = app_with_roster(5);
        start(&mut app);
        app.game_enter();
        app.mark_goal();
        app.cursor_down();
        app.mark_assist();
        app.game_enter();
        app.request_end_game();
        app.confirm_yes();

        app.hub_open();
        assert!(matches!(app.state.game.view, GameView::Review(_)));
        app.begin_edit();
        assert!(app.state.game.editing);
        app.cursor_down();
        app.cursor_down();
        app.mark_goal();
        app.game_enter();

        let line = app.state.tournament.history[0].points[0].line.clone();
        assert_eq!(app.state.tournament.history[0].points[0].goal, Some(line[2].id.clone()));
        assert!(!app.state.game.editing);
    }

    #[test]
    fn test_delete_player_in_active_game_is_blocked() {
        let mut app = app_with_roster(5);
        start(&mut app);
        app.game_enter();
        let on_line = app.state.tournament.active().unwrap().points[0].line[0].clone();
        let index = app
            .state
            .tournament
            .roster
            .players()
            .iter()
            .position(|p| p.id == on_line.id)
            .unwrap();

        app.update_tab(MenuItem::Roster);
        app.state.roster.selected = index;
        app.roster_request_delete();
        app.confirm_yes();
        assert!(app.state.tournament.roster.find(&on_line.id).is_some());
        assert!(app.state.status.as_ref().unwrap().text.contains("cannot be deleted"));
    }

    #[test]
    fn test_roster_form_add_and_duplicate() {
        let mut app = app_with_roster(0);
        app.roster_open_form(FormMode::Add);
        for c in "Kim".chars() {
            app.form_input(c);
        }
        app.form_next_field();
        app.form_cycle();
        app.form_submit();
        let kim = &app.state.tournament.roster.players()[0];
        assert_eq!(kim.name, "Kim");
        assert_eq!(kim.gender, Gender::Fmp);
        assert!(app.state.roster.form.is_none());
        assert_eq!(saves(&mut app), 1);

        app.roster_open_form(FormMode::Add);
        for c in "kim".chars() {
            app.form_input(c);
        }
        app.form_submit();
        assert!(app.state.roster.form.is_some());
        assert_eq!(app.state.tournament.roster.len(), 1);
    }

    #[test]
    fn test_reload_roster_round_trip() {
        let mut app = app_with_roster(1);
        app.roster_request_reload();
        app.confirm_yes();
        assert!(matches!(app.take_requests().as_slice(), [StorageRequest::LoadRoster]));

        app.on_roster_loaded(None);
        assert_eq!(app.state.status.as_ref().unwrap().text, "No saved roster found.");

        app.on_roster_loaded(Some(Roster::default()));
        assert!(app.state.tournament.roster.is_empty());
    }

    #[test]
    fn test_stats_sort_selection() {
        let mut app = app_with_roster(4);
        app.update_tab(MenuItem::Stats);
        app.stats_column_next();
        assert_eq!(app.state.stats.column_cursor, StatsColumn::Goals);
        app.stats_select_column();
        assert_eq!(app.state.stats.query.sort.column, StatsColumn::Goals);
        app.stats_select_column();
        assert_eq!(
            app.state.stats.query.sort.direction,
            ulti_engine::SortDirection::Ascending
        );
        assert_eq!(app.stats_rows().unwrap().len(), 8);
        app.stats_cycle_scope();
        assert_eq!(app.stats_scope(), StatsScope::Tournament);
    }
}
