use crate::app::MenuItem;
use ulti_engine::{
    Gender, LineDraft, LineIssue, LinePreference, Player, PlayerId, Role, StatsColumn, StatsQuery,
    Team, Tournament,
};

// ---------------------------------------------------------------------------
// Status line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self { kind: StatusKind::Info, text: text.into() }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self { kind: StatusKind::Warning, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { kind: StatusKind::Error, text: text.into() }
    }
}

// ---------------------------------------------------------------------------
// y/n confirmations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum PendingConfirm {
    DeletePlayer { id: PlayerId, name: String },
    ClearRoster,
    ReloadRoster,
    DeleteGame { id: String, label: String },
    EndGame,
    /// Confirm a line that only trips the handler warning.
    AcceptLine(LineIssue),
}

impl PendingConfirm {
    pub fn prompt(&self) -> String {
        match self {
            PendingConfirm::DeletePlayer { name, .. } => format!("Delete {name}?"),
            PendingConfirm::ClearRoster => "Clear the entire roster?".to_string(),
            PendingConfirm::ReloadRoster => {
                "Replace the roster with the last saved copy?".to_string()
            }
            PendingConfirm::DeleteGame { label, .. } => format!("Delete game {label}?"),
            PendingConfirm::EndGame => "End the game now?".to_string(),
            PendingConfirm::AcceptLine(issue) => format!("{issue} Play this line anyway?"),
        }
    }
}

// ---------------------------------------------------------------------------
// Roster tab
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum FormMode {
    Add,
    /// Comma-separated names, one bucket.
    QuickAdd,
    Edit(PlayerId),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormField {
    #[default]
    Name,
    Gender,
    Line,
    Role,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Name => FormField::Gender,
            FormField::Gender => FormField::Line,
            FormField::Line => FormField::Role,
            FormField::Role => FormField::Name,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FormField::Name => FormField::Role,
            FormField::Gender => FormField::Name,
            FormField::Line => FormField::Gender,
            FormField::Role => FormField::Line,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerForm {
    pub mode: FormMode,
    pub focus: FormField,
    pub name: String,
    pub gender: Gender,
    pub line: LinePreference,
    pub role: Role,
}

impl PlayerForm {
    pub fn new(mode: FormMode) -> Self {
        Self {
            mode,
            focus: FormField::Name,
            name: String::new(),
            gender: Gender::Mmp,
            line: LinePreference::Flex,
            role: Role::Cutter,
        }
    }

    pub fn edit(player: &Player) -> Self {
        Self {
            mode: FormMode::Edit(player.id.clone()),
            focus: FormField::Name,
            name: player.name.clone(),
            gender: player.gender,
            line: player.line,
            role: player.role,
        }
    }

    /// Cycle the focused choice field. No-op on the name field.
    pub fn cycle(&mut self) {
        match self.focus {
            FormField::Name => {}
            FormField::Gender => self.gender = self.gender.other(),
            FormField::Line => self.line = self.line.next(),
            FormField::Role => self.role = self.role.next(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            FormMode::Add => " Add Player ",
            FormMode::QuickAdd => " Quick Add (comma separated) ",
            FormMode::Edit(_) => " Edit Player ",
        }
    }
}

#[derive(Debug, Default)]
pub struct RosterState {
    pub selected: usize,
    pub form: Option<PlayerForm>,
}

impl RosterState {
    pub fn select_down(&mut self, len: usize) {
        if self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn select_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

// ---------------------------------------------------------------------------
// Game tab
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GameView {
    /// Active game (if any) followed by history, newest first.
    #[default]
    Hub,
    Setup,
    Live,
    /// Read-only walk through a finished game.
    Review(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SetupField {
    #[default]
    Opponent,
    InitialOffense,
    AGender,
}

impl SetupField {
    pub fn next(self) -> Self {
        match self {
            SetupField::Opponent => SetupField::InitialOffense,
            SetupField::InitialOffense => SetupField::AGender,
            SetupField::AGender => SetupField::Opponent,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetupForm {
    pub focus: SetupField,
    pub opponent: String,
    pub initial_offense: Team,
    pub a_gender: Gender,
}

impl SetupForm {
    pub fn cycle(&mut self) {
        match self.focus {
            SetupField::Opponent => {}
            SetupField::InitialOffense => self.initial_offense = self.initial_offense.other(),
            SetupField::AGender => self.a_gender = self.a_gender.other(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwapPicker {
    pub outgoing: PlayerId,
    pub candidates: Vec<(Player, usize)>,
    pub selected: usize,
}

#[derive(Debug, Default)]
pub struct GameState {
    pub view: GameView,
    pub hub_selected: usize,
    pub setup: SetupForm,
    /// Suggested line for the current point while it waits for confirmation.
    pub draft: Option<LineDraft>,
    pub swap: Option<SwapPicker>,
    /// Point being looked at; `None` follows the current point.
    pub viewed_point: Option<u16>,
    /// Row within the displayed line.
    pub cursor: usize,
    pub goal: Option<PlayerId>,
    pub assist: Option<PlayerId>,
    /// Correcting goal/assist on an already scored point.
    pub editing: bool,
}

impl GameState {
    pub fn clear_selection(&mut self) {
        self.cursor = 0;
        self.goal = None;
        self.assist = None;
        self.editing = false;
        self.swap = None;
    }

    /// Leave the game screens, keeping nothing point-specific around.
    pub fn back_to_hub(&mut self) {
        self.view = GameView::Hub;
        self.draft = None;
        self.viewed_point = None;
        self.clear_selection();
    }
}

// ---------------------------------------------------------------------------
// Stats tab
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct StatsState {
    /// Index into `Tournament::stats_scopes`; 0 is tournament totals.
    pub scope: usize,
    pub query: StatsQuery,
    /// Column highlighted for the next sort selection.
    pub column_cursor: StatsColumn,
}

// ---------------------------------------------------------------------------
// Root state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub status: Option<StatusMessage>,
    pub confirm: Option<PendingConfirm>,
    pub tournament: Tournament,
    pub roster: RosterState,
    pub game: GameState,
    pub stats: StatsState,
}

impl AppState {
    pub fn new(tournament: Tournament) -> Self {
        Self {
            tournament,
            ..Self::default()
        }
    }

    /// Text input has focus: plain letters are typed, not commands.
    pub fn is_typing(&self) -> bool {
        let naming = self
            .roster
            .form
            .as_ref()
            .is_some_and(|f| f.focus == FormField::Name);
        let setup = self.game.view == GameView::Setup && self.game.setup.focus == SetupField::Opponent;
        let roster_form = self.active_tab == MenuItem::Roster && naming;
        let setup_form = self.active_tab == MenuItem::Game && setup;
        roster_form || setup_form
    }
}
