use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs, Wrap};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::state::app_state::{FormField, FormMode, GameView, SetupField, StatusKind};
use crate::state::storage::{ERROR_CHAR, SaveState};
use crate::ui::layout::{LayoutAreas, centered};
use ulti_engine::{Gender, Game, Outcome, Player, PlayerStats, PointState, StatsColumn, Team};

static TABS: &[&str; 3] = &["Roster", "Game", "Stats"];

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, save_state: SaveState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let drawn = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Roster => draw_roster(f, layout.main, app),
            MenuItem::Game => draw_game(f, layout.main, app),
            MenuItem::Stats => draw_stats(f, layout.main, app),
            MenuItem::Help => draw_help(f, layout.main),
        }

        if app.state.show_logs {
            draw_logs(f, layout.logs);
        }
        draw_status(f, layout.status, app);
        draw_confirm(f, f.area(), app);
        draw_save_indicator(f, f.area(), app, save_state);
    });
    if let Err(err) = drawn {
        log::error!("draw failed: {err}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Roster => 0,
        MenuItem::Game => 1,
        MenuItem::Stats => 2,
        MenuItem::Help => match app.state.previous_tab {
            MenuItem::Game => 1,
            MenuItem::Stats => 2,
            _ => 0,
        },
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

fn selected_style(selected: bool) -> Style {
    if selected {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn legend(f: &mut Frame, area: Rect, keys: &str) {
    f.render_widget(Paragraph::new(keys).style(dim()), area);
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

fn draw_roster(f: &mut Frame, area: Rect, app: &App) {
    let roster = &app.state.tournament.roster;
    let (mmp, fmp) = roster
        .players()
        .iter()
        .fold((0, 0), |(m, w), p| match p.gender {
            Gender::Mmp => (m + 1, w),
            Gender::Fmp => (m, w + 1),
        });
    let title = format!(" Roster ({} players: {mmp} MMP / {fmp} FMP) ", roster.len());
    let block = default_border(Color::White).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [header, key_legend, content] =
        Layout::vertical([Constraint::Length(1), Constraint::Length(1), Constraint::Fill(1)])
            .areas(inner);

    f.render_widget(
        Paragraph::new(format!("  {:<24} {:<6} {:<9} {}", "Name", "Gender", "Line", "Role"))
            .style(Style::default().add_modifier(Modifier::BOLD)),
        header,
    );
    legend(
        f,
        key_legend,
        "Keys: j/k=move  a=add  A=quick add  e=edit  d=delete  C=clear  L=reload saved",
    );

    if roster.is_empty() {
        f.render_widget(
            Paragraph::new("No players yet. Press a to add one.")
                .style(dim())
                .alignment(Alignment::Center),
            content,
        );
    } else {
        let visible = usize::from(content.height.max(1));
        let offset = app.state.roster.selected.saturating_sub(visible - 1);
        let lines: Vec<Line> = roster
            .players()
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible)
            .map(|(idx, p)| {
                let selected = idx == app.state.roster.selected;
                let marker = if selected { ">" } else { " " };
                Line::styled(
                    format!(
                        "{marker} {:<24} {:<6} {:<9} {}",
                        p.name,
                        p.gender.label(),
                        p.line.label(),
                        p.role.label()
                    ),
                    selected_style(selected),
                )
            })
            .collect();
        f.render_widget(Paragraph::new(lines), content);
    }

    draw_player_form(f, area, app);
}

fn draw_player_form(f: &mut Frame, area: Rect, app: &App) {
    let Some(form) = app.state.roster.form.as_ref() else {
        return;
    };

    let popup = centered(area, 60, 9);
    f.render_widget(Clear, popup);
    let block = default_border(Color::Yellow).title(form.title());
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let field = |label: &str, value: String, focus: FormField| {
        let focused = form.focus == focus;
        let cursor = if focused && focus == FormField::Name { "_" } else { "" };
        Line::from(vec![
            Span::styled(format!("{label:<8}"), Style::default().fg(Color::Yellow)),
            Span::styled(format!("{value}{cursor}"), selected_style(focused)),
        ])
    };

    let name_label = match form.mode {
        FormMode::QuickAdd => "Names",
        FormMode::Add | FormMode::Edit(_) => "Name",
    };
    let lines = vec![
        field(name_label, form.name.clone(), FormField::Name),
        field("Gender", form.gender.label().to_string(), FormField::Gender),
        field("Line", form.line.label().to_string(), FormField::Line),
        field("Role", form.role.label().to_string(), FormField::Role),
        Line::from(""),
        Line::styled("Tab=next field  ←/→=change  Enter=save  Esc=cancel", dim()),
    ];
    f.render_widget(Paragraph::new(lines), inner);
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

fn draw_game(f: &mut Frame, area: Rect, app: &App) {
    match &app.state.game.view {
        GameView::Hub => draw_game_hub(f, area, app),
        GameView::Setup => draw_game_setup(f, area, app),
        GameView::Live | GameView::Review(_) => draw_game_board(f, area, app),
    }
}

fn draw_game_hub(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Games ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [key_legend, content] =
        Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(inner);
    legend(f, key_legend, "Keys: j/k=move  Enter=open  n=new game  d=delete");

    let rows = app.hub_rows();
    if rows.is_empty() {
        f.render_widget(
            Paragraph::new("No games yet. Press n to start one.")
                .style(dim())
                .alignment(Alignment::Center),
            content,
        );
        return;
    }

    let lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .map(|(idx, game)| {
            let selected = idx == app.state.game.hub_selected;
            let marker = if selected { ">" } else { " " };
            let when = game.start_time.format("%b %d %H:%M");
            let text = if game.is_complete {
                format!("{marker} {when}  vs {:<20} {}", game.opponent_name, game.result_label())
            } else {
                format!(
                    "{marker} {when}  vs {:<20} LIVE {} - {}",
                    game.opponent_name, game.moonlight_score, game.opponent_score
                )
            };
            let style = match (selected, game.is_complete, game.won()) {
                (true, ..) => selected_style(true),
                (false, false, _) => Style::default().fg(Color::Yellow),
                (false, true, true) => Style::default().fg(Color::Green),
                (false, true, false) => Style::default().fg(Color::Red),
            };
            Line::styled(text, style)
        })
        .collect();
    f.render_widget(Paragraph::new(lines), content);
}

fn draw_game_setup(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::Yellow).title(" New Game ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let setup = &app.state.game.setup;
    let field = |label: &str, value: String, focus: SetupField| {
        let focused = setup.focus == focus;
        let cursor = if focused && focus == SetupField::Opponent { "_" } else { "" };
        Line::from(vec![
            Span::styled(format!("{label:<18}"), Style::default().fg(Color::Yellow)),
            Span::styled(format!("{value}{cursor}"), selected_style(focused)),
        ])
    };
    let receiving = match setup.initial_offense {
        Team::Moonlight => "Moonlight (we receive)",
        Team::Opponent => "Opponent (we pull)",
    };

    let lines = vec![
        field("Opponent", setup.opponent.clone(), SetupField::Opponent),
        field("Starts on offense", receiving.to_string(), SetupField::InitialOffense),
        field(
            "Point 1 majority",
            setup.a_gender.label().to_string(),
            SetupField::AGender,
        ),
        Line::from(""),
        Line::styled("Tab=next field  ←/→=change  Enter=start  Esc=cancel", dim()),
    ];
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_game_board(f: &mut Frame, area: Rect, app: &App) {
    let Some(game) = app.displayed_game() else {
        f.render_widget(
            Paragraph::new("Game not found.").block(default_border(Color::White)),
            area,
        );
        return;
    };

    let live = app.state.game.view == GameView::Live;
    let title = if live {
        format!(" vs {} ", game.opponent_name)
    } else {
        format!(" vs {} (review) ", game.opponent_name)
    };
    let block = default_border(if live { Color::Green } else { Color::White }).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [scoreboard, point_info, key_legend, body] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Fill(1),
    ])
    .areas(inner);

    f.render_widget(Paragraph::new(scoreboard_line(game)), scoreboard);
    f.render_widget(Paragraph::new(point_lines(app, game)), point_info);
    legend(
        f,
        key_legend,
        if live {
            "Keys: j/k=move  h/l=points  s=swap  Enter=confirm/score  g=goal  a=assist  o=they scored  t=halftime  e=edit  E=end  Esc=back"
        } else {
            "Keys: j/k=move  h/l=points  e=edit  g=goal  a=assist  Enter=save  Esc=back"
        },
    );

    if let Some(swap) = app.state.game.swap.as_ref() {
        let [line_area, swap_area] =
            Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
                .areas(body);
        draw_line(f, line_area, app, game);

        let block = default_border(Color::Yellow).title(" Swap in ");
        let inner = block.inner(swap_area);
        f.render_widget(block, swap_area);
        let lines: Vec<Line> = if swap.candidates.is_empty() {
            vec![Line::styled("No bench players of that gender.", dim())]
        } else {
            swap.candidates
                .iter()
                .enumerate()
                .map(|(idx, (player, played))| {
                    let selected = idx == swap.selected;
                    Line::styled(
                        format!("{} {} ({played} pts)", if selected { ">" } else { " " }, player.name),
                        selected_style(selected),
                    )
                })
                .collect()
        };
        f.render_widget(Paragraph::new(lines), inner);
    } else {
        draw_line(f, body, app, game);
    }
}

fn scoreboard_line(game: &Game) -> Line<'static> {
    let mut spans = vec![
        Span::styled("Moonlight ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("{} - {}", game.moonlight_score, game.opponent_score),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {}", game.opponent_name),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];
    if game.is_halftime {
        spans.push(Span::styled("  [2nd half]", Style::default().fg(Color::Magenta)));
    } else if game.halftime_armed {
        spans.push(Span::styled("  [halftime after this point]", Style::default().fg(Color::Magenta)));
    }
    if let Some(reason) = &game.end_reason {
        spans.push(Span::styled(format!("  FINAL: {reason}"), dim()));
    }
    Line::from(spans)
}

fn point_lines(app: &App, game: &Game) -> Vec<Line<'static>> {
    let Some(point) = app.displayed_point() else {
        return vec![Line::styled("No points played.", dim())];
    };
    let abba = game.abba(point.number);
    let state = match point.state() {
        PointState::Scored => match point.outcome {
            Outcome::MoonlightScore => Span::styled("Moonlight scored", Style::default().fg(Color::Green)),
            _ => Span::styled("Opponent scored", Style::default().fg(Color::Red)),
        },
        PointState::InProgress => Span::styled("In progress", Style::default().fg(Color::Yellow)),
        PointState::LinePending => Span::styled("Pick a line", Style::default().fg(Color::Yellow)),
    };

    let mut lines = vec![Line::from(vec![
        Span::raw(format!(
            "Point {}/{}  {}  {}  ",
            point.number,
            game.points.len(),
            abba.label(),
            point.starting_side.label()
        )),
        state,
    ])];

    let note = if app.state.game.editing {
        Some(Line::styled("Editing: mark goal and assist, Enter to save.", Style::default().fg(Color::Yellow)))
    } else if point.state() == PointState::LinePending {
        app.state.game.draft.as_ref().and_then(|d| d.issue()).map(|issue| {
            let color = if issue.is_fatal() { Color::Red } else { Color::Yellow };
            Line::styled(issue.to_string(), Style::default().fg(color))
        })
    } else {
        None
    };
    lines.push(note.unwrap_or_else(|| Line::styled(format!("Needs {}", abba.quota), dim())));
    lines
}

fn draw_line(f: &mut Frame, area: Rect, app: &App, game: &Game) {
    let block = default_border(Color::DarkGray).title(" Line ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let line = app.displayed_line();
    if line.is_empty() {
        f.render_widget(Paragraph::new("No line.").style(dim()), inner);
        return;
    }

    let point = app.displayed_point();
    let goal = app
        .state
        .game
        .goal
        .as_ref()
        .or_else(|| point.and_then(|p| p.goal.as_ref()).filter(|_| !app.state.game.editing));
    let assist = app
        .state
        .game
        .assist
        .as_ref()
        .or_else(|| point.and_then(|p| p.assist.as_ref()).filter(|_| !app.state.game.editing));

    let lines: Vec<Line> = line
        .iter()
        .enumerate()
        .map(|(idx, player)| {
            let selected = idx == app.state.game.cursor;
            let marker = if selected { ">" } else { " " };
            let tag = if goal == Some(&player.id) {
                " [G]"
            } else if assist == Some(&player.id) {
                " [A]"
            } else {
                ""
            };
            Line::from(vec![
                Span::styled(
                    format!("{marker} {:<22}", player.name),
                    selected_style(selected),
                ),
                Span::styled(player_tags(player, game), dim()),
                Span::styled(tag, Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn player_tags(player: &Player, game: &Game) -> String {
    format!(
        " {:<4} {:<8} {} pts",
        player.gender.label(),
        player.role.label(),
        game.play_count(&player.id)
    )
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

fn stats_cell(column: StatsColumn, row: &PlayerStats) -> String {
    match column {
        StatsColumn::Name => format!("{:<22}", row.player.name),
        StatsColumn::PointsPlayed => format!("{:>8}", row.points_played),
        StatsColumn::Goals => format!("{:>8}", row.goals),
        StatsColumn::Assists => format!("{:>8}", row.assists),
        StatsColumn::HoldPct => format!("{:>8}", format!("{:.0}%", row.hold_pct())),
        StatsColumn::BreakPct => format!("{:>8}", format!("{:.0}%", row.break_pct())),
    }
}

fn draw_stats(f: &mut Frame, area: Rect, app: &App) {
    let scope = app.stats_scope();
    let title = format!(" Stats: {} ", app.state.tournament.scope_label(&scope));
    let block = default_border(Color::White).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [filters, key_legend, header, content] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Fill(1),
    ])
    .areas(inner);

    let query = &app.state.stats.query;
    f.render_widget(
        Paragraph::new(format!(
            "Gender: {}   Role: {}",
            query.filter.gender_label(),
            query.filter.role_label()
        )),
        filters,
    );
    legend(
        f,
        key_legend,
        "Keys: v=view  g=gender  r=role  h/l=column  Enter=sort",
    );

    let header_spans: Vec<Span> = StatsColumn::ALL
        .iter()
        .map(|&column| {
            let arrow = if column == query.sort.column { query.sort.direction.arrow() } else { " " };
            let label = match column {
                StatsColumn::Name => format!("{:<21}{arrow}", column.label()),
                _ => format!("{:>7}{arrow}", column.label()),
            };
            let mut style = Style::default().add_modifier(Modifier::BOLD);
            if column == app.state.stats.column_cursor {
                style = style.fg(Color::Cyan).add_modifier(Modifier::UNDERLINED);
            }
            Span::styled(format!("{label} "), style)
        })
        .collect();
    f.render_widget(Paragraph::new(Line::from(header_spans)), header);

    let rows = match app.stats_rows() {
        Ok(rows) => rows,
        Err(err) => {
            f.render_widget(Paragraph::new(err.to_string()).style(Style::default().fg(Color::Red)), content);
            return;
        }
    };
    if rows.is_empty() {
        f.render_widget(
            Paragraph::new("No players match.").style(dim()).alignment(Alignment::Center),
            content,
        );
        return;
    }

    let lines: Vec<Line> = rows
        .iter()
        .map(|row| {
            let cells: Vec<String> = StatsColumn::ALL.iter().map(|&c| stats_cell(c, row)).collect();
            Line::from(cells.join(" "))
        })
        .collect();
    f.render_widget(Paragraph::new(lines), content);
}

// ---------------------------------------------------------------------------
// Help, logs and overlays
// ---------------------------------------------------------------------------

fn draw_help(f: &mut Frame, area: Rect) {
    let block = default_border(Color::White).title(" Help ");
    let heading = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::styled("Global", heading),
        Line::from("  1/2/3  switch tab    ?  help    f  full screen    \"  logs    q  quit"),
        Line::from(""),
        Line::styled("Roster", heading),
        Line::from("  a  add player    A  quick add (comma separated)    e  edit    d  delete"),
        Line::from("  C  clear roster    L  reload last saved roster"),
        Line::from(""),
        Line::styled("Game", heading),
        Line::from("  n  new game    Enter  open / confirm line / record our score"),
        Line::from("  s  swap the selected player    g/a  mark goal / assist"),
        Line::from("  o  opponent scored    t  halftime after this point    E  end game"),
        Line::from("  h/l  step through points    e  edit goal and assist of a scored point"),
        Line::from(""),
        Line::styled("Stats", heading),
        Line::from("  v  tournament / single game    g  gender filter    r  role filter"),
        Line::from("  h/l  pick column    Enter  sort (again to flip direction)"),
        Line::from(""),
        Line::styled("Esc  back", dim()),
    ];
    f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let widget = TuiLoggerWidget::default().block(default_border(Color::DarkGray).title(" Logs "));
    f.render_widget(widget, area);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let Some(status) = app.state.status.as_ref() else {
        return;
    };
    let color = match status.kind {
        StatusKind::Info => Color::Green,
        StatusKind::Warning => Color::Yellow,
        StatusKind::Error => Color::Red,
    };
    f.render_widget(
        Paragraph::new(format!(" {}", status.text)).style(Style::default().fg(color)),
        area,
    );
}

fn draw_confirm(f: &mut Frame, area: Rect, app: &App) {
    let Some(confirm) = app.state.confirm.as_ref() else {
        return;
    };
    let popup = centered(area, 50, 6);
    f.render_widget(Clear, popup);
    let lines = vec![
        Line::from(confirm.prompt()),
        Line::from(""),
        Line::styled("y=yes  n=no", dim()),
    ];
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(default_border(Color::Yellow).title(" Confirm ")),
        popup,
    );
}

fn draw_save_indicator(f: &mut Frame, area: Rect, app: &App, save_state: SaveState) {
    if !save_state.is_saving && save_state.indicator != ERROR_CHAR {
        return;
    }
    let style = match save_state.indicator {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let indicator = Paragraph::new(save_state.indicator.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(indicator, area);
}
