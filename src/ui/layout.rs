use tui::layout::{Constraint, Layout, Rect, Size};
pub const TAB_BAR_HEIGHT: u16 = 3;
pub const STATUS_HEIGHT: u16 = 1;
pub const LOG_HEIGHT: u16 = 8;

/// Pre-computed layout areas for the main draw loop.
pub struct LayoutAreas {
    pub tab_bar: [Rect; 2],
    pub main: Rect,
    pub logs: Rect,
    pub status: Rect,
}

impl LayoutAreas {
    pub fn new(size: Size) -> Self {
        let rect = Rect::new(0, 0, size.width, size.height);
        Self::from_rect(rect, false, false)
    }

    pub fn update(&mut self, area: Rect, full_screen: bool, show_logs: bool) {
        *self = Self::from_rect(area, full_screen, show_logs);
    }

    fn from_rect(area: Rect, full_screen: bool, show_logs: bool) -> Self {
        let tab_height = if full_screen { 0 } else { TAB_BAR_HEIGHT };
        let log_height = if show_logs { LOG_HEIGHT } else { 0 };

        let [tab, main, logs, status] = Layout::vertical([
            Constraint::Length(tab_height),
            Constraint::Fill(1),
            Constraint::Length(log_height),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .areas(area);

        LayoutAreas {
            tab_bar: if full_screen { [Rect::ZERO, Rect::ZERO] } else { Self::split_tab_bar(tab) },
            main,
            logs,
            status,
        }
    }

    fn split_tab_bar(area: Rect) -> [Rect; 2] {
        Layout::horizontal([Constraint::Percentage(85), Constraint::Percentage(15)]).areas(area)
    }
}

/// A `percent_x` by `height` box centred in `area`, for popups.
pub fn centered(area: Rect, percent_x: u16, height: u16) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .areas(area);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x.min(100)) / 2),
        Constraint::Percentage(percent_x.min(100)),
        Constraint::Fill(1),
    ])
    .areas(middle);
    center
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_screen_hides_tabs() {
        let mut layout = LayoutAreas::new(Size::new(100, 40));
        assert_eq!(layout.tab_bar[0].height, TAB_BAR_HEIGHT);
        layout.update(Rect::new(0, 0, 100, 40), true, false);
        assert_eq!(layout.tab_bar[0], Rect::ZERO);
        assert_eq!(layout.main.height, 40 - STATUS_HEIGHT);
    }

    #[test]
    fn test_logs_take_room_from_main() {
        let mut layout = LayoutAreas::new(Size::new(100, 40));
        layout.update(Rect::new(0, 0, 100, 40), false, true);
        assert_eq!(layout.logs.height, LOG_HEIGHT);
        assert_eq!(layout.main.height, 40 - TAB_BAR_HEIGHT - LOG_HEIGHT - STATUS_HEIGHT);
        assert_eq!(layout.status.y, 39);
    }

    #[test]
    fn test_centered_popup_fits() {
        let area = Rect::new(0, 0, 100, 30);
        let popup = centered(area, 60, 10);
        assert_eq!(popup.height, 10);
        assert_eq!(popup.width, 60);
        assert!(popup.x >= 19 && popup.x <= 21);
    }
}
