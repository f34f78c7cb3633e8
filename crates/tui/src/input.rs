//! Terminal input → viewer actions.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use roadview_core::{DragButton, ViewEvent};
use roadview_protocol::Point;

/// Pixels panned per arrow key press.
const KEY_PAN_PX: f64 = 20.0;
const DOUBLE_CLICK: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Quit,
    View(ViewEvent),
    ToggleCars,
    ToggleTrucks,
    ToggleBuses,
    Export,
    Reload,
}

/// Maps terminal cells of the map pane to virtual pixels.
#[derive(Debug, Clone, Copy)]
pub struct CellMapping {
    pub area: Rect,
    pub px_per_col: f64,
    pub px_per_row: f64,
}

impl CellMapping {
    pub fn to_px(&self, col: u16, row: u16) -> Option<Point> {
        let inside = col >= self.area.x
            && col < self.area.x + self.area.width
            && row >= self.area.y
            && row < self.area.y + self.area.height;
        inside.then(|| {
            Point::new(
                (f64::from(col - self.area.x) + 0.5) * self.px_per_col,
                (f64::from(row - self.area.y) + 0.5) * self.px_per_row,
            )
        })
    }
}

pub fn key_action(code: KeyCode, modifiers: KeyModifiers, center: Point) -> Option<Action> {
    let pan = |dx, dy| {
        Action::View(ViewEvent::Drag {
            button: DragButton::Primary,
            dx,
            dy,
        })
    };
    let wheel = |notches, modifier| {
        Action::View(ViewEvent::Wheel {
            notches,
            cursor: center,
            modifier,
        })
    };

    let action = match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
        KeyCode::Left => pan(-KEY_PAN_PX, 0.0),
        KeyCode::Right => pan(KEY_PAN_PX, 0.0),
        KeyCode::Up => pan(0.0, -KEY_PAN_PX),
        KeyCode::Down => pan(0.0, KEY_PAN_PX),
        KeyCode::Char('+') | KeyCode::Char('=') => wheel(-1.0, false),
        KeyCode::Char('-') => wheel(1.0, false),
        KeyCode::Char('[') => wheel(-1.0, true),
        KeyCode::Char(']') => wheel(1.0, true),
        KeyCode::Char('r') | KeyCode::Char('R') => Action::View(ViewEvent::Reset),
        KeyCode::Char('c') => Action::ToggleCars,
        KeyCode::Char('t') => Action::ToggleTrucks,
        KeyCode::Char('b') => Action::ToggleBuses,
        KeyCode::Char('e') => Action::Export,
        KeyCode::Char('o') => Action::Reload,
        _ => return None,
    };
    Some(action)
}

/// Tracks drags and double clicks across mouse events.
#[derive(Debug, Default)]
pub struct PointerState {
    drag: Option<(DragButton, Point)>,
    last_click: Option<(Instant, u16, u16)>,
}

impl PointerState {
    pub fn mouse_action(&mut self, event: MouseEvent, map: &CellMapping) -> Option<Action> {
        let pos = map.to_px(event.column, event.row);
        match event.kind {
            MouseEventKind::Down(button) => {
                let button = drag_button(button)?;
                let pos = pos?;
                self.drag = Some((button, pos));
                if button == DragButton::Primary {
                    let now = Instant::now();
                    let double = self.last_click.is_some_and(|(at, col, row)| {
                        now.duration_since(at) <= DOUBLE_CLICK && col == event.column && row == event.row
                    });
                    if double {
                        self.last_click = None;
                        return Some(Action::View(ViewEvent::Reset));
                    }
                    self.last_click = Some((now, event.column, event.row));
                }
                None
            }
            MouseEventKind::Drag(button) => {
                let button = drag_button(button)?;
                let pos = pos?;
                let (held, last) = self.drag?;
                if held != button {
                    return None;
                }
                self.drag = Some((button, pos));
                Some(Action::View(ViewEvent::Drag {
                    button,
                    dx: pos.x - last.x,
                    dy: pos.y - last.y,
                }))
            }
            MouseEventKind::Up(_) => {
                self.drag = None;
                None
            }
            MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
                let notches = if event.kind == MouseEventKind::ScrollUp { -1.0 } else { 1.0 };
                Some(Action::View(ViewEvent::Wheel {
                    notches,
                    cursor: pos?,
                    modifier: event.modifiers.contains(KeyModifiers::SHIFT),
                }))
            }
            _ => None,
        }
    }
}

fn drag_button(button: MouseButton) -> Option<DragButton> {
    match button {
        MouseButton::Left => Some(DragButton::Primary),
        MouseButton::Right => Some(DragButton::Secondary),
        MouseButton::Middle => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> CellMapping {
        CellMapping {
            area: Rect::new(0, 1, 80, 20),
            px_per_col: 4.0,
            px_per_row: 8.0,
        }
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn keys_map_to_view_events() {
        let center = Point::new(160.0, 80.0);
        assert_eq!(key_action(KeyCode::Char('q'), KeyModifiers::NONE, center), Some(Action::Quit));
        assert_eq!(
            key_action(KeyCode::Char('+'), KeyModifiers::NONE, center),
            Some(Action::View(ViewEvent::Wheel {
                notches: -1.0,
                cursor: center,
                modifier: false
            }))
        );
        assert_eq!(
            key_action(KeyCode::Char(']'), KeyModifiers::NONE, center),
            Some(Action::View(ViewEvent::Wheel {
                notches: 1.0,
                cursor: center,
                modifier: true
            }))
        );
        assert_eq!(
            key_action(KeyCode::Char('R'), KeyModifiers::SHIFT, center),
            Some(Action::View(ViewEvent::Reset))
        );
        assert_eq!(key_action(KeyCode::Char('z'), KeyModifiers::NONE, center), None);
    }

    #[test]
    fn drag_reports_pixel_deltas() {
        let map = mapping();
        let mut pointer = PointerState::default();
        assert_eq!(pointer.mouse_action(mouse(MouseEventKind::Down(MouseButton::Right), 10, 5), &map), None);
        let action = pointer.mouse_action(mouse(MouseEventKind::Drag(MouseButton::Right), 13, 6), &map);
        assert_eq!(
            action,
            Some(Action::View(ViewEvent::Drag {
                button: DragButton::Secondary,
                dx: 12.0,
                dy: 8.0
            }))
        );
    }

    #[test]
    fn double_click_resets() {
        let map = mapping();
        let mut pointer = PointerState::default();
        let down = mouse(MouseEventKind::Down(MouseButton::Left), 4, 4);
        assert_eq!(pointer.mouse_action(down, &map), None);
        pointer.mouse_action(mouse(MouseEventKind::Up(MouseButton::Left), 4, 4), &map);
        assert_eq!(pointer.mouse_action(down, &map), Some(Action::View(ViewEvent::Reset)));
    }

    #[test]
    fn scroll_outside_map_is_ignored() {
        let map = mapping();
        let mut pointer = PointerState::default();
        assert_eq!(pointer.mouse_action(mouse(MouseEventKind::ScrollUp, 90, 5), &map), None);
        let inside = pointer.mouse_action(mouse(MouseEventKind::ScrollUp, 0, 1), &map);
        assert_eq!(
            inside,
            Some(Action::View(ViewEvent::Wheel {
                notches: -1.0,
                cursor: Point::new(2.0, 4.0),
                modifier: false
            }))
        );
    }
}
