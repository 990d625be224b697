// Keyboard focus routing over the set table cells
use serde::{Deserialize, Serialize};

/// Editable columns per set row, in focus order.
pub const COLUMNS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetColumn {
    Reps,
    Weight,
    Rir,
    Duration,
}

impl SetColumn {
    pub fn index(self) -> usize {
        match self {
            SetColumn::Reps => 0,
            SetColumn::Weight => 1,
            SetColumn::Rir => 2,
            SetColumn::Duration => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(SetColumn::Reps),
            1 => Some(SetColumn::Weight),
            2 => Some(SetColumn::Rir),
            3 => Some(SetColumn::Duration),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavKey {
    Left,
    Right,
    Up,
    Down,
    Enter,
}

/// Focused cell within one exercise's set table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellFocus {
    pub row: usize,
    pub col: usize,
}

impl CellFocus {
    pub fn new(row: usize, column: SetColumn) -> Self {
        Self {
            row,
            col: column.index(),
        }
    }

    pub fn column(self) -> Option<SetColumn> {
        SetColumn::from_index(self.col)
    }

    pub fn tab_index(self) -> usize {
        self.row * COLUMNS + self.col
    }

    pub fn from_tab_index(index: usize) -> Self {
        Self {
            row: index / COLUMNS,
            col: index % COLUMNS,
        }
    }
}

/// Next focused cell after `key` in a table of `rows` sets.
///
/// Horizontal movement wraps within the row. Vertical movement keeps the
/// column and stops at the first and last row.
pub fn navigate(focus: CellFocus, key: NavKey, rows: usize) -> CellFocus {
    if rows == 0 {
        return focus;
    }
    let row = focus.row.min(rows - 1);
    let col = focus.col % COLUMNS;
    match key {
        NavKey::Right | NavKey::Enter => CellFocus {
            row,
            col: (col + 1) % COLUMNS,
        },
        NavKey::Left => CellFocus {
            row,
            col: (col + COLUMNS - 1) % COLUMNS,
        },
        NavKey::Up => CellFocus {
            row: row.saturating_sub(1),
            col,
        },
        NavKey::Down => CellFocus {
            row: (row + 1).min(rows - 1),
            col,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_on_last_column_wraps_within_row() {
        let focus = CellFocus::new(1, SetColumn::Duration);
        let next = navigate(focus, NavKey::Enter, 3);
        assert_eq!(next, CellFocus::new(1, SetColumn::Reps));
        assert_eq!(navigate(focus, NavKey::Right, 3), next);
    }

    #[test]
    fn left_wraps_backwards() {
        let focus = CellFocus::new(0, SetColumn::Reps);
        assert_eq!(
            navigate(focus, NavKey::Left, 3),
            CellFocus::new(0, SetColumn::Duration)
        );
    }

    #[test]
    fn vertical_moves_clamp() {
        let top = CellFocus::new(0, SetColumn::Weight);
        assert_eq!(navigate(top, NavKey::Up, 3), top);
        let down = navigate(top, NavKey::Down, 3);
        assert_eq!(down, CellFocus::new(1, SetColumn::Weight));
        let bottom = CellFocus::new(2, SetColumn::Weight);
        assert_eq!(navigate(bottom, NavKey::Down, 3), bottom);
    }

    #[test]
    fn tab_index_round_trip() {
        let focus = CellFocus::new(2, SetColumn::Rir);
        assert_eq!(focus.tab_index(), 10);
        assert_eq!(CellFocus::from_tab_index(10), focus);
        assert_eq!(focus.column(), Some(SetColumn::Rir));
    }

    #[test]
    fn empty_table_keeps_focus() {
        let focus = CellFocus::default();
        assert_eq!(navigate(focus, NavKey::Down, 0), focus);
    }
}
