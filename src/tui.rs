use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

use crate::fmt::money;
use crate::table::AmountTone;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const INCOME_STYLE: Style = Style::new().fg(Color::Rgb(0x51, 0xcf, 0x66));
pub const EXPENSE_STYLE: Style = Style::new().fg(Color::Rgb(0xff, 0x6b, 0x6b));
pub const UNKNOWN_STYLE: Style = Style::new()
    .fg(Color::Magenta)
    .add_modifier(Modifier::ITALIC);

pub const ERROR_STYLE: Style = Style::new().fg(Color::Red);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub fn tone_style(tone: AmountTone) -> Style {
    match tone {
        AmountTone::Income => INCOME_STYLE,
        AmountTone::Expense => EXPENSE_STYLE,
        AmountTone::Unknown => UNKNOWN_STYLE,
    }
}

/// Format an amount as a colored Span (green for income, red for expense).
pub fn money_span(amount: f64, sign: &str) -> Span<'static> {
    let style = if amount < 0.0 { EXPENSE_STYLE } else { INCOME_STYLE };
    Span::styled(money(amount, sign), style)
}
