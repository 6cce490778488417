use ratatui::{
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

use super::UnlockApp;
use crate::icons::Icons;
use crate::theme::Theme;
use crate::unlock::{SubmitIcon, UnlockOutcome, PASSWORD_DESCRIPTION, PASSWORD_PLACEHOLDER};

const CARD_WIDTH: u16 = 64;
const CARD_HEIGHT: u16 = 17;

/// Fixed-size rectangle centred in `r`, clamped to the available space
fn centered_card(width: u16, height: u16, r: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(r.height))])
        .flex(Flex::Center)
        .areas(r);
    let [card] = Layout::horizontal([Constraint::Length(width.min(r.width))])
        .flex(Flex::Center)
        .areas(row);
    card
}

impl UnlockApp {
    pub fn ui(&self, f: &mut Frame) {
        let size = f.area();
        f.render_widget(Block::default().style(Style::default().bg(Theme::BASE)), size);

        let [body, footer] = Layout::vertical([Constraint::Min(CARD_HEIGHT), Constraint::Length(3)])
            .areas(size);

        self.render_card(f, centered_card(CARD_WIDTH, CARD_HEIGHT, body));
        self.render_footer(f, footer);
    }

    fn render_card(&self, f: &mut Frame, area: Rect) {
        let card = &self.card;
        let border = if card.input_enabled() {
            Theme::active_border()
        } else {
            Theme::inactive_border()
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border).add_modifier(Modifier::BOLD))
            .title(format!(" {} ", card.title()))
            .title_style(Style::default().fg(Theme::CYAN_NEON).add_modifier(Modifier::BOLD))
            .style(Style::default().bg(Theme::glass_panel()));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let [address, _, input, description, message, _, button] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .horizontal_margin(1)
        .areas(inner);

        // Full address under the heading
        let address_line = Paragraph::new(Line::from(vec![
            Span::styled(format!("{} ", Icons::ACCOUNT), Style::default().fg(Theme::PURPLE)),
            Span::styled(card.description(), Style::default().fg(Theme::SUBTEXT1)),
        ]))
        .wrap(Wrap { trim: false });
        f.render_widget(address_line, address);

        self.render_password_input(f, input);

        f.render_widget(
            Paragraph::new(PASSWORD_DESCRIPTION)
                .style(Style::default().fg(Theme::SUBTEXT0).add_modifier(Modifier::ITALIC)),
            description,
        );

        if let Some(text) = card.form().message() {
            let color = match card.last_outcome() {
                Some(UnlockOutcome::Unlocked) => Theme::success(),
                _ => Theme::error(),
            };
            f.render_widget(
                Paragraph::new(text)
                    .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
                    .wrap(Wrap { trim: true }),
                message,
            );
        }

        self.render_submit_button(f, button);
    }

    fn render_password_input(&self, f: &mut Frame, area: Rect) {
        let form = self.card.form();
        let enabled = self.card.input_enabled();

        let content = if form.password().is_empty() {
            Span::styled(PASSWORD_PLACEHOLDER, Style::default().fg(Theme::OVERLAY1))
        } else {
            let masked: String = form.password().chars().map(|_| Icons::MASK).collect();
            let fg = if enabled { Theme::selection() } else { Theme::DIM };
            Span::styled(masked, Style::default().fg(fg).add_modifier(Modifier::BOLD))
        };

        let mut spans = vec![content];
        if enabled {
            spans.push(Span::styled("▏", Style::default().fg(Theme::selection())));
        }

        let input = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Plain)
                .border_style(Style::default().fg(if enabled {
                    Theme::BORDER_GLOW
                } else {
                    Theme::BORDER_DIM
                }))
                .style(Style::default().bg(Theme::glass_elevated())),
        );
        f.render_widget(input, area);
    }

    fn render_submit_button(&self, f: &mut Frame, area: Rect) {
        let card = &self.card;
        let icon = match card.submit_icon() {
            SubmitIcon::Unlock => Icons::UNLOCK,
            SubmitIcon::Loading => self.spinner_frame(),
        };

        let (fg, bg) = if card.can_submit() {
            (Theme::BASE, Theme::CYAN_NEON)
        } else {
            (Theme::OVERLAY1, Theme::glass_elevated())
        };

        let button = Paragraph::new(Line::from(vec![
            Span::styled(format!("{} ", icon), Style::default().fg(fg).add_modifier(Modifier::BOLD)),
            Span::styled(card.submit_label(), Style::default().fg(fg).add_modifier(Modifier::BOLD)),
        ]))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Thick)
                .border_style(Style::default().fg(bg)),
        )
        .style(Style::default().bg(bg));
        f.render_widget(button, area);
    }

    fn render_footer(&self, f: &mut Frame, area: Rect) {
        let line = if let Some(msg) = &self.status_message {
            Line::from(Span::styled(msg.as_str(), Style::default().fg(Theme::CYAN_NEON)))
        } else {
            Line::from(vec![
                Span::styled(" Enter ", Style::default().fg(Theme::BASE).bg(Theme::CYAN_NEON).add_modifier(Modifier::BOLD)),
                Span::styled(" Unlock  ", Style::default().fg(Theme::SUBTEXT1)),
                Span::styled(" Ctrl+U ", Style::default().fg(Theme::TEXT).bg(Theme::PURPLE).add_modifier(Modifier::BOLD)),
                Span::styled(" Clear  ", Style::default().fg(Theme::SUBTEXT1)),
                Span::styled(" Ctrl+Y ", Style::default().fg(Theme::BASE).bg(Theme::YELLOW_NEON).add_modifier(Modifier::BOLD)),
                Span::styled(" Copy address  ", Style::default().fg(Theme::SUBTEXT1)),
                Span::styled(" Esc ", Style::default().fg(Theme::TEXT).bg(Theme::RED_NEON).add_modifier(Modifier::BOLD)),
                Span::styled(" Quit", Style::default().fg(Theme::SUBTEXT1)),
            ])
        };

        let footer = Paragraph::new(line)
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(self.footer_glow()))
                    .title(format!(" {} CONTROLS ", Icons::KEYBOARD))
                    .title_style(Style::default().fg(Theme::CYAN_NEON).add_modifier(Modifier::BOLD)),
            )
            .style(Style::default().bg(Theme::PANEL_BG));
        f.render_widget(footer, area);
    }
}
