mod helpers;
mod ui;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::io;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::unlock::AccountUnlock;
use crate::wallet::WalletError;

const FRAME_INTERVAL: Duration = Duration::from_millis(80);

/// Terminal front end for the unlock card.
pub struct UnlockApp {
    pub card: AccountUnlock,
    pub should_quit: bool,
    pub status_message: Option<String>,
    pub needs_clear: bool,
    // Animation state
    pub animation_frame: u8,
    pub last_animation_update: Instant,
    runtime: Handle,
    in_flight: Option<oneshot::Receiver<Result<bool, WalletError>>>,
}

impl UnlockApp {
    pub fn new(card: AccountUnlock, runtime: Handle) -> Self {
        Self {
            card,
            should_quit: false,
            status_message: None,
            needs_clear: false,
            animation_frame: 0,
            last_animation_update: Instant::now(),
            runtime,
            in_flight: None,
        }
    }

    /// Take over the terminal until the user quits.
    ///
    /// Blocks on terminal input, so call it from a blocking context
    /// (e.g. `spawn_blocking`) while `runtime` drives the unlock calls.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        info!(account = %self.card.account().name, "unlock screen started");
        let res = self.run_app(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        info!("unlock screen closed");
        res
    }

    fn run_app<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            if self.last_animation_update.elapsed() >= FRAME_INTERVAL {
                self.animation_frame = self.animation_frame.wrapping_add(1);
                self.last_animation_update = Instant::now();
            }

            self.poll_unlock();

            if self.needs_clear {
                terminal.clear()?;
                self.needs_clear = false;
            }

            terminal.draw(|f| self.ui(f))?;

            // Poll with a timeout so the spinner keeps moving without input
            if !event::poll(FRAME_INTERVAL)? {
                continue;
            }

            match event::read()? {
                // Windows reports both press and release; act on press only
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    self.handle_key_event(key.code, key.modifiers);
                }
                Event::Resize(w, h) => {
                    debug!(w, h, "terminal resized");
                    self.needs_clear = true;
                }
                _ => {}
            }

            if self.should_quit {
                return Ok(());
            }
        }
    }

    pub fn handle_key_event(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            match code {
                KeyCode::Char('c') => self.should_quit = true,
                KeyCode::Char('u') => self.card.form_mut().clear_password(),
                KeyCode::Char('y') => self.copy_address_to_clipboard(),
                _ => {}
            }
            return;
        }

        match code {
            KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Enter => {
                self.submit();
            }
            KeyCode::Backspace => {
                self.card.form_mut().pop_char();
            }
            KeyCode::Char(c) => {
                self.card.form_mut().push_char(c);
            }
            _ => {}
        }
    }

    /// Start an unlock if the card allows it. The call runs on the runtime
    /// and its answer is picked up by `poll_unlock`.
    pub fn submit(&mut self) {
        if !self.card.can_submit() {
            return;
        }

        let pending = match self.card.begin_submit() {
            Ok(pending) => pending,
            Err(e) => {
                self.status_message = Some(e.to_string());
                return;
            }
        };

        let (tx, rx) = oneshot::channel();
        self.runtime.spawn(async move {
            let _ = tx.send(pending.run().await);
        });
        self.in_flight = Some(rx);
        self.status_message = None;
    }

    /// Apply the unlock answer once it has arrived. Returns true when a
    /// submission finished during this call.
    pub fn poll_unlock(&mut self) -> bool {
        let Some(rx) = self.in_flight.as_mut() else {
            return false;
        };

        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return false,
            Err(oneshot::error::TryRecvError::Closed) => {
                warn!("unlock task dropped its result");
                Err(WalletError::Interrupted)
            }
        };

        self.in_flight = None;
        self.card.finish_submit(result);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Account, FixedAccount};
    use crate::theme::Theme;
    use ratatui::style::Color;
    use crate::wallet::WalletState;
    use async_trait::async_trait;
    use std::sync::Arc;

    pub(super) const ADDR: &str = "Z20d20b8026b8f02540246f58120ddaaf35aecd9b";

    /// Accepts exactly one password.
    pub(super) struct PasswordWallet(pub &'static str);

    #[async_trait]
    impl WalletState for PasswordWallet {
        async fn unlock_account(&self, _address: &str, password: &str) -> Result<bool, WalletError> {
            Ok(password == self.0)
        }
    }

    pub(super) fn app() -> UnlockApp {
        let accounts = FixedAccount(Account::new("main", ADDR));
        let card = AccountUnlock::new(&accounts, Arc::new(PasswordWallet("letmein"))).unwrap();
        UnlockApp::new(card, Handle::current())
    }

    fn type_text(app: &mut UnlockApp, text: &str) {
        for c in text.chars() {
            app.handle_key_event(KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    async fn wait_for_answer(app: &mut UnlockApp) {
        for _ in 0..200 {
            if app.poll_unlock() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("unlock never finished");
    }

    #[tokio::test]
    async fn enter_with_empty_password_does_nothing() {
        let mut app = app();
        app.handle_key_event(KeyCode::Enter, KeyModifiers::NONE);

        assert!(!app.card.form().is_submitting());
        assert!(!app.poll_unlock());
    }

    #[tokio::test]
    async fn typing_and_enter_runs_an_unlock() {
        let mut app = app();
        type_text(&mut app, "letmein");
        app.handle_key_event(KeyCode::Enter, KeyModifiers::NONE);
        assert!(app.card.form().is_submitting());

        // Keys are swallowed while the call is in flight
        type_text(&mut app, "zz");
        assert_eq!(app.card.form().password(), "letmein");

        wait_for_answer(&mut app).await;
        assert!(!app.card.form().is_submitting());
        assert_eq!(app.card.form().message(), Some("The entered password is correct"));
    }

    #[tokio::test]
    async fn wrong_password_then_retry() {
        let mut app = app();
        type_text(&mut app, "nope");
        app.handle_key_event(KeyCode::Enter, KeyModifiers::NONE);
        wait_for_answer(&mut app).await;
        assert_eq!(app.card.form().message(), Some("The entered password is incorrect"));

        app.handle_key_event(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert_eq!(app.card.form().password(), "");
        type_text(&mut app, "letmein");
        app.handle_key_event(KeyCode::Enter, KeyModifiers::NONE);
        wait_for_answer(&mut app).await;
        assert_eq!(app.card.form().message(), Some("The entered password is correct"));
    }

    #[tokio::test]
    async fn quitting_mid_retry_leaves_no_outcome() {
        let mut app = app();
        type_text(&mut app, "nope");
        app.handle_key_event(KeyCode::Enter, KeyModifiers::NONE);
        wait_for_answer(&mut app).await;
        assert!(app.card.last_outcome().is_some());

        app.handle_key_event(KeyCode::Enter, KeyModifiers::NONE);
        app.handle_key_event(KeyCode::Esc, KeyModifiers::NONE);

        assert!(app.should_quit);
        assert!(app.card.last_outcome().is_none());
        assert_eq!(app.card.form().message(), None);
    }

    #[tokio::test]
    async fn footer_glows_only_while_submitting() {
        let mut app = app();
        assert_eq!(app.footer_glow(), Theme::inactive_border());

        type_text(&mut app, "letmein");
        app.handle_key_event(KeyCode::Enter, KeyModifiers::NONE);
        app.animation_frame = 0;
        let dim = app.footer_glow();
        app.animation_frame = 9;
        assert_eq!(app.footer_glow(), Color::Rgb(0, 127, 255));
        assert_ne!(dim, app.footer_glow());
    }

    #[tokio::test]
    async fn backspace_and_quit_keys() {
        let mut app = app();
        type_text(&mut app, "ab");
        app.handle_key_event(KeyCode::Backspace, KeyModifiers::NONE);
        assert_eq!(app.card.form().password(), "a");

        app.handle_key_event(KeyCode::Esc, KeyModifiers::NONE);
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn dropped_task_counts_as_failure() {
        let mut app = app();
        type_text(&mut app, "letmein");
        let _pending = app.card.begin_submit().unwrap();

        let (tx, rx) = oneshot::channel::<Result<bool, WalletError>>();
        drop(tx);
        app.in_flight = Some(rx);

        assert!(app.poll_unlock());
        let message = app.card.form().message().unwrap();
        assert!(message.contains("stopped before the node answered"));
        assert!(!app.card.form().is_submitting());
    }
}
