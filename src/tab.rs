// src/tab.rs
//! One page load: the state, document and controller of a single browser tab.
//!
//! A `Tab` is driven from outside. [`Tab::dispatch`] runs one user action to
//! completion; [`Tab::pump`] is one turn of the event loop (settings events,
//! storage notifications from other tabs, finished file reads, a due reload);
//! [`Tab::advance`] moves the tab's clock.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::{debug, error, info, trace, warn};

use crate::broadcast::{apply_settings, update_theme_icon, AppEvent};
use crate::document::{Dialog, Document};
use crate::model::Settings;
use crate::pages::{Action, FileRead, Page, PageContext, PageError, PageId};
use crate::state::{read_json, AppState};
use crate::store::{PROFILE_IMAGE_KEY, SETTINGS_KEY};
use crate::sync::{SharedStore, StorageEvent};

/// Wait before the single retry of a failed page load.
pub const INIT_RETRY_DELAY: Duration = Duration::from_millis(100);
/// Where a click on the profile avatar leads.
pub const PROFILE_LOCATION: &str = "settings.html#profile";

pub struct Tab {
    page: Box<dyn Page>,
    state: AppState,
    document: Document,
    dialog: Box<dyn Dialog>,
    events: VecDeque<AppEvent>,
    reads: VecDeque<FileRead>,
    reload_at: Option<Duration>,
    clock: Duration,
}

/// Builds a `PageContext` from the tab's fields and hands it, with the page,
/// to `$body`.
macro_rules! with_page {
    ($tab:expr, |$page:ident, $ctx:ident| $body:expr) => {{
        let tab = &mut *$tab;
        let mut context = PageContext {
            state: &mut tab.state,
            document: &mut tab.document,
            dialog: tab.dialog.as_mut(),
            events: &mut tab.events,
            reads: &mut tab.reads,
            reload_at: &mut tab.reload_at,
            now: tab.clock,
        };
        let $page: &mut dyn Page = tab.page.as_mut();
        let $ctx: &mut PageContext<'_> = &mut context;
        $body
    }};
}

impl Tab {
    /// Loads the page at `path` against the shared store.
    ///
    /// A failed load is retried once after [`INIT_RETRY_DELAY`]; the second
    /// failure is returned.
    /// # Errors
    /// Returns `PageError::Store` when the stored data cannot be read twice in a row.
    pub fn open(shared: &SharedStore, path: &str, dialog: Box<dyn Dialog>) -> Result<Self, PageError> {
        let mut clock = Duration::ZERO;
        let state = match AppState::load(shared.attach()) {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "failed to initialize application, retrying");
                clock += INIT_RETRY_DELAY;
                AppState::load(shared.attach()).map_err(|e| {
                    error!(error = %e, "failed to initialize application after retry");
                    PageError::Store(e)
                })?
            }
        };

        let page_id = PageId::from_path(path);
        let mut tab = Self {
            page: page_id.controller(),
            state,
            document: Document::new(path),
            dialog,
            events: VecDeque::new(),
            reads: VecDeque::new(),
            reload_at: None,
            clock,
        };
        tab.init();
        info!(page = %page_id, path, "page loaded");
        Ok(tab)
    }

    fn init(&mut self) {
        apply_settings(&mut self.document, self.state.settings());
        update_theme_icon(&mut self.document, self.state.settings().theme);
        match self.state.storage().get(PROFILE_IMAGE_KEY) {
            Ok(image) => self.document.set_avatar_image(image),
            Err(e) => warn!(error = %e, "could not read profile image"),
        }
        with_page!(self, |page, ctx| page.init(ctx));
    }

    #[must_use]
    pub fn page_id(&self) -> PageId {
        self.page.id()
    }

    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Time elapsed on this tab's clock since it was opened.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.clock
    }

    #[must_use]
    pub fn pending_reads(&self) -> usize {
        self.reads.len()
    }

    #[must_use]
    pub const fn reload_pending(&self) -> bool {
        self.reload_at.is_some()
    }

    /// Runs one user action. Settings changes it causes are applied to this
    /// tab before returning.
    /// # Errors
    /// Returns `PageError` if the active page does not support the action or
    /// rejects its input.
    pub fn dispatch(&mut self, action: Action) -> Result<(), PageError> {
        debug!(action = action.name(), page = %self.page.id(), "dispatching action");
        match action {
            Action::ToggleTheme => {
                with_page!(self, |_page, ctx| ctx.change_settings(|s| s.theme = s.theme.toggled()));
            }
            Action::VisibilityChanged(true) => self.resync_from_store(),
            Action::VisibilityChanged(false) => {}
            Action::AvatarClicked => self.document.navigate(PROFILE_LOCATION),
            other => with_page!(self, |page, ctx| page.handle(ctx, other))?,
        }
        self.deliver_app_events();
        Ok(())
    }

    /// One turn of the event loop.
    /// # Errors
    /// Returns `PageError` if a completed file read is rejected by the page or
    /// a due reload cannot read the store.
    pub fn pump(&mut self) -> Result<(), PageError> {
        self.deliver_app_events();

        let notifications = self.state.storage().take_events();
        for event in notifications {
            self.on_storage_event(event);
        }

        while let Some(read) = self.reads.pop_front() {
            with_page!(self, |page, ctx| page.on_file_read(ctx, read))?;
            self.deliver_app_events();
        }

        if self.reload_at.is_some_and(|at| self.clock >= at) {
            self.reload()?;
        }
        Ok(())
    }

    /// Moves the tab clock forward. Nothing runs until the next `pump`.
    pub fn advance(&mut self, by: Duration) {
        self.clock += by;
        trace!(now_ms = %self.clock.as_millis(), "tab clock advanced");
    }

    /// Throws the page away and loads it again from the store.
    /// # Errors
    /// Returns `PageError::Store` if the store cannot be read.
    pub fn reload(&mut self) -> Result<(), PageError> {
        self.teardown();
        self.state.reload()?;
        // Changes made before the reload are already in the fresh snapshot.
        let stale = self.state.storage().take_events();
        trace!(discarded = stale.len(), "dropped storage events on reload");

        let location = self.document.location().to_string();
        self.document = Document::new(&location);
        self.page = PageId::from_path(&location).controller();
        self.init();
        info!(path = %location, "page reloaded");
        Ok(())
    }

    /// Closes the tab: the page is torn down and the tab stops listening to
    /// the store.
    pub fn close(self) {}

    fn teardown(&mut self) {
        with_page!(self, |page, ctx| page.teardown(ctx));
        if !self.reads.is_empty() {
            debug!(discarded = self.reads.len(), "dropping unfinished file reads");
        }
        self.reads.clear();
        self.events.clear();
        self.reload_at = None;
    }

    fn deliver_app_events(&mut self) {
        while let Some(event) = self.events.pop_front() {
            match event {
                AppEvent::SettingsUpdated(settings) => self.resync(settings),
            }
        }
    }

    fn on_storage_event(&mut self, event: StorageEvent) {
        match event.key.as_deref() {
            Some(SETTINGS_KEY) => {
                let Some(raw) = event.new_value else {
                    debug!("settings removed in another tab");
                    return;
                };
                match serde_json::from_str::<Settings>(&raw) {
                    Ok(settings) => {
                        debug!("settings changed in another tab");
                        self.resync(settings);
                    }
                    Err(e) => warn!(error = %e, "error handling storage event for settings"),
                }
            }
            Some(key) => trace!(key, "ignoring storage event"),
            None => trace!("ignoring storage clear"),
        }
    }

    /// Re-reads the stored settings, used when the tab becomes visible again.
    fn resync_from_store(&mut self) {
        match read_json::<Settings>(self.state.storage(), SETTINGS_KEY) {
            Ok(Some(settings)) => self.resync(settings),
            Ok(None) => debug!("no stored settings to apply"),
            Err(e) => warn!(error = %e, "error applying settings on visibility change"),
        }
    }

    /// Adopts `settings` and refreshes everything that depends on them.
    /// Applying the same settings twice has no further effect.
    fn resync(&mut self, settings: Settings) {
        self.state.adopt_settings(settings);
        apply_settings(&mut self.document, self.state.settings());
        update_theme_icon(&mut self.document, self.state.settings().theme);
        with_page!(self, |page, ctx| page.on_settings_changed(ctx));
    }
}

impl Drop for Tab {
    fn drop(&mut self) {
        self.teardown();
        debug!(page = %self.page.id(), "tab closed");
    }
}
