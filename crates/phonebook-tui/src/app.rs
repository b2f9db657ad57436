use std::collections::HashSet;
use std::path::{Path, PathBuf};

use phonebook_core::{
    ApiClient, ApiError, Body, Config, Conversation, ConversationCache, DashboardFeed, Gate, Mode,
    NewsDigest, SharedStorage, Ticket,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::tui::TICK_RATE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Gate,
    Dashboard,
    Chat,
    Studio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// How long a toast stays on screen
const TOAST_MS: u64 = 2200;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Single-line text input with a character cursor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputLine {
    pub text: String,
    pub cursor: usize,
}

impl InputLine {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.chars().count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}

/// Short-lived status line, counted down in ticks
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub text: String,
    pub is_error: bool,
    ticks_left: u32,
}

impl Toast {
    fn new(text: impl Into<String>, is_error: bool) -> Self {
        let tick_ms = TICK_RATE.as_millis().max(1) as u64;
        Self {
            text: text.into(),
            is_error,
            ticks_left: TOAST_MS.div_ceil(tick_ms) as u32,
        }
    }
}

struct PendingTask {
    ticket: Ticket,
    handle: JoinHandle<Result<Body, ApiError>>,
}

/// Chat or studio: a conversation plus the input box and in-flight requests
pub struct ConversationView {
    pub conversation: Conversation,
    pub input: InputLine,
    pub mode: Mode,
    pub attachment: Option<PathBuf>,
    pub selected: Option<usize>,
    pub scroll: u16,
    /// Keep the newest message in view
    pub follow: bool,
    /// At most one; clearing the conversation aborts it
    task: Option<PendingTask>,
    cache: ConversationCache,
    studio: bool,
}

impl ConversationView {
    pub fn chat(storage: SharedStorage) -> Self {
        let cache = ConversationCache::chat(storage);
        let snapshot = cache.load();
        let mode = snapshot
            .mode
            .filter(|m| Mode::chat_modes().contains(m))
            .unwrap_or_default();
        Self::restore(cache, snapshot.messages, &snapshot.input, mode, false)
    }

    pub fn studio(storage: SharedStorage) -> Self {
        let cache = ConversationCache::studio(storage);
        let snapshot = cache.load();
        Self::restore(cache, snapshot.messages, &snapshot.input, Mode::Image, true)
    }

    fn restore(
        cache: ConversationCache,
        messages: Vec<phonebook_core::Message>,
        input: &str,
        mode: Mode,
        studio: bool,
    ) -> Self {
        debug!(key = cache.key(), messages = messages.len(), "restored conversation");
        Self {
            conversation: Conversation::from_messages(messages),
            input: InputLine::with_text(input),
            mode,
            attachment: None,
            selected: None,
            scroll: 0,
            follow: true,
            task: None,
            cache,
            studio,
        }
    }

    pub fn is_studio(&self) -> bool {
        self.studio
    }

    pub fn is_pending(&self) -> bool {
        self.conversation.is_pending() || self.task.is_some()
    }

    pub fn cycle_mode(&mut self) {
        if !self.studio {
            self.mode = self.mode.next();
            self.persist();
        }
    }

    /// Send the input box. Returns false when nothing was sent.
    pub fn send(&mut self, client: &ApiClient, output_dir: &Path) -> bool {
        if self.task.is_some() {
            return false;
        }
        let Some(ticket) = self
            .conversation
            .submit(&self.input.text, self.mode, self.attachment.clone())
        else {
            return false;
        };

        self.input.clear();
        self.attachment = None;
        self.selected = None;
        self.follow = true;
        self.spawn(ticket, client, output_dir);
        self.persist();
        true
    }

    /// Regenerate the selected bot message
    pub fn regenerate(&mut self, client: &ApiClient, output_dir: &Path) -> bool {
        let Some(index) = self.selected.filter(|_| self.task.is_none()) else {
            return false;
        };
        let Some(ticket) = self.conversation.regenerate(index) else {
            return false;
        };

        self.spawn(ticket, client, output_dir);
        self.persist();
        true
    }

    fn spawn(&mut self, ticket: Ticket, client: &ApiClient, output_dir: &Path) {
        let client = client.clone();
        let request = ticket.request.clone();
        let output_dir = output_dir.to_path_buf();
        info!(mode = request.mode.as_str(), "request started");

        let handle = tokio::spawn(async move { client.execute(&request, &output_dir).await });
        self.task = Some(PendingTask { ticket, handle });
    }

    /// Resolve the request if it has finished. Returns true if anything changed.
    pub async fn poll(&mut self) -> bool {
        if !self.task.as_ref().is_some_and(|t| t.handle.is_finished()) {
            return false;
        }
        let Some(task) = self.task.take() else {
            return false;
        };

        let outcome = match task.handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(ApiError::Aborted(e.to_string())),
        };
        if let Err(e) = &outcome {
            info!(error = %e, "request failed");
        }
        let changed = self.conversation.resolve(task.ticket, outcome);
        if changed {
            self.persist();
        }
        changed
    }

    pub fn persist(&self) {
        let mode = (!self.studio).then_some(self.mode);
        self.cache
            .save(self.conversation.messages(), &self.input.text, mode);
    }

    pub fn clear(&mut self) {
        if let Some(task) = self.task.take() {
            task.handle.abort();
            debug!(key = self.cache.key(), "aborted request for cleared conversation");
        }
        self.conversation.clear();
        self.selected = None;
        self.scroll = 0;
        self.follow = true;
        self.persist();
    }

    pub fn select_next(&mut self) {
        let len = self.conversation.len();
        if len == 0 {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        });
        self.follow = false;
    }

    pub fn select_prev(&mut self) {
        let len = self.conversation.len();
        if len == 0 {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) => i.saturating_sub(1),
            None => len - 1,
        });
        self.follow = false;
    }

    pub fn deselect(&mut self) {
        self.selected = None;
        self.follow = true;
    }

    pub fn selected_text(&self) -> Option<String> {
        let message = self.conversation.get(self.selected?)?;
        (!message.is_loader() && !message.text.is_empty()).then(|| message.text.clone())
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines);
        self.follow = false;
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.follow = false;
    }
}

/// News cards on the landing screen
pub struct DashboardView {
    pub feed: DashboardFeed,
    pub topic: String,
    pub selected: usize,
    pub expanded: HashSet<usize>,
    pub scroll: u16,
    task: Option<JoinHandle<Result<NewsDigest, ApiError>>>,
    started: bool,
}

impl DashboardView {
    pub fn new(storage: SharedStorage, topic: &str) -> Self {
        Self {
            feed: DashboardFeed::new(storage),
            topic: topic.to_string(),
            selected: 0,
            expanded: HashSet::new(),
            scroll: 0,
            task: None,
            started: false,
        }
    }

    /// Kick off the one live fetch
    pub fn start(&mut self, client: &ApiClient) {
        if self.started {
            return;
        }
        self.started = true;

        let client = client.clone();
        let topic = self.topic.clone();
        info!(topic = %topic, "fetching dashboard feed");
        self.task = Some(tokio::spawn(async move { client.dashboard(&topic).await }));
    }

    pub async fn poll(&mut self) -> bool {
        if !self.task.as_ref().is_some_and(|h| h.is_finished()) {
            return false;
        }
        let Some(handle) = self.task.take() else {
            return false;
        };

        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(ApiError::Aborted(e.to_string())),
        };
        self.feed.apply(outcome);
        self.expanded.clear();
        self.selected = self.selected.min(self.feed.articles().len().saturating_sub(1));
        true
    }

    pub fn select_next(&mut self) {
        let len = self.feed.articles().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn toggle_expanded(&mut self) {
        if self.feed.articles().is_empty() {
            return;
        }
        if !self.expanded.remove(&self.selected) {
            self.expanded.insert(self.selected);
        }
    }

    pub fn selected_url(&self) -> Option<String> {
        let article = self.feed.articles().get(self.selected)?;
        (!article.url.is_empty()).then(|| article.url.clone())
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,

    // Gate
    pub gate: Gate,
    pub gate_input: InputLine,

    // Views
    pub dashboard: DashboardView,
    pub chat: ConversationView,
    pub studio: ConversationView,

    // Studio attach prompt (file path entry)
    pub attach_input: Option<InputLine>,

    pub toast: Option<Toast>,

    // Animation state
    pub animation_frame: u8, // 0-2 for the loader dots

    /// Held for the app's lifetime; on X11/Wayland the contents go away with it
    clipboard: Option<arboard::Clipboard>,
    client: ApiClient,
    output_dir: PathBuf,
}

impl App {
    pub fn new(config: &Config, storage: SharedStorage) -> Self {
        let client = ApiClient::from_config(config);
        let gate = Gate::new(storage.clone(), config.pass_phrase());

        let mut app = Self {
            should_quit: false,
            screen: Screen::Gate,
            input_mode: InputMode::Editing,

            gate,
            gate_input: InputLine::default(),

            dashboard: DashboardView::new(storage.clone(), config.dashboard_topic()),
            chat: ConversationView::chat(storage.clone()),
            studio: ConversationView::studio(storage),

            attach_input: None,
            toast: None,
            animation_frame: 0,

            clipboard: open_clipboard(),
            client,
            output_dir: config.output_dir(),
        };

        if app.gate.is_open() {
            app.enter_app();
        }
        app
    }

    pub fn api_base(&self) -> &str {
        self.client.base_url()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn enter_app(&mut self) {
        self.screen = Screen::Dashboard;
        self.input_mode = InputMode::Normal;
        self.dashboard.start(&self.client);
    }

    pub fn submit_gate(&mut self) {
        match self.gate.submit(&self.gate_input.text) {
            Ok(()) => {
                self.gate_input.clear();
                self.toast = None;
                self.enter_app();
            }
            Err(e) => self.show_error(e.to_string()),
        }
    }

    pub fn switch_to(&mut self, screen: Screen) {
        if self.gate.is_open() && screen != Screen::Gate {
            self.screen = screen;
            self.input_mode = InputMode::Normal;
            self.attach_input = None;
        }
    }

    /// The conversation behind the current screen, if it has one
    pub fn active_view(&self) -> Option<&ConversationView> {
        match self.screen {
            Screen::Chat => Some(&self.chat),
            Screen::Studio => Some(&self.studio),
            _ => None,
        }
    }

    pub fn active_view_mut(&mut self) -> Option<&mut ConversationView> {
        match self.screen {
            Screen::Chat => Some(&mut self.chat),
            Screen::Studio => Some(&mut self.studio),
            _ => None,
        }
    }

    pub fn send(&mut self) -> bool {
        let (client, output_dir) = (&self.client, &self.output_dir);
        let view = match self.screen {
            Screen::Chat => &mut self.chat,
            Screen::Studio => &mut self.studio,
            _ => return false,
        };
        view.send(client, output_dir)
    }

    pub fn regenerate(&mut self) -> bool {
        let (client, output_dir) = (&self.client, &self.output_dir);
        let view = match self.screen {
            Screen::Chat => &mut self.chat,
            Screen::Studio => &mut self.studio,
            _ => return false,
        };
        view.regenerate(client, output_dir)
    }

    /// Open the studio's attach-path prompt
    pub fn begin_attach(&mut self) {
        let current = self
            .studio
            .attachment
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        self.attach_input = Some(InputLine::with_text(&current));
        self.input_mode = InputMode::Editing;
    }

    pub fn cancel_attach(&mut self) {
        self.attach_input = None;
        self.input_mode = InputMode::Normal;
    }

    pub fn confirm_attach(&mut self) {
        let Some(input) = self.attach_input.take() else {
            return;
        };
        self.input_mode = InputMode::Normal;

        let raw = input.text.trim();
        if raw.is_empty() {
            self.studio.attachment = None;
            return;
        }
        let path = expand_home(raw);
        if path.is_file() {
            info!(path = %path.display(), "attached image");
            self.studio.attachment = Some(path);
        } else {
            self.show_error(format!("No such file: {}", raw));
        }
    }

    /// Copy to the system clipboard. Failures are logged, never surfaced as errors.
    pub fn copy_text(&mut self, text: &str, confirmation: &str) -> bool {
        let Some(clipboard) = self.clipboard.as_mut() else {
            debug!("no clipboard, copy skipped");
            return false;
        };
        match clipboard.set_text(text.to_string()) {
            Ok(()) => {
                self.show_info(confirmation);
                true
            }
            Err(e) => {
                warn!(error = %e, "clipboard copy failed");
                false
            }
        }
    }

    pub fn show_info(&mut self, text: impl Into<String>) {
        self.toast = Some(Toast::new(text, false));
    }

    pub fn show_error(&mut self, text: impl Into<String>) {
        self.toast = Some(Toast::new(text, true));
    }

    pub fn tick(&mut self) {
        if self.chat.is_pending() || self.studio.is_pending() || self.dashboard.feed.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }

        if let Some(toast) = &mut self.toast {
            toast.ticks_left = toast.ticks_left.saturating_sub(1);
            if toast.ticks_left == 0 {
                self.toast = None;
            }
        }
    }

    /// Fold finished background requests back into their views
    pub async fn poll_tasks(&mut self) {
        self.chat.poll().await;
        self.studio.poll().await;
        self.dashboard.poll().await;
    }
}

fn open_clipboard() -> Option<arboard::Clipboard> {
    match arboard::Clipboard::new() {
        Ok(clipboard) => Some(clipboard),
        Err(e) => {
            warn!(error = %e, "clipboard unavailable, copy is disabled");
            None
        }
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(raw: &str) -> PathBuf {
    match (raw.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}
