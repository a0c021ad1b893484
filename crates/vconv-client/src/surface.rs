//! UI side effects of the conversion flow.
//!
//! The flow never touches a concrete UI. Everything it shows goes through
//! [`UiSurface`], which a front end implements (the CLI prints to the
//! terminal; tests record the calls).

use vconv_models::Navigation;

pub trait UiSurface: Send {
    /// Show a message in the dismissible error panel.
    fn show_error(&mut self, message: &str);

    /// Hide any visible error panel.
    fn hide_errors(&mut self);

    /// Toggle the loading indicator.
    fn set_loading(&mut self, visible: bool);

    /// Leave the page for `target`.
    fn navigate(&mut self, target: &Navigation);

    /// Clear the panels and the form.
    fn reset(&mut self) {
        self.hide_errors();
        self.set_loading(false);
    }
}

/// One recorded UI call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    ShowError(String),
    HideErrors,
    Loading(bool),
    Navigate(Navigation),
}

/// Surface that records calls instead of rendering them.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    pub events: Vec<UiEvent>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Navigations performed so far.
    pub fn navigations(&self) -> Vec<&Navigation> {
        self.events
            .iter()
            .filter_map(|event| match event {
                UiEvent::Navigate(target) => Some(target),
                _ => None,
            })
            .collect()
    }

    /// Messages shown in the error panel so far.
    pub fn errors(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                UiEvent::ShowError(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Last loading-indicator state, `false` when never set.
    pub fn loading(&self) -> bool {
        self.events
            .iter()
            .rev()
            .find_map(|event| match event {
                UiEvent::Loading(visible) => Some(*visible),
                _ => None,
            })
            .unwrap_or(false)
    }
}

impl UiSurface for RecordingSurface {
    fn show_error(&mut self, message: &str) {
        self.events.push(UiEvent::ShowError(message.to_string()));
    }

    fn hide_errors(&mut self) {
        self.events.push(UiEvent::HideErrors);
    }

    fn set_loading(&mut self, visible: bool) {
        self.events.push(UiEvent::Loading(visible));
    }

    fn navigate(&mut self, target: &Navigation) {
        self.events.push(UiEvent::Navigate(target.clone()));
    }
}
