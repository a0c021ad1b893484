//! Terminal rendering of the conversion flow.

use std::io::Write;

use vconv_client::UiSurface;
use vconv_models::{Navigation, ServerErrorCode};

/// Prints panels and navigation to the terminal and remembers where the flow
/// navigated so the caller can follow up (e.g. download the output).
pub struct TerminalSurface<W: Write + Send> {
    out: W,
    base_url: String,
    loading: bool,
    last_navigation: Option<Navigation>,
}

impl TerminalSurface<std::io::Stderr> {
    pub fn stderr(base_url: impl Into<String>) -> Self {
        Self::new(std::io::stderr(), base_url)
    }
}

impl<W: Write + Send> TerminalSurface<W> {
    pub fn new(out: W, base_url: impl Into<String>) -> Self {
        Self {
            out,
            base_url: base_url.into(),
            loading: false,
            last_navigation: None,
        }
    }

    pub fn last_navigation(&self) -> Option<&Navigation> {
        self.last_navigation.as_ref()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> UiSurface for TerminalSurface<W> {
    fn show_error(&mut self, message: &str) {
        let _ = writeln!(self.out, "error: {}", message);
    }

    fn hide_errors(&mut self) {}

    fn set_loading(&mut self, visible: bool) {
        if visible && !self.loading {
            let _ = writeln!(self.out, "Converting, this may take a while...");
        }
        self.loading = visible;
    }

    fn navigate(&mut self, target: &Navigation) {
        let url = target.url(&self.base_url);
        match target {
            Navigation::Download { filename } => {
                let _ = writeln!(self.out, "Converted: {} ({})", filename, url);
            }
            _ => {
                let reason = target
                    .error_code()
                    .and_then(ServerErrorCode::from_code)
                    .map(|code| code.message())
                    .unwrap_or("The server refused the upload");
                let _ = writeln!(self.out, "error: {} ({})", reason, url);
            }
        }
        self.loading = false;
        self.last_navigation = Some(target.clone());
    }
}
