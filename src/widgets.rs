//! Front-end behaviour of the filter panel, modelled as plain state machines.
//!
//! The browser side is a single cooperative event loop, so both widgets are
//! driven by the caller: events come in with the time they happened and the
//! caller asks whether a submission is due.

use std::time::{Duration, Instant};

use crate::config::FilterConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Hidden,
    Shown,
}

impl Display {
    /// CSS `display` value for the panel.
    pub fn css(self) -> &'static str {
        match self {
            Display::Hidden => "none",
            Display::Shown => "block",
        }
    }
}

/// Show/hide toggle for the filter panel plus the icon highlight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterToggle {
    panel: Display,
    highlight_class: String,
    icon_classes: Vec<String>,
}

impl FilterToggle {
    /// Panel starts hidden.
    pub fn connect(config: &FilterConfig) -> Self {
        Self {
            panel: Display::Hidden,
            highlight_class: config.highlight_class.clone(),
            icon_classes: Vec::new(),
        }
    }

    pub fn toggle(&mut self) -> Display {
        match self.panel {
            Display::Hidden => {
                self.panel = Display::Shown;
                if !self.is_highlighted() {
                    self.icon_classes.push(self.highlight_class.clone());
                }
            }
            Display::Shown => {
                self.panel = Display::Hidden;
                self.icon_classes.retain(|c| *c != self.highlight_class);
            }
        }
        self.panel
    }

    pub fn panel(&self) -> Display {
        self.panel
    }

    pub fn is_highlighted(&self) -> bool {
        self.icon_classes.contains(&self.highlight_class)
    }

    pub fn icon_classes(&self) -> &[String] {
        &self.icon_classes
    }
}

/// Defers a form submission until typing has been quiet for `delay`.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(config.debounce_delay())
    }

    /// A keystroke: cancels any pending submission and schedules a new one.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// `true` exactly once per quiet period, when the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn toggle_alternates_from_hidden() {
        let mut toggle = FilterToggle::connect(&FilterConfig::default());
        assert_eq!(toggle.panel(), Display::Hidden);
        assert!(!toggle.is_highlighted());

        assert_eq!(toggle.toggle(), Display::Shown);
        assert_eq!(toggle.icon_classes(), ["text-blue-600"]);
        assert_eq!(toggle.panel().css(), "block");

        assert_eq!(toggle.toggle(), Display::Hidden);
        assert!(toggle.icon_classes().is_empty());
        assert_eq!(toggle.toggle(), Display::Shown);
    }

    #[test]
    fn burst_of_keystrokes_submits_once() {
        let start = Instant::now();
        let ms = Duration::from_millis;
        let mut debouncer = Debouncer::from_config(&FilterConfig::default());

        debouncer.trigger(start);
        debouncer.trigger(start + ms(100));
        debouncer.trigger(start + ms(250));
        assert_eq!(debouncer.deadline(), Some(start + ms(550)));

        let fired: Vec<_> = (0..=12)
            .map(|tick| start + ms(tick * 50))
            .filter(|t| debouncer.poll(*t))
            .collect();
        assert_eq!(fired, vec![start + ms(550)]);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn cancel_drops_pending_submission() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        debouncer.trigger(start);
        debouncer.cancel();
        assert!(!debouncer.poll(start + Duration::from_secs(1)));
    }
}
