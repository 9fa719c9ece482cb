//! Rendering seam: whatever displays the form implements [`FormHost`].

use std::collections::BTreeMap;
use std::time::Duration;

use onboarding_form::{StepBadge, StepNumber, StepView};

/// What the navigation bar needs to render the current position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepIndicator {
    pub number: StepNumber,
    pub name: String,
    pub total: StepNumber,
    pub is_first: bool,
    pub is_last: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Saving,
    Saved,
    Error,
}

pub trait FormHost: Send {
    /// View for `step`; `None` when that step is not rendered.
    fn view(&self, step: StepNumber) -> Option<&StepView>;
    fn view_mut(&mut self, step: StepNumber) -> Option<&mut StepView>;
    fn show_step(&mut self, indicator: StepIndicator);
    fn render_sidebar(&mut self, badges: &[StepBadge]);
    fn notify(&mut self, notice: Notice);
    fn set_save_status(&mut self, status: SaveStatus);
    fn set_progress(&mut self, percentage: u8);
    fn schedule_redirect(&mut self, url: &str, delay: Duration);
}

/// Everything an [`InMemoryHost`] was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    ShowStep(StepIndicator),
    Sidebar(Vec<StepBadge>),
    Notice(Notice),
    SaveStatus(SaveStatus),
    Progress(u8),
    Redirect { url: String, delay: Duration },
}

/// Headless host keeping views in memory and recording every call.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHost {
    pub views: BTreeMap<StepNumber, StepView>,
    pub events: Vec<HostEvent>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_view(mut self, step: StepNumber, view: StepView) -> Self {
        self.views.insert(step, view);
        self
    }

    /// Renders an empty view for every step in `1..=total`.
    pub fn blank(total: StepNumber) -> Self {
        let views = (1..=total).map(|step| (step, StepView::new())).collect();
        Self {
            views,
            events: Vec::new(),
        }
    }

    pub fn notices(&self) -> Vec<&Notice> {
        self.events
            .iter()
            .filter_map(|event| match event {
                HostEvent::Notice(notice) => Some(notice),
                _ => None,
            })
            .collect()
    }

    pub fn save_statuses(&self) -> Vec<SaveStatus> {
        self.events
            .iter()
            .filter_map(|event| match event {
                HostEvent::SaveStatus(status) => Some(*status),
                _ => None,
            })
            .collect()
    }

    pub fn last_indicator(&self) -> Option<&StepIndicator> {
        self.events.iter().rev().find_map(|event| match event {
            HostEvent::ShowStep(indicator) => Some(indicator),
            _ => None,
        })
    }

    pub fn last_sidebar(&self) -> Option<&[StepBadge]> {
        self.events.iter().rev().find_map(|event| match event {
            HostEvent::Sidebar(badges) => Some(badges.as_slice()),
            _ => None,
        })
    }

    pub fn last_progress(&self) -> Option<u8> {
        self.events.iter().rev().find_map(|event| match event {
            HostEvent::Progress(percentage) => Some(*percentage),
            _ => None,
        })
    }

    pub fn redirect(&self) -> Option<(&str, Duration)> {
        self.events.iter().find_map(|event| match event {
            HostEvent::Redirect { url, delay } => Some((url.as_str(), *delay)),
            _ => None,
        })
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

impl FormHost for InMemoryHost {
    fn view(&self, step: StepNumber) -> Option<&StepView> {
        self.views.get(&step)
    }

    fn view_mut(&mut self, step: StepNumber) -> Option<&mut StepView> {
        self.views.get_mut(&step)
    }

    fn show_step(&mut self, indicator: StepIndicator) {
        self.events.push(HostEvent::ShowStep(indicator));
    }

    fn render_sidebar(&mut self, badges: &[StepBadge]) {
        self.events.push(HostEvent::Sidebar(badges.to_vec()));
    }

    fn notify(&mut self, notice: Notice) {
        self.events.push(HostEvent::Notice(notice));
    }

    fn set_save_status(&mut self, status: SaveStatus) {
        self.events.push(HostEvent::SaveStatus(status));
    }

    fn set_progress(&mut self, percentage: u8) {
        self.events.push(HostEvent::Progress(percentage));
    }

    fn schedule_redirect(&mut self, url: &str, delay: Duration) {
        self.events.push(HostEvent::Redirect {
            url: url.to_string(),
            delay,
        });
    }
}
