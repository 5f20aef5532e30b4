use crate::{
    i18n::Localizer,
    message::params,
    model::TunnelInput,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Overlay {
    TestResult,
    Edit,
}

/// Where a pointer click on an open overlay landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickTarget {
    Backdrop,
    Content,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestPhase {
    Loading,
    Succeeded { log: String },
    Failed { output: String },
}

impl TestPhase {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn status_id(&self) -> Option<&'static str> {
        match self {
            Self::Loading => None,
            Self::Succeeded { .. } => Some("test.status.success"),
            Self::Failed { .. } => Some("test.status.failure"),
        }
    }
}

/// Identifies one opening of the test modal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TestTicket(u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestModal {
    pub host: String,
    pub port: u16,
    pub phase: TestPhase,
    ticket: TestTicket,
}

impl TestModal {
    pub fn title(&self, localizer: &Localizer) -> String {
        let id = if self.phase.is_loading() {
            "test.modal.testing"
        } else {
            "test.modal.result"
        };
        localizer.resolve(id, &params([("host", self.host.clone()), ("port", self.port.to_string())]))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditForm {
    pub id: String,
    pub input: TunnelInput,
}

/// Visibility of the modal overlays and the language dropdown. Overlays
/// are independent of each other; the page scroll lock follows "any
/// overlay visible".
#[derive(Clone, Debug, Default)]
pub struct Overlays {
    test: Option<TestModal>,
    edit: Option<EditForm>,
    language_menu_open: bool,
    tickets_issued: u64,
}

impl Overlays {
    pub fn is_visible(&self, overlay: Overlay) -> bool {
        match overlay {
            Overlay::TestResult => self.test.is_some(),
            Overlay::Edit => self.edit.is_some(),
        }
    }

    pub fn scroll_locked(&self) -> bool {
        self.test.is_some() || self.edit.is_some()
    }

    pub fn test_modal(&self) -> Option<&TestModal> {
        self.test.as_ref()
    }

    pub fn edit_form(&self) -> Option<&EditForm> {
        self.edit.as_ref()
    }

    pub fn language_menu_open(&self) -> bool {
        self.language_menu_open
    }

    /// Shows the test modal in a fresh loading state, replacing whatever a
    /// previous run left behind.
    pub fn open_test(&mut self, host: &str, port: u16) -> TestTicket {
        self.tickets_issued += 1;
        let ticket = TestTicket(self.tickets_issued);
        self.test = Some(TestModal {
            host: host.to_string(),
            port,
            phase: TestPhase::Loading,
            ticket,
        });
        ticket
    }

    /// Applies a result only if the modal opened with `ticket` is still on
    /// screen.
    pub fn complete_test(&mut self, ticket: TestTicket, phase: TestPhase) -> bool {
        match self.test.as_mut() {
            Some(modal) if modal.ticket == ticket => {
                modal.phase = phase;
                true
            }
            _ => false,
        }
    }

    pub fn open_edit(&mut self, form: EditForm) {
        self.edit = Some(form);
    }

    pub fn set_edit_input(&mut self, input: TunnelInput) -> bool {
        match self.edit.as_mut() {
            Some(form) => {
                form.input = input;
                true
            }
            None => false,
        }
    }

    /// Closes the edit form only if it still belongs to tunnel `id`.
    pub fn close_edit_of(&mut self, id: &str) -> bool {
        if self.edit.as_ref().is_some_and(|form| form.id == id) {
            self.edit = None;
            return true;
        }
        false
    }

    pub fn close(&mut self, overlay: Overlay) {
        match overlay {
            Overlay::TestResult => self.test = None,
            Overlay::Edit => self.edit = None,
        }
    }

    pub fn click(&mut self, overlay: Overlay, target: ClickTarget) {
        if target == ClickTarget::Backdrop {
            self.close(overlay);
        }
    }

    pub fn toggle_language_menu(&mut self) {
        self.language_menu_open = !self.language_menu_open;
    }

    pub fn close_language_menu(&mut self) {
        self.language_menu_open = false;
    }

    pub fn escape(&mut self) {
        self.close(Overlay::TestResult);
        self.close(Overlay::Edit);
        self.close_language_menu();
    }
}
