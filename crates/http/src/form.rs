//! Entry form state: the fields being typed and the id being edited.

use birdbook_core::Record;

/// Form for one record type.
///
/// With no id under edit, saving creates a record; otherwise it overwrites
/// the record being edited.
pub struct FormState<R: Record> {
    pub fields: R::Input,
    editing: Option<String>,
}

impl<R: Record> Default for FormState<R> {
    fn default() -> Self {
        Self {
            fields: R::form_default(),
            editing: None,
        }
    }
}

impl<R: Record> FormState<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `record` into the form for editing.
    ///
    /// Returns `false` and leaves the form alone when the record has no id.
    pub fn begin_edit(&mut self, record: &R) -> bool {
        if record.id().trim().is_empty() {
            return false;
        }
        self.fields = record.to_input();
        self.editing = Some(record.id().to_string());
        true
    }

    /// Back to a blank create form.
    pub fn reset(&mut self) {
        self.fields = R::form_default();
        self.editing = None;
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Id of the record under edit.
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }
}
