use serde::{Deserialize, Serialize};

/// One unit of a scanned document, usually a page.
///
/// Units are extracted strictly in ascending `index` order; the override
/// merge depends on it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUnit {
    pub index: usize,
    pub text: String,
}

impl DocumentUnit {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Fields read off a scanned cover sheet.
///
/// Every field is independently optional; a unit only reports the fields
/// visible on it. "Present" means `Some` with non-empty text (a non-empty
/// list for keywords).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentFields {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub subject: Option<String>,
    pub sent_date: Option<String>,
    pub reference: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub keywords: Vec<String>,
}

impl DocumentFields {
    /// True when no field holds a present value.
    pub fn is_empty(&self) -> bool {
        self.sender.is_none()
            && self.recipient.is_none()
            && self.subject.is_none()
            && self.sent_date.is_none()
            && self.reference.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.keywords.is_empty()
    }

    /// Fold another unit's result into this aggregate, field by field.
    ///
    /// A field the incoming result defines with a present value overwrites
    /// the current value; absent fields leave the aggregate untouched. Later
    /// units thus win per field, which lets each page report only what is
    /// visible on it while the aggregate accumulates the union.
    pub fn merge_from(&mut self, other: DocumentFields) {
        overlay(&mut self.sender, other.sender);
        overlay(&mut self.recipient, other.recipient);
        overlay(&mut self.subject, other.subject);
        overlay(&mut self.sent_date, other.sent_date);
        overlay(&mut self.reference, other.reference);
        overlay(&mut self.phone, other.phone);
        overlay(&mut self.email, other.email);
        if !other.keywords.is_empty() {
            self.keywords = other.keywords;
        }
    }
}

/// Overwrite `current` when `incoming` is present and non-empty.
fn overlay(current: &mut Option<String>, incoming: Option<String>) {
    if let Some(value) = incoming {
        if !value.is_empty() {
            *current = Some(value);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
