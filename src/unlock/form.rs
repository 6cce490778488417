use std::fmt;

/// Smallest accepted password length, in characters.
pub const PASSWORD_MIN_LEN: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Password,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Password => f.write_str("password"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// Result of checking the form values against the password rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub errors: Vec<FieldError>,
}

impl Validation {
    pub fn error_for(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

/// Check a candidate password. The only rule is a minimum length.
pub fn validate(password: &str) -> Validation {
    let mut errors = Vec::new();

    if password.chars().count() < PASSWORD_MIN_LEN {
        errors.push(FieldError {
            field: Field::Password,
            message: format!(
                "String must contain at least {} character(s)",
                PASSWORD_MIN_LEN
            ),
        });
    }

    Validation {
        valid: errors.is_empty(),
        errors,
    }
}

/// Local state of the password form.
#[derive(Default)]
pub struct FormState {
    password: String,
    is_submitting: bool,
    message: Option<String>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn is_valid(&self) -> bool {
        validate(&self.password).valid
    }

    /// Message shown under the password field, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Input is frozen while a submission is in flight; edits are dropped.
    pub fn set_password(&mut self, password: impl Into<String>) {
        if !self.is_submitting {
            self.password = password.into();
        }
    }

    pub fn push_char(&mut self, c: char) {
        if !self.is_submitting {
            self.password.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if !self.is_submitting {
            self.password.pop();
        }
    }

    pub fn clear_password(&mut self) {
        if !self.is_submitting {
            self.password.clear();
        }
    }

    pub(crate) fn set_submitting(&mut self, submitting: bool) {
        self.is_submitting = submitting;
    }

    pub(crate) fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub(crate) fn clear_message(&mut self) {
        self.message = None;
    }
}

// Keep the password out of debug output.
impl fmt::Debug for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormState")
            .field("password_len", &self.password.chars().count())
            .field("is_submitting", &self.is_submitting)
            .field("message", &self.message)
            .finish()
    }
}
