pub mod form;
pub mod handles;

pub use form::{FormError, FormSubmissionHandler};
pub use handles::{SubmitEvent, TextInput, TextOutput};
