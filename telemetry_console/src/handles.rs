use std::sync::RwLock;

/// A form control whose current string value is read at submit time.
pub trait TextInput: Send + Sync {
    fn value(&self) -> String;
}

/// An output element whose text content is replaced wholesale.
pub trait TextOutput: Send + Sync {
    fn set_text(&self, text: &str);
}

/// One submit action. Created fresh per submission.
#[derive(Debug, Default)]
pub struct SubmitEvent {
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new() -> Self {
        SubmitEvent::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Input handle backed by the last line typed on the console.
#[derive(Debug, Default)]
pub struct ConsoleInput {
    value: RwLock<String>,
}

impl ConsoleInput {
    pub fn new() -> Self {
        ConsoleInput::default()
    }

    pub fn set_value(&self, value: &str) {
        *self.value.write().unwrap() = value.to_string();
    }
}

impl TextInput for ConsoleInput {
    fn value(&self) -> String {
        self.value.read().unwrap().clone()
    }
}

/// Output handle that renders the response area on stdout.
#[derive(Debug, Default)]
pub struct ConsoleOutput;

impl TextOutput for ConsoleOutput {
    fn set_text(&self, text: &str) {
        println!("{text}");
    }
}
