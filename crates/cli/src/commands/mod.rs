pub mod config;
pub mod run;
pub mod tools;
pub mod validate;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

impl CommandResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    pub fn failure(output: impl Into<String>, exit_code: u8) -> Self {
        Self { exit_code, output: output.into() }
    }
}
