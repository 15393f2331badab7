use std::path::Path;
use std::time::Duration;

use crate::subprocess::ProcessCommand;

pub struct ProcessCommandBuilder {
    command: ProcessCommand,
}

impl ProcessCommandBuilder {
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            command: ProcessCommand {
                program: program.as_ref().to_string_lossy().into_owned(),
                args: Vec::new(),
                timeout: None,
            },
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.command.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.command
            .args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Append `--name=value`, the flag style inference binaries parse
    pub fn flag(self, name: &str, value: impl AsRef<str>) -> Self {
        let arg = format!("--{}={}", name, value.as_ref());
        self.arg(arg)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.command.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> ProcessCommand {
        self.command
    }
}
