use serde::Deserialize;

/// A fully-formed subprocess invocation: the program to spawn and its
/// positional arguments, never routed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchCommand {
    program: String,
    args: Vec<String>,
}

impl DispatchCommand {
    pub fn builder(program: &str) -> DispatchCommandBuilder {
        DispatchCommandBuilder {
            command: DispatchCommand {
                program: program.to_string(),
                args: Vec::new(),
            },
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Render the command as a single line, space separated
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            return self.program.clone();
        }
        format!("{} {}", self.program, self.args.join(" "))
    }
}

pub struct DispatchCommandBuilder {
    command: DispatchCommand,
}

impl DispatchCommandBuilder {
    pub fn arg(mut self, arg: &str) -> Self {
        self.command.args.push(arg.to_string());
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

    pub fn build(self) -> DispatchCommand {
        self.command
    }
}

/// Batch-queue submission wrapper. When present, a day's command is not
/// run directly but handed to the submission program, e.g.
/// `bsub -q s run_trackmatch.sh 2019 11 7`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueueSpec {
    pub program: String,
    pub queue: String,
}

impl QueueSpec {
    pub fn wrap(&self, command: DispatchCommand) -> DispatchCommand {
        DispatchCommand::builder(&self.program)
            .arg("-q")
            .arg(&self.queue)
            .arg(command.program())
            .args(command.args())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_format() {
        let command = DispatchCommand::builder("../shell/run_filesep.sh")
            .arg("2019")
            .arg("11")
            .arg("7")
            .build();

        assert_eq!(command.command_line(), "../shell/run_filesep.sh 2019 11 7");
    }

    #[test]
    fn test_command_line_without_args() {
        let command = DispatchCommand::builder("run.sh").build();
        assert_eq!(command.command_line(), "run.sh");
    }

    #[test]
    fn test_queue_wrap() {
        let queue = QueueSpec {
            program: "bsub".to_string(),
            queue: "s".to_string(),
        };

        let command = DispatchCommand::builder("../shell/run_trackmatch.sh")
            .args(["2019", "11", "7"])
            .build();

        let wrapped = queue.wrap(command);
        assert_eq!(wrapped.program(), "bsub");
        assert_eq!(
            wrapped.command_line(),
            "bsub -q s ../shell/run_trackmatch.sh 2019 11 7"
        );
    }
}
