use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::error::ProcessError;
use super::runner::{ExitStatus, ProcessCommand, ProcessOutput, ProcessRunner};

type ArgsPredicate = Box<dyn Fn(&[String]) -> bool + Send + Sync>;

/// Scripted [`ProcessRunner`] for tests
///
/// Each call is answered by the first registered rule whose program and
/// argument predicate match and which has not used up its `times` budget.
/// Calls nothing answers fail with [`ProcessError::Unscripted`]. Every call
/// is recorded, answered or not.
#[derive(Clone, Default)]
pub struct MockProcessRunner {
    script: Arc<Mutex<Script>>,
}

#[derive(Default)]
struct Script {
    rules: Vec<Rule>,
    calls: Vec<ProcessCommand>,
}

struct Rule {
    program: String,
    when: Option<ArgsPredicate>,
    reply: ProcessOutput,
    remaining: Option<usize>,
}

impl Rule {
    fn answers(&self, command: &ProcessCommand) -> bool {
        self.program == command.program
            && self.remaining != Some(0)
            && self.when.as_ref().map_or(true, |when| when(&command.args))
    }
}

/// Builder returned by [`MockProcessRunner::on`]; call [`RuleBuilder::register`]
pub struct RuleBuilder {
    runner: MockProcessRunner,
    rule: Rule,
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a rule answering calls to `program` with empty successful output
    pub fn on(&self, program: &str) -> RuleBuilder {
        RuleBuilder {
            runner: self.clone(),
            rule: Rule {
                program: program.to_string(),
                when: None,
                reply: ProcessOutput {
                    status: ExitStatus::Success,
                    stdout: String::new(),
                    stderr: String::new(),
                    duration: Duration::ZERO,
                },
                remaining: None,
            },
        }
    }

    /// Every command run so far, in order
    pub fn calls(&self) -> Vec<ProcessCommand> {
        self.script().calls.clone()
    }

    pub fn call_count(&self, program: &str) -> usize {
        self.script()
            .calls
            .iter()
            .filter(|call| call.program == program)
            .count()
    }
}

impl RuleBuilder {
    pub fn with_args<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
    {
        self.rule.when = Some(Box::new(predicate));
        self
    }

    pub fn stdout(mut self, stdout: &str) -> Self {
        self.rule.reply.stdout = stdout.to_string();
        self
    }

    pub fn stderr(mut self, stderr: &str) -> Self {
        self.rule.reply.stderr = stderr.to_string();
        self
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.rule.reply.status = match code {
            0 => ExitStatus::Success,
            code => ExitStatus::Code(code),
        };
        self
    }

    /// Answer at most `n` calls, then let later rules answer
    pub fn times(mut self, n: usize) -> Self {
        self.rule.remaining = Some(n);
        self
    }

    pub fn register(self) {
        self.runner.script().rules.push(self.rule);
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        let mut script = self.script();
        script.calls.push(command.clone());

        let rule = script
            .rules
            .iter_mut()
            .find(|rule| rule.answers(&command))
            .ok_or_else(|| ProcessError::Unscripted(command.display()))?;

        if let Some(remaining) = rule.remaining.as_mut() {
            *remaining -= 1;
        }
        Ok(rule.reply.clone())
    }
}
