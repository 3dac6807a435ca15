//! Structured shell script assembly
//!
//! Scripts are built from steps instead of interpolated strings. Every value
//! that comes from an application record (names, paths, URLs) is carried as an
//! [`Arg::Lit`] and shell-quoted when the script is rendered, so a directory
//! called `my app; rm -rf /` stays a single word.
//!
//! Only two things are emitted verbatim: shell variable references
//! ([`Arg::Var`]) and [`Step::Snippet`] blocks whose text is produced by this
//! crate from typed values (the port finder).

use std::fmt;

/// A single shell word
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Literal text, quoted on render when needed
    Lit(String),
    /// Reference to a shell variable, rendered as `"$NAME"`
    Var(&'static str),
    /// Every entry of a directory, rendered as `<quoted dir>/*`
    DirEntries(String),
    /// Adjacent words concatenated without separators
    Concat(Vec<Arg>),
}

impl Arg {
    pub fn lit(value: impl Into<String>) -> Self {
        Arg::Lit(value.into())
    }

    pub fn var(name: &'static str) -> Self {
        Arg::Var(name)
    }

    pub fn render(&self) -> String {
        match self {
            Arg::Lit(value) => shell_words::quote(value).into_owned(),
            Arg::Var(name) => format!("\"${}\"", name),
            Arg::DirEntries(dir) => format!("{}/*", shell_words::quote(dir)),
            Arg::Concat(parts) => parts.iter().map(Arg::render).collect(),
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Lit(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Lit(value)
    }
}

impl From<&String> for Arg {
    fn from(value: &String) -> Self {
        Arg::Lit(value.clone())
    }
}

/// One simple command: optional env prefix, argv, and trailing modifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    env: Vec<(&'static str, Arg)>,
    argv: Vec<Arg>,
    negated: bool,
    silenced: bool,
    tolerate_failure: bool,
}

impl Invocation {
    pub fn new(program: impl Into<Arg>) -> Self {
        Self {
            env: Vec::new(),
            argv: vec![program.into()],
            negated: false,
            silenced: false,
            tolerate_failure: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.argv.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.argv.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets an environment variable for this command only
    pub fn env(mut self, name: &'static str, value: impl Into<Arg>) -> Self {
        self.env.push((name, value.into()));
        self
    }

    /// Prefixes the command with `!`, for use as a condition
    pub fn negated(mut self) -> Self {
        self.negated = true;
        self
    }

    /// Discards stdout and stderr
    pub fn silenced(mut self) -> Self {
        self.silenced = true;
        self
    }

    /// Appends `|| true`
    pub fn or_true(mut self) -> Self {
        self.tolerate_failure = true;
        self
    }

    pub fn render(&self) -> String {
        let mut words = Vec::with_capacity(self.env.len() + self.argv.len() + 1);
        if self.negated {
            words.push("!".to_string());
        }
        for (name, value) in &self.env {
            words.push(format!("{}={}", name, value.render()));
        }
        words.extend(self.argv.iter().map(Arg::render));

        let mut line = words.join(" ");
        if self.silenced {
            line.push_str(" >/dev/null 2>&1");
        }
        if self.tolerate_failure {
            line.push_str(" || true");
        }
        line
    }
}

/// One line (or block) of a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Run(Invocation),
    Cd(String),
    /// `if <test>; then ...; [else ...;] fi`
    When {
        test: Invocation,
        then: Vec<Invocation>,
        otherwise: Vec<Invocation>,
    },
    /// Writes `lines` to `path` through `tee`, optionally with sudo
    WriteFile {
        path: String,
        lines: Vec<Arg>,
        sudo: bool,
    },
    /// Pre-rendered text generated from typed values
    Snippet(String),
}

impl Step {
    pub fn run(invocation: Invocation) -> Self {
        Step::Run(invocation)
    }

    pub fn cd(dir: impl Into<String>) -> Self {
        Step::Cd(dir.into())
    }

    pub fn when(test: Invocation, then: Vec<Invocation>) -> Self {
        Step::When {
            test,
            then,
            otherwise: Vec::new(),
        }
    }

    pub fn when_else(test: Invocation, then: Vec<Invocation>, otherwise: Vec<Invocation>) -> Self {
        Step::When {
            test,
            then,
            otherwise,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Step::Run(invocation) => invocation.render(),
            Step::Cd(dir) => format!("cd {}", Arg::lit(dir.as_str()).render()),
            Step::When {
                test,
                then,
                otherwise,
            } => {
                let mut out = format!("if {}; then", test.render());
                for invocation in then {
                    out.push_str("\n  ");
                    out.push_str(&invocation.render());
                }
                if !otherwise.is_empty() {
                    out.push_str("\nelse");
                    for invocation in otherwise {
                        out.push_str("\n  ");
                        out.push_str(&invocation.render());
                    }
                }
                out.push_str("\nfi");
                out
            }
            Step::WriteFile { path, lines, sudo } => {
                let mut printf = Invocation::new("printf").arg("%s\\n");
                printf = printf.args(lines.iter().cloned());
                let tee = if *sudo {
                    Invocation::new("sudo").arg("tee").arg(path.as_str())
                } else {
                    Invocation::new("tee").arg(path.as_str())
                };
                format!("{} | {} >/dev/null", printf.render(), tee.render())
            }
            Step::Snippet(text) => text.trim_end().to_string(),
        }
    }
}

/// An ordered list of steps rendered one per line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    steps: Vec<Step>,
    strict: bool,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// A script that starts with `set -e`
    pub fn strict() -> Self {
        Self {
            steps: Vec::new(),
            strict: true,
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn run(self, invocation: Invocation) -> Self {
        self.step(Step::Run(invocation))
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.steps.len() + 1);
        if self.strict {
            lines.push("set -e".to_string());
        }
        lines.extend(self.steps.iter().map(Step::render));
        lines.join("\n")
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
