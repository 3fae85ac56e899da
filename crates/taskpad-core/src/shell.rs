use std::io::{BufRead, Write};

use anyhow::{Context, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::cli::split_words;
use crate::config::Config;
use crate::error::InputError;
use crate::render::{Renderer, Theme};
use crate::session::{Outcome, Session};
use crate::task::{TaskId, TaskPatch};

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "add", "delete", "toggle", "update", "filter", "list", "info", "theme", "export", "help",
        "quit", "exit",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Line-oriented front end over a [`Session`]. Owns the presentation
/// state (theme, renderer) that the session never sees.
#[derive(Debug)]
pub struct Shell {
    session: Session,
    renderer: Renderer,
    theme: Theme,
    auto_list: bool,
    prompt: String,
}

impl Shell {
    pub fn new(session: Session, renderer: Renderer, theme: Theme) -> Self {
        Self {
            session,
            renderer,
            theme,
            auto_list: false,
            prompt: String::new(),
        }
    }

    pub fn from_config(cfg: &Config, renderer: Renderer) -> anyhow::Result<Self> {
        let theme = match cfg.get("theme") {
            Some(raw) => raw.parse::<Theme>().context("invalid `theme` setting")?,
            None => Theme::default(),
        };
        let mut shell = Self::new(Session::new(), renderer, theme);
        shell.auto_list = cfg.get_bool("auto.list").unwrap_or(false);
        shell.prompt = cfg.prompt();
        Ok(shell)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Reads commands until end of input or `quit`. The prompt is only
    /// written when `interactive` is set.
    #[instrument(skip(self, input, out))]
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        input: R,
        out: &mut W,
        interactive: bool,
    ) -> anyhow::Result<()> {
        if interactive {
            write!(out, "{}", self.prompt)?;
            out.flush()?;
        }

        for (idx, line) in input.lines().enumerate() {
            let line = line.with_context(|| format!("failed reading input line {}", idx + 1))?;
            if self.execute_line(&line, out)? == Flow::Quit {
                info!(line = idx + 1, "quit requested");
                return Ok(());
            }
            if interactive {
                write!(out, "{}", self.prompt)?;
                out.flush()?;
            }
        }

        if interactive {
            writeln!(out)?;
        }
        Ok(())
    }

    /// Executes one line. Command failures are reported to `out`; only
    /// failures writing to `out` are returned.
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> anyhow::Result<()> {
        self.execute_line(line, out).map(|_| ())
    }

    fn execute_line<W: Write>(&mut self, line: &str, out: &mut W) -> anyhow::Result<Flow> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(Flow::Continue);
        }

        let result = if trimmed.starts_with('{') {
            self.cmd_dispatch_json(out, trimmed)
        } else {
            match split_words(trimmed) {
                Ok(words) => self.dispatch(out, &words),
                Err(err) => Err(err),
            }
        };

        match result {
            Ok(flow) => Ok(flow),
            Err(err) => {
                match err.downcast_ref::<InputError>() {
                    Some(input) if input.is_warning() => {
                        warn!(%input, "input rejected");
                        writeln!(out, "warning: {input}")?;
                    }
                    _ => {
                        warn!(error = %err, "command failed");
                        writeln!(out, "error: {err:#}")?;
                    }
                }
                Ok(Flow::Continue)
            }
        }
    }

    #[instrument(skip(self, out, words))]
    fn dispatch<W: Write>(&mut self, out: &mut W, words: &[String]) -> anyhow::Result<Flow> {
        let Some((head, args)) = words.split_first() else {
            return Ok(Flow::Continue);
        };

        let known = known_command_names();
        let command = expand_command_abbrev(head.as_str(), &known)
            .ok_or_else(|| anyhow!("unknown command: {head} (try `help`)"))?;

        debug!(command, args = ?args, "dispatching command");

        let changed = match command {
            "add" => self.cmd_add(out, args)?,
            "delete" => self.cmd_delete(out, args)?,
            "toggle" => self.cmd_toggle(out, args)?,
            "update" => self.cmd_update(out, args)?,
            "filter" => self.cmd_filter(out, args)?,
            "list" => {
                self.cmd_list(out)?;
                false
            }
            "info" => {
                self.cmd_info(out, args)?;
                false
            }
            "theme" => {
                self.cmd_theme(out, args)?;
                false
            }
            "export" => {
                self.cmd_export(out, args)?;
                false
            }
            "help" => {
                cmd_help(out)?;
                false
            }
            "quit" | "exit" => return Ok(Flow::Quit),
            other => return Err(anyhow!("unknown command: {other}")),
        };

        if changed && self.auto_list {
            self.cmd_list(out)?;
        }
        Ok(Flow::Continue)
    }

    fn cmd_add<W: Write>(&mut self, out: &mut W, args: &[String]) -> anyhow::Result<bool> {
        let title = args.first().map(String::as_str).unwrap_or_default();
        let description = args.get(1..).map(|rest| rest.join(" ")).unwrap_or_default();

        let id = self.session.add_task(title, &description)?;
        writeln!(out, "Created task {id}.")?;
        Ok(true)
    }

    fn cmd_delete<W: Write>(&mut self, out: &mut W, args: &[String]) -> anyhow::Result<bool> {
        let id = single_id(args, "delete")?;
        match self.session.delete_task(id) {
            Outcome::Changed => {
                writeln!(out, "Deleted task {id}.")?;
                Ok(true)
            }
            Outcome::Unchanged => {
                writeln!(out, "No task with id {id}.")?;
                Ok(false)
            }
        }
    }

    fn cmd_toggle<W: Write>(&mut self, out: &mut W, args: &[String]) -> anyhow::Result<bool> {
        let id = single_id(args, "toggle")?;
        match self.session.toggle_completed(id) {
            Outcome::Changed => {
                let status = self
                    .session
                    .state()
                    .get(id)
                    .map(|task| task.status_label())
                    .unwrap_or("unknown");
                writeln!(out, "Marked task {id} as {status}.")?;
                Ok(true)
            }
            Outcome::Unchanged => {
                writeln!(out, "No task with id {id}.")?;
                Ok(false)
            }
        }
    }

    fn cmd_update<W: Write>(&mut self, out: &mut W, args: &[String]) -> anyhow::Result<bool> {
        let (id_token, rest) = args
            .split_first()
            .ok_or_else(|| anyhow!("update requires a task id"))?;
        let id = id_token.parse::<TaskId>()?;
        let patch = parse_patch(rest)?;
        if patch.is_empty() {
            return Err(anyhow!("update requires a description or completed:<yes|no>"));
        }

        match self.session.update_task(id, patch)? {
            Outcome::Changed => {
                writeln!(out, "Updated task {id}.")?;
                Ok(true)
            }
            Outcome::Unchanged => {
                writeln!(out, "No task with id {id}.")?;
                Ok(false)
            }
        }
    }

    fn cmd_filter<W: Write>(&mut self, out: &mut W, args: &[String]) -> anyhow::Result<bool> {
        let [raw] = args else {
            return Err(anyhow!("filter requires one of: all, completed, incomplete"));
        };
        let before = self.session.filter();
        let filter = self.session.set_filter(raw)?;
        writeln!(out, "Showing {filter} tasks.")?;
        Ok(filter != before)
    }

    fn cmd_list<W: Write>(&mut self, out: &mut W) -> anyhow::Result<()> {
        let filter = self.session.filter();
        let view = self.session.visible_tasks();
        self.renderer
            .print_task_table(out, &view, filter, self.theme)
    }

    fn cmd_info<W: Write>(&mut self, out: &mut W, args: &[String]) -> anyhow::Result<()> {
        let id = single_id(args, "info")?;
        let task = self
            .session
            .state()
            .get(id)
            .ok_or_else(|| anyhow!("no task with id {id}"))?;
        self.renderer.print_task_info(out, task, self.theme)
    }

    fn cmd_theme<W: Write>(&mut self, out: &mut W, args: &[String]) -> anyhow::Result<()> {
        self.theme = match args {
            [] => self.theme.toggled(),
            [raw] => raw.parse::<Theme>()?,
            _ => return Err(anyhow!("theme takes at most one argument")),
        };
        info!(theme = %self.theme, "theme changed");
        writeln!(out, "Switched to {} mode.", self.theme)?;
        Ok(())
    }

    fn cmd_export<W: Write>(&mut self, out: &mut W, args: &[String]) -> anyhow::Result<()> {
        let scope = args.first().map(String::as_str).unwrap_or("all");
        let json = match scope {
            "all" | "state" => serde_json::to_string_pretty(self.session.state())?,
            "view" => {
                let view = self.session.visible_tasks();
                serde_json::to_string_pretty(view.as_slice())?
            }
            other => return Err(anyhow!("unknown export scope: {other} (expected all or view)")),
        };
        writeln!(out, "{json}")?;
        Ok(())
    }

    fn cmd_dispatch_json<W: Write>(&mut self, out: &mut W, raw: &str) -> anyhow::Result<Flow> {
        let filter_before = self.session.filter();
        let outcome = self.session.dispatch_json(raw)?;
        let changed = outcome == Outcome::Changed || filter_before != self.session.filter();
        if changed {
            writeln!(out, "Action applied.")?;
        } else {
            writeln!(out, "Action had no effect.")?;
        }
        if changed && self.auto_list {
            self.cmd_list(out)?;
        }
        Ok(Flow::Continue)
    }
}

fn single_id(args: &[String], command: &str) -> anyhow::Result<TaskId> {
    match args {
        [raw] => raw.parse::<TaskId>(),
        [] => Err(anyhow!("{command} requires a task id")),
        _ => Err(anyhow!("{command} takes exactly one task id")),
    }
}

/// Parses `description:<text>` / `completed:<bool>` tokens. Other words
/// are joined into the new description; `--` ends token parsing.
fn parse_patch(args: &[String]) -> anyhow::Result<TaskPatch> {
    let mut patch = TaskPatch::default();
    let mut desc_parts = Vec::new();
    let mut literal = false;

    for arg in args {
        if arg == "--" && !literal {
            literal = true;
            continue;
        }

        if !literal && let Some((key, value)) = arg.split_once(':').or_else(|| arg.split_once('=')) {
            match key.to_ascii_lowercase().as_str() {
                "completed" | "done" => {
                    patch.completed = Some(parse_flag(value)?);
                    continue;
                }
                "description" | "desc" => {
                    patch.description = Some(value.to_string());
                    continue;
                }
                _ => {}
            }
        }

        desc_parts.push(arg.clone());
    }

    if !desc_parts.is_empty() {
        if patch.description.is_some() {
            return Err(anyhow!("description given twice"));
        }
        patch.description = Some(desc_parts.join(" "));
    }

    Ok(patch)
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "y" | "yes" | "on" | "true" => Ok(true),
        "0" | "n" | "no" | "off" | "false" => Ok(false),
        other => Err(anyhow!("expected yes or no, got: {other}")),
    }
}

fn cmd_help<W: Write>(out: &mut W) -> anyhow::Result<()> {
    writeln!(out, "Commands (any unique prefix works):")?;
    writeln!(out, "  add <title> <description...>     add a task")?;
    writeln!(out, "  delete <id>                      remove a task")?;
    writeln!(out, "  toggle <id>                      flip completed/incomplete")?;
    writeln!(out, "  update <id> [text...] [completed:yes|no]")?;
    writeln!(out, "  filter <all|completed|incomplete>")?;
    writeln!(out, "  list                             show the filtered tasks")?;
    writeln!(out, "  info <id>                        show one task")?;
    writeln!(out, "  theme [light|dark]               switch color theme")?;
    writeln!(out, "  export [all|view]                print JSON")?;
    writeln!(out, "  quit                             stop")?;
    writeln!(out, "  {{\"type\": ..., \"payload\": ...}}   apply a JSON action")?;
    Ok(())
}
