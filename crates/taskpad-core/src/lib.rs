pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod render;
pub mod session;
pub mod shell;
pub mod store;
pub mod task;
pub mod view;

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufReader, IsTerminal};

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use error::InputError;
pub use filter::{
  Visibility,
  project
};
pub use session::Session;
pub use store::{
  Action,
  StoreState,
  transition
};
pub use task::{
  Task,
  TaskId,
  TaskPatch
};
pub use view::ViewProjector;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting taskpad"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.taskpadrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let renderer =
    render::Renderer::new(&cfg)?;
  let mut shell =
    shell::Shell::from_config(
      &cfg, renderer
    )?;

  let stdout = io::stdout();
  let mut out = stdout.lock();

  if let Some(path) = cli.script {
    let file = File::open(&path)
      .with_context(|| {
        format!(
          "failed to open script {}",
          path.display()
        )
      })?;
    shell.run(
      BufReader::new(file),
      &mut out,
      false
    )?;
  } else {
    let stdin = io::stdin();
    let interactive =
      stdin.is_terminal();
    shell.run(
      stdin.lock(),
      &mut out,
      interactive
    )?;
  }

  info!(
    tasks = shell
      .session()
      .state()
      .tasks
      .len(),
    "done"
  );
  Ok(())
}
