use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

pub const DEFAULT_PROMPT: &str =
  "taskpad> ";

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>,
  include_stack: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    map.insert(
      "color".to_string(),
      "on".to_string()
    );
    map.insert(
      "theme".to_string(),
      "light".to_string()
    );
    map.insert(
      "prompt".to_string(),
      DEFAULT_PROMPT.to_string()
    );
    map.insert(
      "auto.list".to_string(),
      "off".to_string()
    );

    Self {
      map,
      loaded_files: vec![],
      include_stack: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let rc = resolve_rc_path(
      rc_override
    )?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading taskpadrc");
      cfg.load_file(&path)?;
    } else {
      debug!(
        "no taskpadrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  pub fn prompt(&self) -> String {
    self
      .get("prompt")
      .unwrap_or_else(|| {
        DEFAULT_PROMPT.to_string()
      })
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;
    let canonical =
      fs::canonicalize(&path)
        .with_context(|| {
          format!(
            "failed to resolve {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    self.include_stack.push(canonical);
    let result =
      self.load_lines(&path, &text);
    self.include_stack.pop();
    result
  }

  fn load_lines(
    &mut self,
    path: &Path,
    text: &str
  ) -> anyhow::Result<()> {
    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if line.is_empty()
        || line.starts_with('#')
      {
        continue;
      }

      if let Some((before, _)) =
        line.split_once('#')
      {
        line = before.trim();
      }

      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );
        if !include_path.exists() {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
          continue;
        }

        // Only files on the active include chain form a cycle; a file
        // reached twice through separate branches is loaded twice.
        let target =
          fs::canonicalize(&include_path)
            .with_context(|| {
              format!(
                "failed to resolve {}",
                include_path.display()
              )
            })?;
        if self
          .include_stack
          .contains(&target)
        {
          return Err(anyhow!(
            "include cycle at {}:{}: {}",
            path.display(),
            line_num + 1,
            include_path.display()
          ));
        }
        self.load_file(&include_path)?;
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var("TASKPADRC")
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    debug!(
      "cannot determine home \
       directory; skipping taskpadrc"
    );
    return Ok(None);
  };
  let candidate =
    home.join(".taskpadrc");
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(
  s: &str
) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::tempdir;

  use super::Config;

  #[test]
  fn defaults_without_file() {
    let cfg = Config::default();
    assert_eq!(
      cfg.get("theme").as_deref(),
      Some("light")
    );
    assert_eq!(
      cfg.get_bool("color"),
      Some(true)
    );
    assert_eq!(
      cfg.get_bool("auto.list"),
      Some(false)
    );
    assert_eq!(
      cfg.prompt(),
      "taskpad> "
    );
  }

  #[test]
  fn file_include_and_overrides() {
    let dir = tempdir()
      .expect("tempdir");
    let extra =
      dir.path().join("extra.rc");
    fs::write(
      &extra,
      "auto.list = yes\n"
    )
    .expect("write include");

    let main =
      dir.path().join("taskpadrc");
    fs::write(
      &main,
      "# comment\ntheme = dark  # \
       trailing\ninclude extra.rc\n"
    )
    .expect("write rc");

    let mut cfg =
      Config::load(Some(&main))
        .expect("load config");
    assert_eq!(
      cfg.get("theme").as_deref(),
      Some("dark")
    );
    assert_eq!(
      cfg.get_bool("auto.list"),
      Some(true)
    );
    assert_eq!(
      cfg.loaded_files.len(),
      2
    );

    cfg.apply_overrides(vec![(
      "rc.theme".to_string(),
      "light".to_string()
    )]);
    assert_eq!(
      cfg.get("theme").as_deref(),
      Some("light")
    );
  }

  #[test]
  fn malformed_line_is_an_error() {
    let dir = tempdir()
      .expect("tempdir");
    let path =
      dir.path().join("taskpadrc");
    fs::write(&path, "just words\n")
      .expect("write rc");

    let err =
      Config::load(Some(&path))
        .expect_err("bad line");
    assert!(
      err
        .to_string()
        .contains("invalid config line")
    );
  }

  #[test]
  fn self_include_is_rejected() {
    let dir = tempdir()
      .expect("tempdir");
    let path =
      dir.path().join("taskpadrc");
    fs::write(
      &path,
      format!(
        "include {}\n",
        path.display()
      )
    )
    .expect("write rc");

    assert!(
      Config::load(Some(&path))
        .is_err()
    );
  }

  #[test]
  fn parent_dir_self_include_is_rejected()
  {
    let dir = tempdir()
      .expect("tempdir");
    fs::create_dir(
      dir.path().join("sub")
    )
    .expect("mkdir");
    let path =
      dir.path().join("taskpadrc");
    fs::write(
      &path,
      "include sub/../taskpadrc\n"
    )
    .expect("write rc");

    let err =
      Config::load(Some(&path))
        .expect_err("cycle");
    assert!(
      err
        .to_string()
        .contains("include cycle")
    );
  }

  #[test]
  fn diamond_include_loads() {
    let dir = tempdir()
      .expect("tempdir");
    fs::write(
      dir.path().join("common.rc"),
      "theme = dark\n"
    )
    .expect("write common");
    fs::write(
      dir.path().join("a.rc"),
      "include common.rc\nauto.list = on\n"
    )
    .expect("write a");
    let main =
      dir.path().join("taskpadrc");
    fs::write(
      &main,
      "include a.rc\ninclude common.rc\n"
    )
    .expect("write rc");

    let cfg =
      Config::load(Some(&main))
        .expect("diamond is not a cycle");
    assert_eq!(
      cfg.get("theme").as_deref(),
      Some("dark")
    );
    assert_eq!(
      cfg.get_bool("auto.list"),
      Some(true)
    );
    assert_eq!(
      cfg.loaded_files.len(),
      4
    );
  }
}
