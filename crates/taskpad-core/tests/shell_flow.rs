use std::fs;
use std::io::Cursor;

use taskpad_core::config::Config;
use taskpad_core::filter::Visibility;
use taskpad_core::render::{Renderer, Theme};
use taskpad_core::session::Session;
use taskpad_core::shell::Shell;
use taskpad_core::task::TaskId;
use tempfile::tempdir;

fn run_script(shell: &mut Shell, script: &str) -> String {
    let mut out = Vec::new();
    shell
        .run(Cursor::new(script.as_bytes()), &mut out, false)
        .expect("script runs");
    String::from_utf8(out).expect("utf8 output")
}

fn plain_shell() -> Shell {
    Shell::new(Session::new(), Renderer::plain(), Theme::Light)
}

#[test]
fn add_toggle_filter_and_list() {
    let mut shell = plain_shell();
    let output = run_script(
        &mut shell,
        "add \"Buy milk\" 2%\n\
         add Eggs a dozen\n\
         toggle 1\n\
         filter incomplete\n\
         list\n",
    );

    assert!(output.contains("Created task 1."));
    assert!(output.contains("Created task 2."));
    assert!(output.contains("Marked task 1 as completed."));
    assert!(output.contains("Showing incomplete tasks."));
    assert!(output.contains("Tasks (incomplete, 1 shown, light theme)"));
    assert!(output.contains("2  incomplete Eggs  a dozen"));
    assert!(!output.contains("Buy milk"));
    assert_eq!(shell.session().filter(), Visibility::Incomplete);
}

#[test]
fn blank_input_produces_warning_and_no_task() {
    let mut shell = plain_shell();
    let output = run_script(&mut shell, "add \"   \" something\nadd Title\n");

    assert_eq!(
        output.matches("warning: Both task title and description are required!").count(),
        2
    );
    assert!(shell.session().state().tasks.is_empty());
}

#[test]
fn missing_ids_are_reported_not_failed() {
    let mut shell = plain_shell();
    let output = run_script(&mut shell, "delete 7\ntoggle 7\nupdate 7 new text\n");
    assert_eq!(output.matches("No task with id 7.").count(), 3);
    assert!(!output.contains("error:"));
}

#[test]
fn invalid_filter_is_rejected() {
    let mut shell = plain_shell();
    let output = run_script(&mut shell, "filter completed\nfilter archived\n");
    assert!(output.contains("error: invalid filter `archived`"));
    assert_eq!(shell.session().filter(), Visibility::Completed);
}

#[test]
fn update_merges_description_only() {
    let mut shell = plain_shell();
    run_script(&mut shell, "add \"Buy milk\" 2%\nupdate 1 Whole milk\n");

    let task = shell.session().state().get(TaskId(1)).expect("task").clone();
    assert_eq!(task.title, "Buy milk");
    assert_eq!(task.description, "Whole milk");
    assert!(!task.completed);
}

#[test]
fn json_actions_share_the_store() {
    let mut shell = plain_shell();
    let output = run_script(
        &mut shell,
        r#"{"type":"ADD_TASK","payload":{"id":40,"title":"Read","description":"one chapter","completed":false}}
{"type":"SET_FILTER","payload":"archived"}
{"type":"SHUFFLE"}
add Write "a page"
"#,
    );

    assert!(output.contains("Action applied."));
    assert_eq!(output.matches("error: invalid action").count(), 2);
    assert!(output.contains("Created task 41."));
    assert_eq!(shell.session().filter(), Visibility::All);
}

#[test]
fn theme_toggle_is_presentation_only() {
    let mut shell = plain_shell();
    let before = shell.session().state().clone();
    let output = run_script(&mut shell, "theme\nlist\ntheme light\n");

    assert!(output.contains("Switched to dark mode."));
    assert!(output.contains("dark theme)"));
    assert!(output.contains("Switched to light mode."));
    assert_eq!(shell.theme(), Theme::Light);
    assert_eq!(shell.session().state(), &before);
}

#[test]
fn quit_stops_reading() {
    let mut shell = plain_shell();
    run_script(&mut shell, "add a b\nquit\nadd c d\n");
    assert_eq!(shell.session().state().tasks.len(), 1);
}

#[test]
fn unknown_command_keeps_going() {
    let mut shell = plain_shell();
    let output = run_script(&mut shell, "frobnicate\nex\nadd a b\n");
    assert_eq!(output.matches("error: unknown command").count(), 2);
    assert!(output.contains("Created task 1."));
}

#[test]
fn export_view_is_json() {
    let mut shell = plain_shell();
    let output = run_script(&mut shell, "add a b\nadd c d\ntoggle 2\nfilter completed\n");
    assert!(output.contains("Showing completed tasks."));

    let mut out = Vec::new();
    shell.execute("export view", &mut out).expect("export");
    let tasks: serde_json::Value = serde_json::from_slice(&out).expect("json");
    let ids: Vec<u64> = tasks
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|t| t["id"].as_u64())
        .collect();
    assert_eq!(ids, vec![2]);

    let mut out = Vec::new();
    shell.execute("export", &mut out).expect("export");
    let state: serde_json::Value = serde_json::from_slice(&out).expect("json");
    assert_eq!(state["filter"], "completed");
    assert_eq!(state["tasks"].as_array().map(Vec::len), Some(2));
}

#[test]
fn config_drives_theme_and_auto_list() {
    let dir = tempdir().expect("tempdir");
    let rc = dir.path().join("taskpadrc");
    fs::write(&rc, "theme = dark\nauto.list = on\ncolor = off\n").expect("write rc");

    let cfg = Config::load(Some(&rc)).expect("load config");
    let renderer = Renderer::new(&cfg).expect("renderer");
    let mut shell = Shell::from_config(&cfg, renderer).expect("shell");
    assert_eq!(shell.theme(), Theme::Dark);

    let output = run_script(&mut shell, "add a b\n");
    assert!(output.contains("Created task 1."));
    assert!(output.contains("Tasks (all, 1 shown, dark theme)"));
}

#[test]
fn bad_theme_setting_is_an_error() {
    let mut cfg = Config::default();
    cfg.apply_overrides(vec![("theme".to_string(), "sepia".to_string())]);
    assert!(Shell::from_config(&cfg, Renderer::plain()).is_err());
}

#[test]
fn info_shows_one_task() {
    let mut shell = plain_shell();
    let output = run_script(&mut shell, "add \"Buy milk\" 2%\ninfo 1\ninfo 2\n");
    assert!(output.contains("title       Buy milk"));
    assert!(output.contains("status      incomplete"));
    assert!(output.contains("error: no task with id 2"));
}

#[test]
fn auto_list_skips_unchanged_filter() {
    let mut cfg = Config::default();
    cfg.apply_overrides(vec![("auto.list".to_string(), "on".to_string())]);
    let mut shell = Shell::from_config(&cfg, Renderer::plain()).expect("shell");

    let output = run_script(&mut shell, "filter all\n");
    assert!(output.contains("Showing all tasks."));
    assert!(!output.contains("Tasks ("));

    let output = run_script(&mut shell, "filter completed\nfilter completed\n");
    assert_eq!(output.matches("Tasks (").count(), 1);
}

#[test]
fn add_after_max_json_id_reports_error() {
    let mut shell = plain_shell();
    let output = run_script(
        &mut shell,
        "{\"type\":\"ADD_TASK\",\"payload\":{\"id\":18446744073709551615,\"title\":\"t\",\"description\":\"d\"}}\nadd next one\n",
    );
    assert!(output.contains("error: no task ids left"));
    assert!(!output.contains("Created task"));
    assert_eq!(shell.session().state().tasks.len(), 1);
}
