use std::error::Error;
use std::fs;

use scriptherd::config::load_and_validate;

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> Result<(tempfile::TempDir, std::path::PathBuf), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Scriptherd.toml");
    fs::write(&path, contents)?;
    Ok((dir, path))
}

#[test]
fn full_config_round_trips() -> TestResult {
    let (_dir, path) = write_config(
        r#"
[config]
history_limit = 50

[script.scraper]
name = "Web scraper"
working_directory = "/srv/scraper"
script = "main.py"
venv = "env310"
runtime = "python3"
"#,
    )?;

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.config.history_limit, 50);
    assert_eq!(cfg.script.len(), 1);

    let scraper = cfg.script.get("scraper").ok_or("script missing")?;
    assert_eq!(scraper.name, "Web scraper");
    assert_eq!(scraper.effective_venv(), "env310");
    assert_eq!(scraper.effective_runtime(), "python3");
    assert_eq!(
        scraper.interpreter_path(),
        std::path::Path::new("/srv/scraper/env310/bin/python3")
    );

    Ok(())
}

#[test]
fn defaults_apply_when_sections_omitted() -> TestResult {
    let (_dir, path) = write_config(
        r#"
[script.bot]
working_directory = "/opt/bot"
script = "bot.py"
"#,
    )?;

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.config.history_limit, 200);

    let bot = cfg.script.get("bot").ok_or("script missing")?;
    assert_eq!(bot.effective_venv(), "venv");
    assert_eq!(bot.effective_runtime(), "python");
    assert_eq!(
        bot.interpreter_path(),
        std::path::Path::new("/opt/bot/venv/bin/python")
    );

    Ok(())
}

#[test]
fn empty_script_table_is_valid() -> TestResult {
    let (_dir, path) = write_config("")?;
    let cfg = load_and_validate(&path)?;
    assert!(cfg.script.is_empty());
    Ok(())
}

#[test]
fn zero_history_limit_is_rejected() -> TestResult {
    let (_dir, path) = write_config(
        r#"
[config]
history_limit = 0

[script.bot]
working_directory = "/opt/bot"
script = "bot.py"
"#,
    )?;

    assert!(load_and_validate(&path).is_err());
    Ok(())
}

#[test]
fn pathy_venv_name_is_rejected() -> TestResult {
    let (_dir, path) = write_config(
        r#"
[script.bot]
working_directory = "/opt/bot"
script = "bot.py"
venv = "../elsewhere"
"#,
    )?;

    assert!(load_and_validate(&path).is_err());
    Ok(())
}

#[test]
fn empty_script_path_is_rejected() -> TestResult {
    let (_dir, path) = write_config(
        r#"
[script.bot]
working_directory = "/opt/bot"
script = ""
"#,
    )?;

    assert!(load_and_validate(&path).is_err());
    Ok(())
}
