use std::io::Write;

use cmdtree::{ManagerSettings, TreeError};
use cmdtree_console::{demo_manager, render, run_line, ConsoleSender, Report};

fn settings_file(json: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

#[test]
fn test_settings_file_drives_manager() {
    let file = settings_file(r#"{"case_sensitive": false, "command_prefix": "!"}"#);
    let manager = demo_manager(ManagerSettings::load(file.path()).unwrap()).unwrap();
    let user = ConsoleSender::new("user", false);

    let report = run_line(&manager, &user, "!GROUP Two 9");
    assert_eq!(render(&report, false), "group two y=9");

    let report = run_line(&manager, &user, "!Say hi there");
    assert_eq!(render(&report, false), "hi there");
}

#[test]
fn test_errors_carry_exit_codes() {
    let manager = demo_manager(ManagerSettings::default()).unwrap();
    let user = ConsoleSender::new("user", false);

    let report = run_line(&manager, &user, "byte 300");
    assert_eq!(report.exit_code(), 1);
    assert!(render(&report, false).starts_with("error: Invalid value for argument 'value'"));

    let report = run_line(&manager, &user, "group");
    assert_eq!(
        report,
        Report::Error {
            message: "Incomplete command. Usage: group one|two".into(),
            exit_code: 1,
        }
    );
}

#[test]
fn test_boolean_and_completions() {
    let manager = demo_manager(ManagerSettings::default()).unwrap();
    let user = ConsoleSender::new("user", false);

    assert_eq!(render(&run_line(&manager, &user, "toggle on"), false), "enabled");
    assert_eq!(render(&run_line(&manager, &user, "toggle no"), false), "disabled");

    assert_eq!(manager.suggest(user.clone(), "t"), vec!["toggle"]);
    assert!(manager.suggest(user, "ad").is_empty());
    assert_eq!(manager.suggest(ConsoleSender::new("root", true), "admin "), vec!["reload"]);
}

#[test]
fn test_demo_commands_cannot_be_registered_twice() {
    let manager = demo_manager(ManagerSettings::default()).unwrap();
    let again = cmdtree::Command::<ConsoleSender>::builder("help")
        .handler(|_| Ok(()))
        .build()
        .unwrap();
    assert_eq!(
        manager.register(again).unwrap_err(),
        TreeError::DuplicateCommand("help".into())
    );
}
