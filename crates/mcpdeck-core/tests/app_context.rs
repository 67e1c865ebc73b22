use tempfile::TempDir;

use mcpdeck_core::config::SecretsStore;
use mcpdeck_core::context::AppContext;

fn context(temp: &TempDir) -> AppContext {
    AppContext::new(
        temp.path().join("home"),
        temp.path().join("project"),
        temp.path().join("config"),
        temp.path().join("state"),
    )
}

#[test]
fn app_context_finds_yaml_definitions() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config");
    std::fs::create_dir_all(&config).unwrap();
    std::fs::write(config.join("servers.yaml"), "echo:\n  command: echo\n").unwrap();
    std::fs::write(config.join("groups.toml"), "all = [\"echo\"]\n").unwrap();

    let ctx = context(&temp);

    assert_eq!(ctx.servers_path(), config.join("servers.yaml"));
    assert_eq!(ctx.groups_path(), config.join("groups.toml"));
    let store = ctx.load_store().unwrap();
    assert!(store.server("echo").is_some());
    assert_eq!(store.group("all").unwrap().members, vec!["echo"]);
}

#[test]
fn app_context_provides_client_context() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp);

    let client_ctx = ctx.client_context();
    assert_eq!(client_ctx.home_dir, temp.path().join("home"));
    assert_eq!(client_ctx.project_root, temp.path().join("project"));
    assert_eq!(ctx.log_dir(), temp.path().join("state/logs"));
}

#[test]
fn secrets_round_trip_through_context() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp);
    let path = ctx.secrets_path().to_path_buf();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        &path,
        "# saved by mcpdeck\nexport MCPDECK_TEST_ONLY_TOKEN='abc def'\n\nOTHER=1\n",
    )
    .unwrap();

    let mut secrets = SecretsStore::load(&path).unwrap();
    assert_eq!(secrets.get("MCPDECK_TEST_ONLY_TOKEN"), Some("abc def"));
    secrets.set("OTHER", "2");
    secrets.save().unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("# saved by mcpdeck\n"));
    assert!(content.contains("OTHER=2"));

    let env = ctx.environment().unwrap();
    assert_eq!(env.get("MCPDECK_TEST_ONLY_TOKEN"), Some("abc def"));
}

#[cfg(unix)]
#[test]
fn saved_secrets_are_private() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let ctx = context(&temp);
    let mut secrets = ctx.secrets().unwrap();
    secrets.set("TOKEN", "t");
    secrets.save().unwrap();

    let mode = std::fs::metadata(ctx.secrets_path())
        .unwrap()
        .permissions()
        .mode()
        & 0o777;
    assert_eq!(mode, 0o600);
}
