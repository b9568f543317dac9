//! Integration tests for JGrab

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::net::TcpListener;
    use tempfile::TempDir;

    fn jgrab(home: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("jgrab");
        cmd.env("JGRAB_HOME", home.path()).env_remove("RUST_LOG");
        cmd
    }

    /// Home whose config points the daemon at a port nothing listens on
    fn home_without_daemon() -> TempDir {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let home = TempDir::new().unwrap();
        std::fs::write(
            home.path().join("config.toml"),
            format!("[daemon]\nport = {}\n", port),
        )
        .unwrap();
        home
    }

    #[test]
    fn help_displays() {
        let home = TempDir::new().unwrap();
        jgrab(&home)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("run Java code without a build system"));
    }

    #[test]
    fn version_flag_displays() {
        let home = TempDir::new().unwrap();
        jgrab(&home)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("jgrab"));
    }

    #[test]
    fn version_without_daemon() {
        let home = home_without_daemon();
        jgrab(&home)
            .arg("version")
            .assert()
            .success()
            .stdout(predicate::str::contains(format!(
                "JGrab Client Version: {}",
                env!("CARGO_PKG_VERSION")
            )))
            .stderr(predicate::str::contains("jgrab start"));
    }

    #[test]
    fn stop_without_daemon() {
        let home = home_without_daemon();
        jgrab(&home)
            .arg("stop")
            .assert()
            .success()
            .stdout(predicate::str::contains("daemon is not running"));
    }

    #[test]
    fn config_path() {
        let home = TempDir::new().unwrap();
        jgrab(&home)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let home = TempDir::new().unwrap();
        jgrab(&home)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[daemon]"))
            .stdout(predicate::str::contains("port = 5002"));
    }

    #[test]
    fn config_init_writes_defaults() {
        let home = TempDir::new().unwrap();
        jgrab(&home).args(["config", "init"]).assert().success();

        let written = std::fs::read_to_string(home.path().join("config.toml")).unwrap();
        assert!(written.contains("[resolver]"));

        jgrab(&home)
            .args(["config", "init"])
            .assert()
            .success()
            .stderr(predicate::str::contains("--force"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let home = TempDir::new().unwrap();
        std::fs::write(home.path().join("config.toml"), "[daemon]\nport = \"x\"\n").unwrap();

        jgrab(&home)
            .arg("stop")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn missing_file_is_reported() {
        let home = home_without_daemon();
        jgrab(&home)
            .args(["run", "DoesNotExist.java"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("File does not exist"));
    }

    #[test]
    fn eval_requires_a_snippet() {
        let home = TempDir::new().unwrap();
        jgrab(&home).arg("eval").assert().failure();
    }
}

mod daemon_tests {
    use async_trait::async_trait;
    use jgrab::client::{file_message, snippet_message, stop_message, version_message, DaemonClient};
    use jgrab::config::schema::DaemonConfig;
    use jgrab::config::{Config, Home};
    use jgrab::daemon;
    use jgrab::dependency::Dependency;
    use jgrab::executor::{ExecutionContext, Executor};
    use jgrab::resolver::Resolver;
    use jgrab::source::SourceCode;
    use jgrab::{JGrabError, JGrabResult};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::io::{AsyncWrite, AsyncWriteExt};

    /// Resolves every dependency to one jar named after it
    struct JarResolver {
        dir: PathBuf,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Resolver for JarResolver {
        async fn resolve(&self, dependency: &Dependency) -> JGrabResult<Vec<PathBuf>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let jar = self.dir.join(format!("{}.jar", dependency.module()));
            std::fs::write(&jar, b"").map_err(|e| JGrabError::io("writing jar", e))?;
            Ok(vec![jar])
        }

        fn name(&self) -> &'static str {
            "jar"
        }
    }

    /// Reports what it was asked to run
    struct ReportExecutor;

    #[async_trait]
    impl Executor for ReportExecutor {
        async fn run(
            &self,
            code: &SourceCode,
            args: &[String],
            context: &ExecutionContext,
            out: &mut (dyn AsyncWrite + Unpin + Send),
        ) -> JGrabResult<()> {
            let line = format!(
                "{} {:?} {}\n",
                code.class_name().unwrap_or("snippet"),
                args,
                context.artifacts().len()
            );
            out.write_all(line.as_bytes())
                .await
                .map_err(|e| JGrabError::io("report", e))
        }

        async fn runtime_version(&self) -> String {
            "Report Version: 1".to_string()
        }

        fn name(&self) -> &'static str {
            "report"
        }
    }

    fn free_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    fn config_for(port: u16) -> Config {
        Config {
            daemon: DaemonConfig {
                port,
                ..DaemonConfig::default()
            },
            ..Config::default()
        }
    }

    async fn wait_until_running(client: &DaemonClient) {
        for _ in 0..100 {
            if client.is_running().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("daemon did not start at {}", client.address());
    }

    async fn send(client: &DaemonClient, message: &str) -> String {
        let mut out = Vec::new();
        client.send(message, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    async fn start(
        home: &Home,
        config: &Config,
        resolver: Arc<JarResolver>,
    ) -> tokio::task::JoinHandle<JGrabResult<()>> {
        let home_owned = Home::new(home.dir());
        let config_owned = config.clone();
        tokio::spawn(async move {
            daemon::run(&home_owned, &config_owned, resolver, Arc::new(ReportExecutor)).await
        })
    }

    #[tokio::test]
    async fn daemon_lifecycle_persists_resolved_dependencies() {
        let dir = TempDir::new().unwrap();
        let home = Home::new(dir.path().join("home"));
        let jars = TempDir::new().unwrap();
        let config = config_for(free_port());
        let client = DaemonClient::new(&home, &config.daemon);

        let resolver = Arc::new(JarResolver {
            dir: jars.path().to_path_buf(),
            calls: AtomicUsize::new(0),
        });
        let server = start(&home, &config, Arc::clone(&resolver)).await;
        wait_until_running(&client).await;

        let source = "// #jgrab com.example:lib:1.0\npublic class Main {}\n";
        let args = vec!["a".to_string(), "b".to_string()];
        let reply = send(&client, &file_message(source, &args)).await;
        assert_eq!(reply, "Main [\"a\", \"b\"] 1\n");

        let reply = send(&client, &snippet_message("1 + 1")).await;
        assert_eq!(reply, "snippet [] 0\n");

        let reply = send(&client, version_message()).await;
        assert!(reply.starts_with("JGrab Daemon Version: "));
        assert!(reply.ends_with("Report Version: 1\n"));

        let reply = send(&client, stop_message()).await;
        assert_eq!(reply, format!("{}\n", daemon::STOPPED_MESSAGE));
        server.await.unwrap().unwrap();

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);

        let saved = std::fs::read_to_string(home.cache_path()).unwrap();
        let jar = jars.path().join("lib.jar");
        assert_eq!(saved, format!("com.example:lib:1.0 {}\n", jar.display()));
    }

    #[tokio::test]
    async fn restarted_daemon_reuses_cached_dependencies() {
        let dir = TempDir::new().unwrap();
        let home = Home::new(dir.path().join("home"));
        let jars = TempDir::new().unwrap();
        let source = "// #jgrab com.example:lib:1.0\npublic class Main {}\n";

        for expected_calls in [1, 0] {
            let config = config_for(free_port());
            let client = DaemonClient::new(&home, &config.daemon);
            let resolver = Arc::new(JarResolver {
                dir: jars.path().to_path_buf(),
                calls: AtomicUsize::new(0),
            });

            let server = start(&home, &config, Arc::clone(&resolver)).await;
            wait_until_running(&client).await;

            let reply = send(&client, &file_message(source, &[])).await;
            assert_eq!(reply, "Main [] 1\n");

            send(&client, stop_message()).await;
            server.await.unwrap().unwrap();

            assert_eq!(resolver.calls.load(Ordering::SeqCst), expected_calls);
        }
    }

    #[tokio::test]
    async fn second_daemon_on_same_port_keeps_first_token() {
        let dir = TempDir::new().unwrap();
        let home = Home::new(dir.path().join("home"));
        let jars = TempDir::new().unwrap();
        let config = config_for(free_port());
        let client = DaemonClient::new(&home, &config.daemon);

        let resolver = Arc::new(JarResolver {
            dir: jars.path().to_path_buf(),
            calls: AtomicUsize::new(0),
        });
        let server = start(&home, &config, Arc::clone(&resolver)).await;
        wait_until_running(&client).await;

        let token = std::fs::read_to_string(home.token_path()).unwrap();

        let err = daemon::run(&home, &config, resolver, Arc::new(ReportExecutor))
            .await
            .unwrap_err();
        assert!(matches!(err, JGrabError::Bind { .. }));
        assert_eq!(std::fs::read_to_string(home.token_path()).unwrap(), token);

        let reply = send(&client, &snippet_message("1")).await;
        assert_eq!(reply, "snippet [] 0\n");

        send(&client, stop_message()).await;
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn stale_token_is_unauthorized() {
        let dir = TempDir::new().unwrap();
        let home = Home::new(dir.path().join("home"));
        let jars = TempDir::new().unwrap();
        let config = config_for(free_port());
        let client = DaemonClient::new(&home, &config.daemon);

        let resolver = Arc::new(JarResolver {
            dir: jars.path().to_path_buf(),
            calls: AtomicUsize::new(0),
        });
        let server = start(&home, &config, resolver).await;
        wait_until_running(&client).await;

        let token = std::fs::read_to_string(home.token_path()).unwrap();
        std::fs::write(home.token_path(), "stale-token").unwrap();

        let reply = send(&client, stop_message()).await;
        assert_eq!(reply, format!("{}\n", daemon::UNAUTHORIZED_MESSAGE));

        std::fs::write(home.token_path(), token).unwrap();
        send(&client, stop_message()).await;
        server.await.unwrap().unwrap();
    }
}
