//! Production Command Executor
//!
//! Runs `<profile_base>/<profile>/bin/wsadmin.sh -c <command>` as the
//! resource's OS user through `su -`. Output from both streams is returned
//! as one string; the exit status is logged and otherwise ignored because
//! wsadmin exits 0 whether or not the command worked.

use crate::error::RunnerError;
use crate::response::session_failure;
use crate::runner::{AdminSessionRunner, SessionFactory};
use crossbeam::channel::{self, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use wsr_schema::SessionContext;

/// How wsadmin is located and invoked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WsadminConfig {
    /// Script path relative to the profile directory
    pub script: PathBuf,
    /// Scripting language passed as `-lang`
    pub language: String,
    /// Connector passed as `-conntype`
    pub conntype: String,
    /// `su` binary used to switch user
    pub su_binary: PathBuf,
    /// Run through `su - <user>`; when false, run as the current user
    pub switch_user: bool,
    /// Kill wsadmin if it has not returned after this many seconds
    pub timeout_secs: Option<u64>,
}

impl Default for WsadminConfig {
    fn default() -> Self {
        Self {
            script: PathBuf::from("bin/wsadmin.sh"),
            language: "jython".to_string(),
            conntype: "SOAP".to_string(),
            su_binary: PathBuf::from("/bin/su"),
            switch_user: true,
            timeout_secs: None,
        }
    }
}

impl WsadminConfig {
    /// Set the invocation timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Enable or disable `su` user switching
    #[inline]
    #[must_use]
    pub fn with_switch_user(mut self, switch_user: bool) -> Self {
        self.switch_user = switch_user;
        self
    }

    /// Configured timeout
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Quote `value` for `sh`, closing and reopening the quotes around any `'`
#[must_use]
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn drain(mut pipe: impl Read + Send + 'static, stream: Stream, tx: Sender<(Stream, io::Result<String>)>) {
    std::thread::spawn(move || {
        let mut text = String::new();
        let result = pipe.read_to_string(&mut text).map(|_| text);
        let _ = tx.send((stream, result));
    });
}

fn abandon(child: &mut Child) {
    if let Err(e) = child.kill() {
        tracing::warn!(error = %e, "failed to kill wsadmin");
    }
    let _ = child.wait();
}

/// Runs commands through one profile's wsadmin
#[derive(Debug, Clone)]
pub struct WsadminRunner {
    script: PathBuf,
    context: SessionContext,
    config: WsadminConfig,
}

impl WsadminRunner {
    /// Resolve the wsadmin script for `context`
    ///
    /// # Errors
    /// `MissingProfile` when `profile_base` or the profile is unknown,
    /// `ToolNotFound` when the script does not exist.
    pub fn for_session(context: SessionContext, config: WsadminConfig) -> Result<Self, RunnerError> {
        let profile_dir = context.profile_dir().ok_or_else(|| {
            RunnerError::MissingProfile(format!(
                "user {} has no profile_base and profile/dmgr_profile",
                context.user
            ))
        })?;
        let script = profile_dir.join(&config.script);
        if !script.is_file() {
            return Err(RunnerError::ToolNotFound { path: script });
        }
        Ok(Self {
            script,
            context,
            config,
        })
    }

    /// The wsadmin script this runner invokes
    #[must_use]
    pub fn script(&self) -> &std::path::Path {
        &self.script
    }

    /// Shell command line for `command`. With `reveal = false` the password
    /// is replaced so the result can be logged.
    #[must_use]
    pub fn command_line(&self, command: &str, reveal: bool) -> String {
        let mut args = vec![
            shell_quote(&self.script.to_string_lossy()),
            "-lang".to_string(),
            shell_quote(&self.config.language),
            "-conntype".to_string(),
            shell_quote(&self.config.conntype),
        ];
        if let Some(host) = &self.context.dmgr_host {
            args.push("-host".to_string());
            args.push(shell_quote(host.as_str()));
        }
        if let Some(user) = &self.context.wsadmin_user {
            args.push("-user".to_string());
            args.push(shell_quote(user));
            if let Some(pass) = &self.context.wsadmin_pass {
                args.push("-password".to_string());
                args.push(if reveal {
                    shell_quote(pass.expose())
                } else {
                    "'****'".to_string()
                });
            }
        }
        args.push("-c".to_string());
        args.push(shell_quote(command));
        args.join(" ")
    }

    fn spawn(&self, command: &str, user: &str) -> Result<Child, RunnerError> {
        let line = self.command_line(command, true);
        let mut process = if self.config.switch_user {
            let mut p = Command::new(&self.config.su_binary);
            p.arg("-").arg(user).arg("-c").arg(line);
            p
        } else {
            let mut p = Command::new("sh");
            p.arg("-c").arg(line);
            p
        };
        process
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                program: if self.config.switch_user {
                    self.config.su_binary.display().to_string()
                } else {
                    "sh".to_string()
                },
                source,
            })
    }
}

impl AdminSessionRunner for WsadminRunner {
    fn execute(&self, command: &str, user: &str) -> Result<String, RunnerError> {
        tracing::debug!(
            user,
            switch_user = self.config.switch_user,
            command_line = %self.command_line(command, false),
            "running wsadmin"
        );

        let mut child = self.spawn(command, user)?;
        let (tx, rx) = channel::unbounded();
        if let Some(out) = child.stdout.take() {
            drain(out, Stream::Stdout, tx.clone());
        }
        if let Some(err) = child.stderr.take() {
            drain(err, Stream::Stderr, tx.clone());
        }
        drop(tx);

        let timeout = self.config.timeout();
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut stdout = String::new();
        let mut stderr = String::new();
        loop {
            let received = match deadline {
                Some(d) => rx.recv_deadline(d),
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok((stream, Ok(text))) => match stream {
                    Stream::Stdout => stdout = text,
                    Stream::Stderr => stderr = text,
                },
                Ok((_, Err(e))) => {
                    abandon(&mut child);
                    return Err(e.into());
                }
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    abandon(&mut child);
                    let timeout = timeout.unwrap_or_default();
                    tracing::warn!(timeout_secs = timeout.as_secs(), "wsadmin timed out");
                    return Err(RunnerError::TimedOut { timeout });
                }
            }
        }

        let status = child.wait()?;
        tracing::debug!(?status, "wsadmin exited");

        if !stderr.trim().is_empty() {
            tracing::debug!(stderr = %stderr.trim_end(), "wsadmin stderr");
        }
        tracing::trace!(output = %stdout, "wsadmin output");

        if let Some(marker) = session_failure(&stdout).or_else(|| session_failure(&stderr)) {
            return Err(RunnerError::SessionUnavailable { marker });
        }
        Ok(stdout)
    }
}

/// Opens a [`WsadminRunner`] per resource
#[derive(Debug, Clone, Default)]
pub struct WsadminSessionFactory {
    config: WsadminConfig,
}

impl WsadminSessionFactory {
    /// Factory using `config` for every session
    #[must_use]
    pub fn new(config: WsadminConfig) -> Self {
        Self { config }
    }
}

impl SessionFactory for WsadminSessionFactory {
    type Runner = WsadminRunner;

    fn open(&self, context: &SessionContext) -> Result<WsadminRunner, RunnerError> {
        WsadminRunner::for_session(context.clone(), self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use wsr_schema::{Identifier, Secret};

    fn context(base: &Path) -> SessionContext {
        let mut ctx = SessionContext::for_user(Identifier::parse("user", "root").unwrap());
        ctx.profile_base = Some(base.to_path_buf());
        ctx.dmgr_profile = Some(Identifier::parse("dmgr_profile", "PROFILE_DMGR_01").unwrap());
        ctx
    }

    #[cfg(unix)]
    fn install_script(base: &Path, body: &str) {
        use std::os::unix::fs::PermissionsExt;
        let bin = base.join("PROFILE_DMGR_01").join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let script = bin.join("wsadmin.sh");
        std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn quoting_survives_single_quotes() {
        assert_eq!(shell_quote("plain"), "'plain'");
        assert_eq!(
            shell_quote("AdminConfig.getid('/ServerCluster:c/')"),
            r"'AdminConfig.getid('\''/ServerCluster:c/'\'')'"
        );
    }

    #[test]
    fn missing_profile_is_reported() {
        let ctx = SessionContext::for_user(Identifier::parse("user", "root").unwrap());
        assert!(matches!(
            WsadminRunner::for_session(ctx, WsadminConfig::default()),
            Err(RunnerError::MissingProfile(_))
        ));
    }

    #[test]
    fn missing_script_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = WsadminRunner::for_session(context(dir.path()), WsadminConfig::default()).unwrap_err();
        assert!(matches!(err, RunnerError::ToolNotFound { ref path } if path.ends_with("bin/wsadmin.sh")));
    }

    #[cfg(unix)]
    #[test]
    fn password_stays_out_of_logged_command_line() {
        let dir = tempfile::tempdir().unwrap();
        install_script(dir.path(), "true");
        let mut ctx = context(dir.path());
        ctx.dmgr_host = Some(Identifier::parse("dmgr_host", "dmgr01.example.com").unwrap());
        ctx.wsadmin_user = Some("wasadmin".into());
        ctx.wsadmin_pass = Some(Secret::new("s3cret"));
        let runner = WsadminRunner::for_session(ctx, WsadminConfig::default()).unwrap();

        let logged = runner.command_line("print 1", false);
        assert!(logged.contains("-host 'dmgr01.example.com'"));
        assert!(logged.contains("-user 'wasadmin' -password '****'"));
        assert!(!logged.contains("s3cret"));
        assert!(runner.command_line("print 1", true).contains("'s3cret'"));
    }

    #[cfg(unix)]
    #[test]
    fn runs_script_and_returns_raw_output() {
        let dir = tempfile::tempdir().unwrap();
        install_script(
            dir.path(),
            "echo 'WASX7209I: Connected to process \"dmgr\"'\nfor last; do :; done\necho \"$last\"",
        );
        let config = WsadminConfig::default().with_switch_user(false);
        let runner = WsadminRunner::for_session(context(dir.path()), config).unwrap();

        let out = runner
            .execute("AdminConfig.getid('/ServerCluster:c/')", "root")
            .unwrap();
        assert!(out.starts_with("WASX7209I"));
        assert!(out.contains("AdminConfig.getid('/ServerCluster:c/')"));
    }

    #[cfg(unix)]
    #[test]
    fn connection_failure_is_a_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        install_script(
            dir.path(),
            "echo 'WASX7023E: Error creating \"SOAP\" connection to host \"localhost\"' >&2",
        );
        let config = WsadminConfig::default().with_switch_user(false);
        let runner = WsadminRunner::for_session(context(dir.path()), config).unwrap();
        assert!(matches!(
            runner.execute("print 1", "root"),
            Err(RunnerError::SessionUnavailable { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn stderr_chatter_stays_out_of_the_output() {
        let dir = tempfile::tempdir().unwrap();
        install_script(
            dir.path(),
            "echo 'Picked up _JAVA_OPTIONS: -Xshareclasses' >&2",
        );
        let config = WsadminConfig::default().with_switch_user(false);
        let runner = WsadminRunner::for_session(context(dir.path()), config).unwrap();

        let out = runner
            .execute("AdminConfig.getid('/ServerCluster:c/')", "root")
            .unwrap();
        assert_eq!(out, "");

        let cluster = Identifier::parse("name", "c").unwrap();
        let observed = crate::StateProber::new(&runner, "root")
            .cluster_exists(&cluster)
            .unwrap();
        assert_eq!(observed, crate::Observation::Known(false));
    }

    #[cfg(unix)]
    #[test]
    fn slow_wsadmin_times_out() {
        let dir = tempfile::tempdir().unwrap();
        install_script(dir.path(), "exec sleep 5");
        let config = WsadminConfig::default()
            .with_switch_user(false)
            .with_timeout_secs(1);
        let runner = WsadminRunner::for_session(context(dir.path()), config).unwrap();
        let err = runner.execute("print 1", "root").unwrap_err();
        assert!(err.is_outcome_unknown());
    }
}
