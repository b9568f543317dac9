//! Java executor
//!
//! Compiles code with `javac` into a scratch directory and runs it with
//! `java`. A small launcher class picks the entry point: `Runnable` classes
//! are instantiated and run, anything else gets its `main(String[])` called.
//! Snippets are wrapped in a generated class whose result is printed when
//! not `null`.

use crate::error::{JGrabError, JGrabResult};
use crate::executor::{ExecutionContext, Executor};
use crate::source::SourceCode;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info};

const LAUNCHER_CLASS: &str = "JGrabLauncher";
const SNIPPET_CLASS: &str = "JGrabSnippet";

const LAUNCHER_SOURCE: &str = r#"import java.lang.reflect.InvocationTargetException;
import java.lang.reflect.Method;
import java.util.Arrays;

public class JGrabLauncher {
    public static void main(String[] args) throws Throwable {
        Class<?> type = Class.forName(args[0]);
        String[] programArgs = Arrays.copyOfRange(args, 1, args.length);
        try {
            if (Runnable.class.isAssignableFrom(type)) {
                Runnable runnable = (Runnable) type.getDeclaredConstructor().newInstance();
                runnable.run();
            } else {
                Method main = type.getMethod("main", String[].class);
                main.setAccessible(true);
                main.invoke(null, (Object) programArgs);
            }
        } catch (InvocationTargetException e) {
            throw e.getCause();
        } finally {
            System.out.flush();
        }
    }
}
"#;

/// Runs Java source through the JDK tools found on this machine
pub struct JavaExecutor {
    java: PathBuf,
    javac: PathBuf,
}

impl JavaExecutor {
    /// Locate the JDK: `java_home`, then `JAVA_HOME`, then whatever is on `PATH`
    pub fn new(java_home: Option<&Path>) -> Self {
        let home = java_home
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("JAVA_HOME").map(PathBuf::from));

        match home {
            Some(home) => {
                debug!("Using Java home {}", home.display());
                let bin = home.join("bin");
                Self {
                    java: bin.join(tool("java")),
                    javac: bin.join(tool("javac")),
                }
            }
            None => Self {
                java: PathBuf::from(tool("java")),
                javac: PathBuf::from(tool("javac")),
            },
        }
    }

    pub fn java(&self) -> &Path {
        &self.java
    }

    pub fn javac(&self) -> &Path {
        &self.javac
    }

    async fn compile(
        &self,
        classes_dir: &Path,
        sources: &[PathBuf],
        context: &ExecutionContext,
        out: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> JGrabResult<()> {
        let mut cmd = Command::new(&self.javac);
        cmd.arg("-nowarn").arg("-d").arg(classes_dir);
        if let Some(class_path) = context.class_path() {
            cmd.arg("-cp").arg(class_path);
        }
        cmd.args(sources);

        debug!("Compiling {} source file(s)", sources.len());

        let output = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| self.spawn_error(&self.javac, e))?;

        if output.status.success() {
            return Ok(());
        }

        write_to(out, &output.stdout).await?;
        write_to(out, &output.stderr).await?;
        Err(JGrabError::Compilation)
    }

    fn spawn_error(&self, tool: &Path, e: std::io::Error) -> JGrabError {
        if e.kind() == std::io::ErrorKind::NotFound {
            JGrabError::JavaNotFound(tool.display().to_string())
        } else {
            JGrabError::command_failed(tool.display().to_string(), e)
        }
    }
}

impl Default for JavaExecutor {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl Executor for JavaExecutor {
    async fn run(
        &self,
        code: &SourceCode,
        args: &[String],
        context: &ExecutionContext,
        out: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> JGrabResult<()> {
        let work_dir = tempfile::Builder::new()
            .prefix("jgrab")
            .tempdir()
            .map_err(|e| JGrabError::io("creating temp directory", e))?;

        let src_dir = work_dir.path().join("src");
        let classes_dir = work_dir.path().join("classes");
        for dir in [&src_dir, &classes_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| JGrabError::io(format!("creating {}", dir.display()), e))?;
        }

        let (class_name, source) = match code.class_name() {
            Some(name) => (name.to_string(), code.code().to_string()),
            None => {
                debug!("Running Java snippet");
                (SNIPPET_CLASS.to_string(), wrap_snippet(code.code()))
            }
        };

        let class_file = src_dir.join(format!("{}.java", simple_name(&class_name)));
        let launcher_file = src_dir.join(format!("{}.java", LAUNCHER_CLASS));
        write_source(&class_file, &source).await?;
        write_source(&launcher_file, LAUNCHER_SOURCE).await?;

        self.compile(&classes_dir, &[class_file, launcher_file], context, out)
            .await?;

        let mut class_path = OsString::from(classes_dir.as_os_str());
        if let Some(extra) = context.class_path() {
            class_path.push(crate::classpath::PATH_SEPARATOR.to_string());
            class_path.push(extra);
        }

        info!("Running {} with {} argument(s)", class_name, args.len());

        let mut child = Command::new(&self.java)
            .arg("-cp")
            .arg(&class_path)
            .arg(LAUNCHER_CLASS)
            .arg(&class_name)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(&self.java, e))?;

        let (tx, mut rx) = mpsc::channel::<Vec<u8>>(32);
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward(stderr, tx.clone()));
        }
        drop(tx);

        while let Some(chunk) = rx.recv().await {
            write_to(out, &chunk).await?;
        }

        let status = child
            .wait()
            .await
            .map_err(|e| JGrabError::command_failed(self.java.display().to_string(), e))?;

        if status.success() {
            Ok(())
        } else {
            Err(JGrabError::ProgramFailed(status.code().unwrap_or(-1)))
        }
    }

    async fn runtime_version(&self) -> String {
        let output = Command::new(&self.java)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match output {
            Ok(output) => {
                // `java -version` reports on stderr
                let text = if output.stderr.is_empty() {
                    String::from_utf8_lossy(&output.stdout).into_owned()
                } else {
                    String::from_utf8_lossy(&output.stderr).into_owned()
                };
                let first = text.lines().next().unwrap_or("unknown").trim().to_string();
                format!("Java Version: {}", first)
            }
            Err(_) => format!("Java Version: unavailable ({})", self.java.display()),
        }
    }

    fn name(&self) -> &'static str {
        "java"
    }
}

/// Turn a snippet into a class whose `run` prints the snippet's value.
///
/// Code ending in `;` is treated as statements and gets `return null;`
/// appended unless its last line already returns. Anything else is an
/// expression whose value is returned. Leading `import` lines are kept
/// outside the generated class.
pub fn wrap_snippet(snippet: &str) -> String {
    let snippet = snippet.trim();

    let mut imports = Vec::new();
    let mut body_lines = Vec::new();
    for line in snippet.lines() {
        if body_lines.is_empty() && line.trim_start().starts_with("import ") {
            imports.push(line.trim());
        } else {
            body_lines.push(line);
        }
    }
    let body = body_lines.join("\n");
    let body = body.trim();

    let body = if body.ends_with(';') {
        let last_line = body.rsplit('\n').next().unwrap_or(body);
        if last_line.contains("return") {
            body.to_string()
        } else {
            format!("{}\nreturn null;", body)
        }
    } else {
        format!("return {};", body)
    };

    let mut source = String::new();
    for import in imports {
        source.push_str(import);
        source.push('\n');
    }
    source.push_str(&format!(
        r#"
public class {class} implements Runnable {{
    public void run() {{
        try {{
            Object result = value();
            if (result != null) {{
                System.out.println(result);
            }}
        }} catch (RuntimeException | Error e) {{
            throw e;
        }} catch (Throwable t) {{
            throw new RuntimeException(t);
        }}
    }}

    private static Object value() throws Throwable {{
{body}
    }}
}}
"#,
        class = SNIPPET_CLASS,
        body = body
    ));
    source
}

fn simple_name(class_name: &str) -> &str {
    class_name.rsplit('.').next().unwrap_or(class_name)
}

fn tool(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

async fn write_source(path: &Path, source: &str) -> JGrabResult<()> {
    tokio::fs::write(path, source)
        .await
        .map_err(|e| JGrabError::io(format!("writing {}", path.display()), e))
}

async fn write_to(out: &mut (dyn AsyncWrite + Unpin + Send), bytes: &[u8]) -> JGrabResult<()> {
    if bytes.is_empty() {
        return Ok(());
    }
    out.write_all(bytes)
        .await
        .map_err(|e| JGrabError::io("writing program output", e))?;
    out.flush()
        .await
        .map_err(|e| JGrabError::io("flushing program output", e))
}

async fn forward<R>(mut reader: R, tx: mpsc::Sender<Vec<u8>>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; 8192];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).await.is_err() {
                    break;
                }
            }
        }
    }
}
