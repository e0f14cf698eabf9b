//! Tagger backed by a long-lived external process
//!
//! The process reads one JSON request per line on stdin and answers with
//! one JSON response per line on stdout:
//!
//! ```text
//! -> {"texts": ["Herr talman !", "Jag yrkar bifall ."]}
//! <- {"documents": [{"token": [...], "lemma": [...], "pos": [...], "xpos": [...],
//!                    "num_tokens": 3, "num_words": 2}, ...]}
//! <- {"error": "model not loaded"}
//! ```
//!
//! The process is started on first use and reused for every later call,
//! since loading a tagging model is slow.

use super::{TaggedDocument, Tagger, TaggerError, TaggerResult};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// How to launch the tagger process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubprocessTaggerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl SubprocessTaggerConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

#[derive(Serialize)]
struct TagRequest<'a> {
    texts: &'a [String],
}

#[derive(Deserialize)]
struct TagResponse {
    #[serde(default)]
    documents: Option<Vec<TaggedDocument>>,
    #[serde(default)]
    error: Option<String>,
}

/// A running tagger process
struct Session {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Session {
    fn start(config: &SubprocessTaggerConfig) -> TaggerResult<Self> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        if let Some(dir) = &config.working_dir {
            cmd.current_dir(dir);
        }

        let mut process = cmd.spawn().map_err(|e| {
            TaggerError::Unavailable(format!("failed to start '{}': {}", config.command, e))
        })?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| TaggerError::Unavailable("no stdin available".to_string()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| TaggerError::Unavailable("no stdout available".to_string()))?;

        info!(command = %config.command, pid = process.id(), "tagger process started");

        Ok(Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    fn call(&mut self, texts: &[String]) -> TaggerResult<Vec<TaggedDocument>> {
        let request = serde_json::to_string(&TagRequest { texts })
            .map_err(|e| TaggerError::Failed(format!("failed to serialize request: {}", e)))?;

        self.stdin
            .write_all(request.as_bytes())
            .and_then(|_| self.stdin.write_all(b"\n"))
            .and_then(|_| self.stdin.flush())
            .map_err(|e| TaggerError::Unavailable(format!("failed to write request: {}", e)))?;

        let mut line = String::new();
        let read = self
            .stdout
            .read_line(&mut line)
            .map_err(|e| TaggerError::Unavailable(format!("failed to read response: {}", e)))?;
        if read == 0 {
            return Err(TaggerError::Unavailable(
                "tagger process closed its output".to_string(),
            ));
        }

        let response: TagResponse = serde_json::from_str(&line)
            .map_err(|e| TaggerError::Malformed(format!("failed to parse response: {}", e)))?;

        if let Some(error) = response.error {
            return Err(TaggerError::Failed(error));
        }
        response
            .documents
            .ok_or_else(|| TaggerError::Malformed("response has no documents".to_string()))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

/// Tagger that forwards batches of texts to an external process.
///
/// Calls are serialized through a mutex; the process handles one request
/// at a time. A session whose process died is discarded and restarted on
/// the next call.
pub struct SubprocessTagger {
    config: SubprocessTaggerConfig,
    session: Mutex<Option<Session>>,
}

impl std::fmt::Debug for SubprocessTagger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubprocessTagger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SubprocessTagger {
    /// Create a tagger; the process is started lazily on first use
    pub fn new(config: SubprocessTaggerConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
        }
    }

    /// Create a tagger and start its process immediately
    pub fn start(config: SubprocessTaggerConfig) -> TaggerResult<Self> {
        let session = Session::start(&config)?;
        Ok(Self {
            config,
            session: Mutex::new(Some(session)),
        })
    }

    pub fn config(&self) -> &SubprocessTaggerConfig {
        &self.config
    }
}

impl Tagger for SubprocessTagger {
    fn name(&self) -> &str {
        &self.config.command
    }

    fn tag(&self, texts: &[String]) -> TaggerResult<Vec<TaggedDocument>> {
        let mut guard = self
            .session
            .lock()
            .map_err(|_| TaggerError::Unavailable("tagger session lock poisoned".to_string()))?;

        if guard.is_none() {
            *guard = Some(Session::start(&self.config)?);
        }
        let session = guard
            .as_mut()
            .ok_or_else(|| TaggerError::Unavailable("tagger session missing".to_string()))?;

        debug!(texts = texts.len(), "sending texts to tagger process");
        match session.call(texts) {
            Err(TaggerError::Unavailable(reason)) => {
                warn!(command = %self.config.command, %reason, "tagger process lost");
                *guard = None;
                Err(TaggerError::Unavailable(reason))
            }
            result => result,
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str) -> SubprocessTaggerConfig {
        SubprocessTaggerConfig::new("sh").with_args(["-c", script])
    }

    #[test]
    fn missing_command_is_unavailable() {
        let tagger = SubprocessTagger::new(SubprocessTaggerConfig::new(
            "/nonexistent/riksprot-tagger-backend",
        ));
        let err = tagger.tag(&["x".to_string()]).unwrap_err();
        assert!(matches!(err, TaggerError::Unavailable(_)));
    }

    #[test]
    fn reads_documents_from_process() {
        let reply = r#"{"documents":[{"token":["Ja"],"lemma":["ja"],"pos":["IN"],"xpos":["IN"],"num_tokens":1,"num_words":1}]}"#;
        let tagger = SubprocessTagger::start(shell(&format!(
            "while read line; do echo '{}'; done",
            reply
        )))
        .unwrap();

        for _ in 0..2 {
            let documents = tagger.tag(&["Ja".to_string()]).unwrap();
            assert_eq!(documents.len(), 1);
            assert_eq!(documents[0].lemma, vec!["ja"]);
        }
    }

    #[test]
    fn error_response_is_failure() {
        let tagger = SubprocessTagger::new(shell(
            r#"while read line; do echo '{"error":"model not loaded"}'; done"#,
        ));
        let err = tagger.tag(&["x".to_string()]).unwrap_err();
        assert!(matches!(err, TaggerError::Failed(ref m) if m == "model not loaded"));
    }

    #[test]
    fn echoed_request_is_malformed() {
        let tagger = SubprocessTagger::new(SubprocessTaggerConfig::new("cat"));
        let err = tagger.tag(&["x".to_string()]).unwrap_err();
        assert!(matches!(err, TaggerError::Malformed(_)));
    }

    #[test]
    fn exited_process_is_unavailable() {
        let tagger = SubprocessTagger::new(shell("exit 0"));
        let err = tagger.tag(&["x".to_string()]).unwrap_err();
        assert!(matches!(err, TaggerError::Unavailable(_)));
    }
}
