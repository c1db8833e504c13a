//! 流式命令执行（search / show / install）

use super::parser::clean_terminal_output;
use crate::error::{Error, Result};
use std::io::{ErrorKind, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// 只读 stdout，stderr 丢弃（search / show）
    StdoutOnly,
    /// stdout 与 stderr 都作为日志行转发（install）
    Merged,
}

/// 正在运行的子进程，输出行可以在进程退出前逐行读取
pub struct StreamingChild {
    program: String,
    child: Child,
    lines: mpsc::Receiver<String>,
    readers: Vec<thread::JoinHandle<()>>,
}

impl StreamingChild {
    pub fn program(&self) -> &str {
        &self.program
    }

    /// 阻塞等待下一行；所有输出流关闭后返回 None。
    ///
    /// 行 channel 是 std 的阻塞 channel，在 tokio 运行时内调用也不会 panic。
    pub fn next_line(&mut self) -> Option<String> {
        self.lines.recv().ok()
    }

    /// 等待读取线程结束后再等待进程退出
    pub fn wait(mut self) -> Result<ExitStatus> {
        for handle in self.readers.drain(..) {
            let _ = handle.join();
        }
        let status = self.child.wait()?;
        log::debug!("{} exited: {:?}", self.program, status.code());
        Ok(status)
    }
}

/// 一次性收集的命令输出
#[derive(Debug)]
pub struct Captured {
    pub lines: Vec<String>,
    pub status: ExitStatus,
}

/// 启动命令并把输出拆成行送入 channel
pub fn spawn(program: &str, args: &[String], mode: OutputMode) -> Result<StreamingChild> {
    log::debug!("spawning: {} {}", program, args.join(" "));

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(match mode {
        OutputMode::StdoutOnly => Stdio::null(),
        OutputMode::Merged => Stdio::piped(),
    });

    let mut child = cmd.spawn().map_err(|source| Error::Spawn {
        program: program.to_string(),
        source,
    })?;

    let (tx, rx) = mpsc::channel();
    let mut readers = Vec::with_capacity(2);

    if let Some(stdout) = child.stdout.take() {
        let tx = tx.clone();
        readers.push(thread::spawn(move || read_stream_lines(stdout, &tx)));
    }
    if let Some(stderr) = child.stderr.take() {
        let tx = tx.clone();
        readers.push(thread::spawn(move || read_stream_lines(stderr, &tx)));
    }
    // 只保留读取线程持有的发送端，流关闭后 receiver 才会结束
    drop(tx);

    Ok(StreamingChild {
        program: program.to_string(),
        child,
        lines: rx,
        readers,
    })
}

/// 运行命令至结束，收集 stdout 的全部行
pub fn capture(program: &str, args: &[String]) -> Result<Captured> {
    let mut child = spawn(program, args, OutputMode::StdoutOnly)?;
    let mut lines = Vec::new();
    while let Some(line) = child.next_line() {
        lines.push(line);
    }
    let status = child.wait()?;
    Ok(Captured { lines, status })
}

/// 从流中读取行并发送到 channel
fn read_stream_lines(mut reader: impl Read, tx: &mpsc::Sender<String>) {
    let mut splitter = LineSplitter::default();
    let mut buffer = [0u8; 1024];

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                for line in splitter.feed(&buffer[..n]) {
                    if tx.send(line).is_err() {
                        return;
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                log::warn!("read_stream_lines: {}", e);
                break;
            }
        }
    }

    if let Some(line) = splitter.finish() {
        let _ = tx.send(line);
    }
}

/// 按字节拆行，避免多字节字符被 1024 字节的块边界截断。
///
/// `\n` 与 `\r\n` 结束一行；单独的 `\r` 是 winget 的转圈/进度条重绘，整段丢弃。
#[derive(Debug, Default)]
struct LineSplitter {
    buf: Vec<u8>,
    pending_cr: bool,
}

impl LineSplitter {
    fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut out = Vec::new();
        for &b in bytes {
            if self.pending_cr {
                self.pending_cr = false;
                if b == b'\n' {
                    out.push(self.take_line());
                    continue;
                }
                self.discard_redraw();
            }
            match b {
                b'\n' => out.push(self.take_line()),
                b'\r' => self.pending_cr = true,
                _ => self.buf.push(b),
            }
        }
        out
    }

    fn finish(&mut self) -> Option<String> {
        if self.pending_cr || !self.buf.is_empty() {
            self.pending_cr = false;
            Some(self.take_line())
        } else {
            None
        }
    }

    fn take_line(&mut self) -> String {
        let line = clean_terminal_output(&String::from_utf8_lossy(&self.buf));
        self.buf.clear();
        line
    }

    fn discard_redraw(&mut self) {
        if !self.buf.is_empty() {
            log::trace!("redraw: {}", String::from_utf8_lossy(&self.buf));
            self.buf.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crlf_and_lf_both_end_lines() {
        let mut s = LineSplitter::default();
        let lines = s.feed(b"first\r\nsecond\nthird");
        assert_eq!(lines, ["first", "second"]);
        assert_eq!(s.finish().as_deref(), Some("third"));
        assert_eq!(s.finish(), None);
    }

    #[test]
    fn bare_cr_segments_are_dropped() {
        let mut s = LineSplitter::default();
        let lines = s.feed(b"   - \r   \\ \r   | \rName   Id\r\n");
        assert_eq!(lines, ["Name   Id"]);
    }

    #[test]
    fn crlf_split_across_chunks() {
        let mut s = LineSplitter::default();
        assert!(s.feed(b"Found it\r").is_empty());
        assert_eq!(s.feed(b"\nnext\n"), ["Found it", "next"]);
    }

    #[test]
    fn multibyte_char_split_across_chunks() {
        let text = "Visual Studio Code…\n".as_bytes();
        let cut = text.len() - 2;
        let mut s = LineSplitter::default();
        assert!(s.feed(&text[..cut]).is_empty());
        assert_eq!(s.feed(&text[cut..]), ["Visual Studio Code…"]);
    }

    #[test]
    fn blank_lines_are_kept() {
        let mut s = LineSplitter::default();
        assert_eq!(s.feed(b"a\n\nb\n"), ["a", "", "b"]);
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let err = capture("winget-pilot-definitely-missing", &[]).unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn capture_collects_stdout_and_status() {
        let args = vec!["-c".to_string(), "printf 'one\\ntwo\\n'; echo hidden >&2; exit 4".to_string()];
        let out = capture("sh", &args).unwrap();
        assert_eq!(out.lines, ["one", "two"]);
        assert_eq!(out.status.code(), Some(4));
    }

    #[cfg(unix)]
    #[test]
    fn merged_mode_forwards_stderr() {
        let args = vec!["-c".to_string(), "echo out; echo err >&2".to_string()];
        let mut child = spawn("sh", &args, OutputMode::Merged).unwrap();
        let mut lines = Vec::new();
        while let Some(line) = child.next_line() {
            lines.push(line);
        }
        assert!(child.wait().unwrap().success());
        lines.sort();
        assert_eq!(lines, ["err", "out"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn capture_inside_runtime_does_not_panic() {
        let args = vec!["-c".to_string(), "echo inside".to_string()];
        let out = capture("sh", &args).unwrap();
        assert_eq!(out.lines, ["inside"]);
        assert!(out.status.success());
    }
}
