//! Pty driver: a composable helper embedded by concrete Runners (§9,
//! "shared pty driver as a composable helper struct"). Spawns a child over
//! a pseudo-terminal and drives the expect/send loop that every
//! interactive interpreter needs, independent of the language.

use crate::error::CoreError;
use crate::location::Where;
use anyhow::{Context, Result};
use portable_pty::{native_pty_system, CommandBuilder, PtySize};
use std::io::{Read, Write};
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Bytes collected by one `expect` call: `before` is everything that
/// arrived ahead of the prompt, `matched` is the prompt text itself.
pub struct ExpectMatch {
    pub before: Vec<u8>,
    pub matched: Vec<u8>,
}

/// Drives one interpreter child process over a pty. Owns the process, its
/// pty handles, and the raw-bytes buffer not yet consumed by an `expect`.
pub struct PtyDriver {
    master: Box<dyn portable_pty::MasterPty + Send>,
    writer: Box<dyn Write + Send>,
    child: Box<dyn portable_pty::Child + Send + Sync>,
    rx: mpsc::Receiver<Vec<u8>>,
    /// Raw bytes read from the pty but not yet matched against a prompt.
    pending: Vec<u8>,
    rows: u16,
    cols: u16,
    eof: bool,
}

impl PtyDriver {
    /// Spawn `cmd` attached to a pty of the given geometry, propagating
    /// `LINES`/`COLUMNS` into the child's environment (§4.6 "Geometry").
    pub fn spawn(mut cmd: CommandBuilder, rows: u16, cols: u16) -> Result<Self> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .context("failed to open pty")?;

        cmd.env("LINES", rows.to_string());
        cmd.env("COLUMNS", cols.to_string());

        let child = pair
            .slave
            .spawn_command(cmd)
            .context("failed to spawn interpreter child")?;
        drop(pair.slave);

        let mut reader = pair.master.try_clone_reader().context("failed to clone pty reader")?;
        let writer = pair.master.take_writer().context("failed to take pty writer")?;

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            master: pair.master,
            writer,
            child,
            rx,
            pending: Vec::new(),
            rows,
            cols,
            eof: false,
        })
    }

    pub fn send_line(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Send a control character, e.g. `send_control(b'c')` for ctrl-C.
    pub fn send_control(&mut self, letter: u8) -> Result<()> {
        let code = letter.to_ascii_uppercase().wrapping_sub(b'@');
        self.writer.write_all(&[code])?;
        self.writer.flush()?;
        Ok(())
    }

    fn drain_available(&mut self) {
        while let Ok(chunk) = self.rx.try_recv() {
            self.pending.extend_from_slice(&chunk);
        }
    }

    /// Block until `re` matches the accumulated raw buffer or `timeout`
    /// elapses, returning the text before the prompt and the prompt text
    /// itself, and leaving anything after the match in `pending`.
    pub fn expect(&mut self, re: &regex::Regex, timeout: Duration, at: &Where) -> Result<ExpectMatch, CoreError> {
        let deadline = Instant::now() + timeout;
        loop {
            self.drain_available();
            if let Ok(text) = std::str::from_utf8(&self.pending) {
                if let Some(m) = re.find(text) {
                    let before = self.pending[..m.start()].to_vec();
                    let matched = self.pending[m.start()..m.end()].to_vec();
                    self.pending.drain(..m.end());
                    return Ok(ExpectMatch { before, matched });
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                let partial = String::from_utf8_lossy(&self.pending).into_owned();
                return Err(CoreError::Timeout {
                    at: at.clone(),
                    partial_output: partial,
                });
            }

            match self.rx.recv_timeout(remaining.min(Duration::from_millis(50))) {
                Ok(chunk) => self.pending.extend_from_slice(&chunk),
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    self.eof = true;
                }
            }
        }
    }

    /// Like [`Self::expect`], but reinterprets the timeout as "no output
    /// for `idle_timeout`" rather than a single hard deadline (`§4.6`
    /// `stop_on_silence`).
    pub fn expect_with_idle_timeout(
        &mut self,
        re: &regex::Regex,
        overall_timeout: Duration,
        idle_timeout: Duration,
        at: &Where,
    ) -> Result<ExpectMatch, CoreError> {
        let deadline = Instant::now() + overall_timeout;
        let mut last_progress = Instant::now();
        loop {
            self.drain_available();
            if let Ok(text) = std::str::from_utf8(&self.pending) {
                if let Some(m) = re.find(text) {
                    let before = self.pending[..m.start()].to_vec();
                    let matched = self.pending[m.start()..m.end()].to_vec();
                    self.pending.drain(..m.end());
                    return Ok(ExpectMatch { before, matched });
                }
            }

            if Instant::now() >= deadline {
                let partial = String::from_utf8_lossy(&self.pending).into_owned();
                return Err(CoreError::Timeout {
                    at: at.clone(),
                    partial_output: partial,
                });
            }
            if Instant::now().saturating_duration_since(last_progress) >= idle_timeout {
                let partial = String::from_utf8_lossy(&self.pending).into_owned();
                return Err(CoreError::Timeout {
                    at: at.clone(),
                    partial_output: partial,
                });
            }

            match self.rx.recv_timeout(Duration::from_millis(50)) {
                Ok(chunk) => {
                    self.pending.extend_from_slice(&chunk);
                    last_progress = Instant::now();
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => self.eof = true,
            }
        }
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }

    pub fn take_pending_as_string(&mut self) -> String {
        let s = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        s
    }

    pub fn geometry(&self) -> (u16, u16) {
        (self.rows, self.cols)
    }

    /// Resize the pty and the child's notion of its window. `force` always
    /// invokes the resize even when the geometry is unchanged (§4.6).
    pub fn resize(&mut self, rows: u16, cols: u16, force: bool) -> Result<()> {
        if !force && (rows, cols) == (self.rows, self.cols) {
            return Ok(());
        }
        self.master
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .context("failed to resize pty")?;
        self.rows = rows;
        self.cols = cols;
        Ok(())
    }

    /// Resize to `(rows, cols)` for the lifetime of the returned guard,
    /// restoring the prior geometry (forced) on drop (§4.6 "a context-scoped
    /// geometry change ... restoring on exit").
    pub fn scoped_resize(&mut self, rows: u16, cols: u16) -> Result<ResizeGuard<'_>> {
        let previous = self.geometry();
        self.resize(rows, cols, true)?;
        Ok(ResizeGuard { driver: self, previous })
    }

    /// Send EOF, give the child a moment to exit, then force-terminate.
    pub fn shutdown(&mut self, grace: Duration) -> Result<()> {
        drop(std::mem::replace(&mut self.writer, Box::new(std::io::sink())));
        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            if matches!(self.child.try_wait(), Ok(Some(_))) {
                return Ok(());
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        let _ = self.child.kill();
        Ok(())
    }
}

/// Restores the geometry that was active before [`PtyDriver::scoped_resize`],
/// forcing the resize even if it happens to match.
pub struct ResizeGuard<'a> {
    driver: &'a mut PtyDriver,
    previous: (u16, u16),
}

impl Drop for ResizeGuard<'_> {
    fn drop(&mut self) {
        let _ = self.driver.resize(self.previous.0, self.previous.1, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawns_a_shell_and_captures_output_before_a_prompt() {
        let mut cmd = CommandBuilder::new("/bin/sh");
        cmd.arg("-i");
        let mut driver = PtyDriver::spawn(cmd, 24, 80).unwrap();
        driver.send_line("echo marker_word").unwrap();
        let re = regex::Regex::new("marker_word").unwrap();
        let at = Where::new(1, 1, "test");
        driver.expect(&re, Duration::from_secs(5), &at).unwrap();
        driver.shutdown(Duration::from_millis(200)).unwrap();
    }

    #[test]
    fn scoped_resize_restores_geometry_on_drop() {
        let cmd = CommandBuilder::new("/bin/sh");
        let mut driver = PtyDriver::spawn(cmd, 24, 80).unwrap();
        assert_eq!(driver.geometry(), (24, 80));
        {
            let _guard = driver.scoped_resize(40, 120).unwrap();
        }
        assert_eq!(driver.geometry(), (24, 80));
        driver.shutdown(Duration::from_millis(200)).unwrap();
    }
}
