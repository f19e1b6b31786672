// src/exec/stdin.rs

//! Writing click commands into the stdin of a running continuous command.

use std::io::{self, ErrorKind, Write};

use tracing::warn;

/// How often a full pipe is retried before the rest of a line is dropped.
pub const MAX_WOULD_BLOCK_RETRIES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineWrite {
    pub written: usize,
    pub dropped: usize,
}

/// Write `line` plus a newline to a non-blocking writer.
///
/// `Interrupted` is retried without limit; `WouldBlock` at most
/// [`MAX_WOULD_BLOCK_RETRIES`] times, after which the unwritten tail is
/// dropped. Any other error is returned.
pub fn write_line<W: Write + ?Sized>(w: &mut W, line: &str) -> io::Result<LineWrite> {
    let mut bytes = Vec::with_capacity(line.len() + 1);
    bytes.extend_from_slice(line.as_bytes());
    bytes.push(b'\n');

    let mut written = 0;
    let mut blocked = 0;
    while written < bytes.len() {
        match w.write(&bytes[written..]) {
            Ok(0) => return Err(ErrorKind::WriteZero.into()),
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                blocked += 1;
                if blocked > MAX_WOULD_BLOCK_RETRIES {
                    let dropped = bytes.len() - written;
                    warn!(written, dropped, "stdin pipe full; dropping rest of line");
                    return Ok(LineWrite { written, dropped });
                }
                std::thread::yield_now();
            }
            Err(e) => return Err(e),
        }
    }

    Ok(LineWrite {
        written,
        dropped: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts `accept` bytes per call, then reports a full pipe forever.
    struct Choked {
        got: Vec<u8>,
        budget: usize,
        accept: usize,
        interrupts: usize,
    }

    impl Write for Choked {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.interrupts > 0 {
                self.interrupts -= 1;
                return Err(ErrorKind::Interrupted.into());
            }
            if self.budget == 0 {
                return Err(ErrorKind::WouldBlock.into());
            }
            let n = buf.len().min(self.accept).min(self.budget);
            self.budget -= n;
            self.got.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_the_line_and_a_newline_across_short_writes() {
        let mut w = Choked {
            got: Vec::new(),
            budget: usize::MAX,
            accept: 3,
            interrupts: 2,
        };
        let r = write_line(&mut w, "volume up").unwrap();
        assert_eq!(r, LineWrite { written: 10, dropped: 0 });
        assert_eq!(w.got, b"volume up\n");
    }

    #[test]
    fn full_pipe_drops_the_tail_instead_of_spinning() {
        let mut w = Choked {
            got: Vec::new(),
            budget: 4,
            accept: 100,
            interrupts: 0,
        };
        let r = write_line(&mut w, "abcdefgh").unwrap();
        assert_eq!(r, LineWrite { written: 4, dropped: 5 });
        assert_eq!(w.got, b"abcd");
    }

    #[test]
    fn hard_errors_are_returned() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(ErrorKind::BrokenPipe.into())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let err = write_line(&mut Broken, "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BrokenPipe);
    }
}
