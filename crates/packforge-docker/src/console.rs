use std::io::Write;

/// Operator-facing output: progress and container logs on `out`,
/// diagnostics on `err`. Every write is flushed immediately so lines reach
/// the operator in arrival order.
///
/// A failed write is logged and otherwise ignored; losing a progress line
/// must not fail a packaging run.
pub struct Console<'a> {
    out: &'a mut (dyn Write + Send),
    err: &'a mut (dyn Write + Send),
}

impl<'a> Console<'a> {
    pub fn new(out: &'a mut (dyn Write + Send), err: &'a mut (dyn Write + Send)) -> Self {
        Self { out, err }
    }

    /// Write `text` to stdout, adding a newline unless it already ends in one.
    pub fn line(&mut self, text: &str) {
        write_line(self.out, text);
    }

    /// Same as [`Console::line`], on the error channel.
    pub fn error_line(&mut self, text: &str) {
        write_line(self.err, text);
    }

    /// Forward raw container output byte for byte. Frames may split a
    /// multibyte character, so nothing is decoded here.
    pub fn forward(&mut self, bytes: &[u8]) {
        write_flushed(self.out, bytes);
    }

    /// Same as [`Console::forward`], on the error channel.
    pub fn forward_error(&mut self, bytes: &[u8]) {
        write_flushed(self.err, bytes);
    }
}

fn write_line(w: &mut (dyn Write + Send), text: &str) {
    if text.ends_with('\n') {
        write_flushed(w, text.as_bytes());
    } else {
        let mut owned = String::with_capacity(text.len() + 1);
        owned.push_str(text);
        owned.push('\n');
        write_flushed(w, owned.as_bytes());
    }
}

fn write_flushed(w: &mut (dyn Write + Send), bytes: &[u8]) {
    if let Err(e) = w.write_all(bytes).and_then(|()| w.flush()) {
        tracing::warn!(error = %e, "failed to write operator output");
    }
}
