//! Terminal stand-in for the platform notification center.

use std::io::{self, Write};

use chrono::Local;
use exercise_snack_core::{NotificationRequest, NotificationSink, SinkError, Trigger};

/// Writes delivered reminders as a small box with the action hints.
///
/// Silent in `--json` mode, where the event stream already carries them.
pub struct TerminalSink<W = io::Stdout> {
    out: W,
    quiet: bool,
}

impl TerminalSink {
    pub fn new(quiet: bool) -> Self {
        Self::with_writer(io::stdout(), quiet)
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn with_writer(out: W, quiet: bool) -> Self {
        Self { out, quiet }
    }
}

impl<W: Write + Send> NotificationSink for TerminalSink<W> {
    fn deliver(&mut self, request: &NotificationRequest) -> Result<(), SinkError> {
        if self.quiet {
            return Ok(());
        }
        writeln!(self.out, "{}", render(request))
            .and_then(|()| self.out.flush())
            .map_err(|e| SinkError::DeliveryFailed {
                identifier: request.identifier.clone(),
                message: e.to_string(),
            })
    }
}

/// Boxed rendering of a notification with its actions.
pub fn render(request: &NotificationRequest) -> String {
    let when = match request.trigger {
        Trigger::At(at) => at.with_timezone(&Local).format("%H:%M").to_string(),
        Trigger::Immediate => "now".to_string(),
    };
    let header = format!("{} ({when})", request.title);
    let actions = request
        .actions
        .iter()
        .map(|a| format!("[{}]", a.title))
        .collect::<Vec<_>>()
        .join(" ");
    let hint = format!("reply: snooze|done|dismiss {}", request.identifier);

    let width = [&header, &request.body, &actions, &hint]
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    let border = format!("+{}+", "-".repeat(width + 2));
    let row = |line: &str| format!("| {line}{} |", " ".repeat(width - line.chars().count()));

    [
        border.clone(),
        row(&header),
        row(&request.body),
        row(&actions),
        row(&hint),
        border,
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_boxes_every_line_to_the_same_width() {
        let request = NotificationRequest::immediate("reminder-11", "Break time!", "Walk around for 2 minutes");
        let rendered = render(&request);
        let widths: Vec<usize> = rendered.lines().map(|l| l.chars().count()).collect();
        assert_eq!(widths.len(), 6);
        assert!(widths.iter().all(|w| *w == widths[0]));
        assert!(rendered.contains("Break time! (now)"));
        assert!(rendered.contains("[Do it now] [Snooze]"));
        assert!(rendered.contains("snooze|done|dismiss reminder-11"));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn quiet_sink_still_succeeds() {
        let mut sink = TerminalSink::with_writer(BrokenPipe, true);
        let request = NotificationRequest::immediate("reminder-9", "Hi", "Body");
        assert!(sink.deliver(&request).is_ok());
    }

    #[test]
    fn sink_writes_rendered_box() {
        let mut sink = TerminalSink::with_writer(Vec::new(), false);
        let request = NotificationRequest::immediate("reminder-9", "Hi", "Body");
        sink.deliver(&request).unwrap();
        let written = String::from_utf8(sink.out).unwrap();
        assert_eq!(written, format!("{}\n", render(&request)));
    }

    #[test]
    fn write_failure_is_a_delivery_error() {
        let mut sink = TerminalSink::with_writer(BrokenPipe, false);
        let request = NotificationRequest::immediate("reminder-9", "Hi", "Body");
        let err = sink.deliver(&request).unwrap_err();
        assert!(matches!(
            err,
            SinkError::DeliveryFailed { ref identifier, .. } if identifier == "reminder-9"
        ));
    }
}
