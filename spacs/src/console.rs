use crate::errors::AttemptError;
use crate::notify::Notify;
use crate::outputs::Blink;
use crate::terminal::Terminal;
use fpm_rs::{Match, Transport};
use std::io::{self, BufRead, Write};

/// A single-character operator command.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Command {
    /// `a`: enroll into the next free slot and report it.
    AutoEnroll,
    /// `d`: enroll into an operator-chosen slot, no report.
    ManualEnroll,
    /// `l`: identify, open the relay and report.
    Login,
    Unknown(char),
}

impl Command {
    /// Reads the first character of a line, case-insensitively. Blank lines
    /// carry no command.
    pub fn parse(line: &str) -> Option<Command> {
        let first = line.trim().chars().next()?;

        Some(match first.to_ascii_lowercase() {
            'a' => Command::AutoEnroll,
            'd' => Command::ManualEnroll,
            'l' => Command::Login,
            other => Command::Unknown(other),
        })
    }
}

/// What a dispatched command ended up doing.
#[derive(Debug)]
pub enum Outcome {
    Enrolled(Result<u16, AttemptError>),
    LoggedIn(Result<Match, AttemptError>),
    Rejected(char),
    /// Input ended while waiting for a manual slot id.
    Abandoned,
}

/// Parses a manual slot id in `1..=capacity`. The whole trimmed line must be
/// a number: `"12abc"` is rejected rather than read as 12.
pub fn parse_slot_id(input: &str, capacity: u16) -> Result<u16, AttemptError> {
    let invalid = || AttemptError::InvalidId {
        input: input.trim().to_string(),
        capacity,
    };

    match input.trim().parse::<u16>() {
        Ok(id) if id >= 1 && id <= capacity => Ok(id),
        _ => Err(invalid()),
    }
}

/// Operator console: reads commands from `input`, writes prompts to `output`.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Console { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.output, "Ready for commands:")?;
        writeln!(self.output, "  'a' - Auto enroll & notify server")?;
        writeln!(self.output, "  'd' - Manual enroll by ID (no server notify)")?;
        writeln!(self.output, "  'l' - Login & notify server")?;
        self.output.flush()
    }

    /// Serves commands until the input ends.
    pub fn run<T: Transport, N: Notify>(&mut self, terminal: &mut Terminal<T, N>) -> io::Result<()> {
        self.print_menu()?;

        while let Some(line) = self.read_line()? {
            if let Some(command) = Command::parse(&line) {
                self.dispatch(command, terminal)?;
            }
        }

        log::info!("Console input closed");
        Ok(())
    }

    pub fn dispatch<T: Transport, N: Notify>(
        &mut self,
        command: Command,
        terminal: &mut Terminal<T, N>,
    ) -> io::Result<Outcome> {
        let outcome = match command {
            Command::AutoEnroll => Outcome::Enrolled(terminal.auto_enroll()),
            Command::ManualEnroll => {
                let capacity = terminal.capacity();
                writeln!(
                    self.output,
                    "Enter ID (1-{}) for manual enrollment:",
                    capacity
                )?;
                self.output.flush()?;

                let line = match self.read_line()? {
                    Some(line) => line,
                    None => return Ok(Outcome::Abandoned),
                };
                match parse_slot_id(&line, capacity) {
                    Ok(id) => Outcome::Enrolled(terminal.enroll(id, false).map(|()| id)),
                    Err(e) => {
                        writeln!(self.output, "Invalid ID.")?;
                        log::warn!("{}", e);
                        terminal.signal(Blink::INVALID_INPUT);
                        Outcome::Enrolled(Err(e))
                    }
                }
            }
            Command::Login => Outcome::LoggedIn(terminal.identify()),
            Command::Unknown(c) => {
                writeln!(self.output, "Unknown command: {}", c)?;
                Outcome::Rejected(c)
            }
        };

        match &outcome {
            Outcome::Enrolled(Ok(id)) => writeln!(self.output, "Enrolled ID #{}", id)?,
            Outcome::LoggedIn(Ok(found)) => writeln!(
                self.output,
                "Welcome, ID #{} (confidence {})",
                found.id, found.confidence
            )?,
            Outcome::Enrolled(Err(AttemptError::InvalidId { .. })) => {}
            Outcome::Enrolled(Err(e)) | Outcome::LoggedIn(Err(e)) => {
                writeln!(self.output, "Failed: {}. Please try again.", e)?
            }
            Outcome::Rejected(_) | Outcome::Abandoned => {}
        }
        self.output.flush()?;

        Ok(outcome)
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();

        if self.input.read_line(&mut line)? == 0 {
            Ok(None)
        } else {
            Ok(Some(line))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Event;
    use crate::terminal::tests::terminal;
    use fpm_rs::sim::Reading;
    use std::io::Cursor;

    fn console(input: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn printed(console: Console<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(console.into_output()).unwrap()
    }

    #[test]
    fn command_table() {
        assert_eq!(Command::parse("a\n"), Some(Command::AutoEnroll));
        assert_eq!(Command::parse("D"), Some(Command::ManualEnroll));
        assert_eq!(Command::parse(" l "), Some(Command::Login));
        assert_eq!(Command::parse("login"), Some(Command::Login));
        assert_eq!(Command::parse("x"), Some(Command::Unknown('x')));
        assert_eq!(Command::parse("  \n"), None);
    }

    #[test]
    fn slot_ids_are_bounded_by_capacity() {
        assert_eq!(parse_slot_id("1\n", 127).unwrap(), 1);
        assert_eq!(parse_slot_id(" 127 ", 127).unwrap(), 127);
        assert!(parse_slot_id("0", 127).is_err());
        assert!(parse_slot_id("128", 127).is_err());
        assert!(parse_slot_id("-3", 127).is_err());
        assert!(parse_slot_id("seven", 127).is_err());
        assert!(parse_slot_id("12abc", 127).is_err());
    }

    #[test]
    fn unknown_command_is_echoed() {
        let mut terminal = terminal(127);
        let mut console = console("");

        match console.dispatch(Command::Unknown('z'), &mut terminal).unwrap() {
            Outcome::Rejected('z') => {}
            other => panic!("unexpected {:?}", other),
        }
        assert!(printed(console).contains("Unknown command: z"));
    }

    #[test]
    fn a_enrolls_into_next_slot_and_reports() {
        let mut terminal = terminal(127);
        terminal
            .sensor_mut()
            .transport_mut()
            .script(vec![Reading::Finger(1), Reading::NoFinger, Reading::Finger(1)]);
        let mut console = console("");

        match console.dispatch(Command::AutoEnroll, &mut terminal).unwrap() {
            Outcome::Enrolled(Ok(1)) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(terminal.notifier().events, vec![Event::Enrolled { id: 1 }]);
    }

    #[test]
    fn d_reads_the_slot_from_the_next_line() {
        let mut terminal = terminal(127);
        terminal
            .sensor_mut()
            .transport_mut()
            .script(vec![Reading::Finger(1), Reading::NoFinger, Reading::Finger(1)]);
        let mut console = console("42\n");

        match console.dispatch(Command::ManualEnroll, &mut terminal).unwrap() {
            Outcome::Enrolled(Ok(42)) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(terminal.sensor().transport().stored(42), Some(1));
        assert!(terminal.notifier().events.is_empty());
        assert!(printed(console).contains("Enter ID (1-127) for manual enrollment:"));
    }

    #[test]
    fn d_with_invalid_slot_never_captures() {
        let mut terminal = terminal(127);
        let mut console = console("500\n");

        match console.dispatch(Command::ManualEnroll, &mut terminal).unwrap() {
            Outcome::Enrolled(Err(AttemptError::InvalidId { .. })) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert!(terminal.sensor().transport().instructions().is_empty());
        assert!(printed(console).contains("Invalid ID."));
    }

    #[test]
    fn l_identifies() {
        let mut terminal = terminal(127);
        terminal.sensor_mut().transport_mut().preload(5, 77);
        terminal
            .sensor_mut()
            .transport_mut()
            .script(vec![Reading::Finger(77)]);
        let mut console = console("");

        match console.dispatch(Command::Login, &mut terminal).unwrap() {
            Outcome::LoggedIn(Ok(found)) => assert_eq!(found.id, 5),
            other => panic!("unexpected {:?}", other),
        }
        assert!(printed(console).contains("Welcome, ID #5"));
    }

    #[test]
    fn run_serves_until_input_ends() {
        let mut terminal = terminal(127);
        terminal.sensor_mut().transport_mut().preload(2, 8);
        terminal
            .sensor_mut()
            .transport_mut()
            .script(vec![Reading::Finger(8)]);
        let mut console = console("\nq\nL\n");

        console.run(&mut terminal).unwrap();

        let text = printed(console);
        assert!(text.starts_with("Ready for commands:"));
        assert!(text.contains("Unknown command: q"));
        assert_eq!(
            terminal.notifier().events,
            vec![Event::Login {
                id: 2,
                confidence: fpm_rs::sim::MATCH_CONFIDENCE
            }]
        );
    }
}
