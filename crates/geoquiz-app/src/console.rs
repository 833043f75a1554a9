use geoquiz_engine::{Player, Prompt};
use std::io::{self, BufRead, Stdout, StdinLock, Write};

const ANSWER_PROMPT: &str = "Y/N? ";

/// Map a line of player input to an answer. Case and surrounding whitespace
/// are ignored; anything but yes/y/no/n is `None`.
pub fn parse_answer(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" => Some(true),
        "no" | "n" => Some(false),
        _ => None,
    }
}

/// Line-oriented player on any reader/writer pair.
pub struct ConsolePlayer<R, W> {
    input: R,
    output: W,
}

impl ConsolePlayer<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsolePlayer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Player for ConsolePlayer<R, W> {
    fn ask(&mut self, prompt: &Prompt<'_>) -> io::Result<bool> {
        write!(
            self.output,
            "{}\n\n{}\n\n",
            prompt.header(),
            prompt.question.text
        )?;

        let mut line = String::new();
        loop {
            write!(self.output, "{ANSWER_PROMPT}")?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "input closed before an answer was given",
                ));
            }
            if let Some(answer) = parse_answer(&line) {
                writeln!(self.output)?;
                return Ok(answer);
            }
        }
    }
}
