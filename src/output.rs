use crate::runner::{InputResult, Outcome, RunResult};
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

pub struct Output {
    stdout: StandardStream,
    quiet: bool,
}

impl Output {
    pub fn new(color: bool, quiet: bool) -> Self {
        let color_choice = if color {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        Self {
            stdout: StandardStream::stdout(color_choice),
            quiet,
        }
    }

    fn set_color(&mut self, color: Color) {
        let _ = self.stdout.set_color(ColorSpec::new().set_fg(Some(color)));
    }

    fn set_dim(&mut self) {
        let _ = self.stdout.set_color(ColorSpec::new().set_dimmed(true));
    }

    fn reset(&mut self) {
        let _ = self.stdout.reset();
    }

    pub fn print_rendered(&mut self, rendered: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(self.stdout, "{}", rendered)
    }

    pub fn print_results(&mut self, run: &RunResult) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }

        for result in &run.results {
            self.print_result(result)?;
        }

        let total = run.results.len();
        let matched = run.matched();
        writeln!(self.stdout)?;
        self.set_color(if matched == total {
            Color::Green
        } else {
            Color::Red
        });
        write!(self.stdout, "{}/{} inputs matched", matched, total)?;
        self.reset();
        self.set_dim();
        writeln!(self.stdout, " in {:.2}s", run.elapsed.as_secs_f64())?;
        self.reset();
        Ok(())
    }

    fn print_result(&mut self, result: &InputResult) -> io::Result<()> {
        match &result.outcome {
            Outcome::Matched(values) => {
                self.set_color(Color::Green);
                write!(self.stdout, "✓")?;
                self.reset();
                writeln!(self.stdout, " {}", result.input)?;
                for (name, value) in values {
                    writeln!(self.stdout, "    {} = {}", name, value)?;
                }
            }
            Outcome::NoMatch => {
                self.set_color(Color::Red);
                write!(self.stdout, "✗")?;
                self.reset();
                writeln!(self.stdout, " {}", result.input)?;
            }
            Outcome::Failed(message) => {
                self.set_color(Color::Yellow);
                write!(self.stdout, "!")?;
                self.reset();
                writeln!(self.stdout, " {}: {}", result.input, message)?;
            }
        }
        Ok(())
    }
}
