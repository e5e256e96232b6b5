//! Interactive monitor shell
//!
//! A line-oriented command loop over the expression core: each input line
//! is split into a command name and an argument string and forwarded to a
//! handler. The shell renders results and error messages but owns no
//! evaluation state beyond the watchpoint registry it fronts; everything
//! machine-specific goes through the [`StepMachine`] it was given.
//!
//! Output is written to an injected [`Write`] sink so tests can capture it
//! instead of scraping stdout.

use crate::expr::eval::evaluate;
use crate::machine::{MachineState, StepMachine, WORD_BYTES};
use crate::watch::WatchpointRegistry;
use std::io::{self, BufRead, Write};

/// What the dispatch loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
}

/// Command table backing `help`; dispatch lives in [`Session::execute`].
const COMMANDS: &[(&str, &str)] = &[
    ("help", "Display information about all supported commands"),
    ("c", "Continue execution until the machine halts or a watchpoint fires"),
    ("q", "Quit the session"),
    ("si", "Step one instruction, or N instructions with `si N`"),
    ("info", "Show registers (`info r`) or watchpoints (`info w`)"),
    ("x", "Evaluate EXPR to an address and dump N words: `x N EXPR`"),
    ("p", "Evaluate EXPR and print its value: `p EXPR`"),
    ("w", "Watch EXPR for changes: `w EXPR`"),
    ("d", "Delete watchpoint N: `d N`"),
];

/// One debugging session: a machine under debug, its watchpoints, and an
/// output sink.
pub struct Session<M: StepMachine, W: Write> {
    machine: M,
    watchpoints: WatchpointRegistry,
    out: W,
}

impl<M: StepMachine> Session<M, io::Stdout> {
    pub fn new(machine: M) -> Self {
        Self::with_output(machine, io::stdout())
    }
}

impl<M: StepMachine, W: Write> Session<M, W> {
    pub fn with_output(machine: M, out: W) -> Self {
        Self {
            machine,
            watchpoints: WatchpointRegistry::new(),
            out,
        }
    }

    /// The machine under debug.
    pub fn machine(&self) -> &M {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut M {
        &mut self.machine
    }

    /// The output sink (tests capture a `Vec<u8>` through this).
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Read commands from `input` until end of stream or `q`.
    pub fn run<R: BufRead>(&mut self, input: R) -> io::Result<()> {
        let mut lines = input.lines();
        loop {
            write!(self.out, "(rsdb) ")?;
            self.out.flush()?;
            let Some(line) = lines.next() else { break };
            if self.execute(&line?)? == Outcome::Quit {
                break;
            }
        }
        Ok(())
    }

    /// Dispatch one command line. Empty lines are ignored.
    pub fn execute(&mut self, line: &str) -> io::Result<Outcome> {
        let line = line.trim();
        let Some(cmd) = line.split_whitespace().next() else {
            return Ok(Outcome::Continue);
        };
        let args = line[cmd.len()..].trim_start();

        match cmd {
            "help" => self.cmd_help(args),
            "c" => self.cmd_continue(),
            "q" => return Ok(Outcome::Quit),
            "si" => self.cmd_step(args),
            "info" => self.cmd_info(args),
            "x" => self.cmd_examine(args),
            "p" => self.cmd_print(args),
            "w" => self.cmd_watch(args),
            "d" => self.cmd_delete(args),
            _ => writeln!(self.out, "Unknown command '{}'", cmd),
        }?;
        Ok(Outcome::Continue)
    }

    fn cmd_help(&mut self, args: &str) -> io::Result<()> {
        if args.is_empty() {
            for (name, description) in COMMANDS {
                writeln!(self.out, "{} - {}", name, description)?;
            }
            return Ok(());
        }
        match COMMANDS.iter().find(|(name, _)| *name == args) {
            Some((name, description)) => writeln!(self.out, "{} - {}", name, description),
            None => writeln!(self.out, "Unknown command '{}'", args),
        }
    }

    fn cmd_continue(&mut self) -> io::Result<()> {
        self.step_machine(u64::MAX)
    }

    fn cmd_step(&mut self, args: &str) -> io::Result<()> {
        let count = if args.is_empty() {
            1
        } else {
            match args.parse::<u64>() {
                Ok(count) => count,
                Err(_) => return writeln!(self.out, "Bad step count '{}'", args),
            }
        };
        self.step_machine(count)
    }

    /// Step up to `count` times, checking watchpoints after every step and
    /// stopping early on a hit or a halt.
    fn step_machine(&mut self, count: u64) -> io::Result<()> {
        for _ in 0..count {
            if !self.machine.step() {
                return writeln!(self.out, "Machine halted");
            }
            if let Some(id) = self.watchpoints.scan_for_change(&self.machine) {
                return self.report_hit(id);
            }
        }
        Ok(())
    }

    fn report_hit(&mut self, id: usize) -> io::Result<()> {
        if let Some((_, value, text)) = self.watchpoints.iter().find(|&(hit, _, _)| hit == id) {
            writeln!(self.out, "Watchpoint {}: {} is now {}", id, text, value)?;
        }
        Ok(())
    }

    fn cmd_info(&mut self, args: &str) -> io::Result<()> {
        match args {
            "r" => {
                for (name, value) in self.machine.registers() {
                    writeln!(self.out, "{:<8} {:#018x} {}", name, value, value)?;
                }
                Ok(())
            }
            "w" => {
                if self.watchpoints.is_empty() {
                    return writeln!(self.out, "No watchpoints");
                }
                for (id, value, text) in self.watchpoints.iter() {
                    writeln!(self.out, "{:02}, {}, {}", id, value, text)?;
                }
                Ok(())
            }
            _ => writeln!(self.out, "Usage: info r | info w"),
        }
    }

    fn cmd_examine(&mut self, args: &str) -> io::Result<()> {
        let Some((count_text, expr_text)) = args.split_once(char::is_whitespace) else {
            return writeln!(self.out, "Usage: x N EXPR");
        };
        let count = match count_text.parse::<u64>() {
            Ok(count) => count,
            Err(_) => return writeln!(self.out, "Bad word count '{}'", count_text),
        };
        let mut addr = match evaluate(expr_text.trim(), &self.machine) {
            Ok(value) => value as u64,
            Err(err) => return writeln!(self.out, "Bad expression: {}", err),
        };
        for _ in 0..count {
            let word = self.machine.read_word(addr, WORD_BYTES);
            writeln!(self.out, "{:#010x}: {:#010x}", addr, word)?;
            addr = addr.wrapping_add(WORD_BYTES as u64);
        }
        Ok(())
    }

    fn cmd_print(&mut self, args: &str) -> io::Result<()> {
        if args.is_empty() {
            return writeln!(self.out, "Usage: p EXPR");
        }
        match evaluate(args, &self.machine) {
            Ok(value) => writeln!(self.out, "{}", value),
            Err(err) => writeln!(self.out, "Bad expression: {}", err),
        }
    }

    fn cmd_watch(&mut self, args: &str) -> io::Result<()> {
        if args.is_empty() {
            return writeln!(self.out, "Usage: w EXPR");
        }
        let value = match evaluate(args, &self.machine) {
            Ok(value) => value,
            Err(err) => return writeln!(self.out, "Bad expression: {}", err),
        };
        match self.watchpoints.add(args, value) {
            Ok(id) => writeln!(self.out, "Watchpoint {}: {} = {}", id, args, value),
            Err(err) => writeln!(self.out, "Cannot add watchpoint: {}", err),
        }
    }

    fn cmd_delete(&mut self, args: &str) -> io::Result<()> {
        let id = match args.parse::<usize>() {
            Ok(id) => id,
            Err(_) => return writeln!(self.out, "Bad watchpoint id '{}'", args),
        };
        if self.watchpoints.delete(id) {
            writeln!(self.out, "Deleted watchpoint {}", id)
        } else {
            writeln!(self.out, "No watchpoint {}", id)
        }
    }
}
