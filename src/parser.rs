//! Parse operator commands from the interactive prompt.
//! Supported: exchange / tickers / add / remove / show / save / load / list / help / quit.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::types::Exchange;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exchange(Exchange),
    Tickers,
    Add { ticker: String, cost_price: Decimal },
    /// 1-based row number as shown by `show`.
    Remove(usize),
    Show,
    Save(String),
    Load(String),
    List,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  exchange <HSX|HNX|UPCOM>   switch exchange (clears working rows)
  tickers                    tickers listed on the current exchange
  add <TICKER> <PRICE>       add a recommendation at PRICE with today's high
  remove <N>                 drop working row N
  show                       print working rows
  save <NAME>                append new rows to collection NAME
  load <NAME>                replace working rows with collection NAME
  list                       list stored collections
  quit";

fn re(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("command pattern compiles"))
}

pub fn parse_command(text: &str) -> Option<Command> {
    static EXCHANGE: OnceLock<Regex> = OnceLock::new();
    static ADD: OnceLock<Regex> = OnceLock::new();
    static REMOVE: OnceLock<Regex> = OnceLock::new();
    static NAMED: OnceLock<Regex> = OnceLock::new();

    let t = text.trim();

    // "exchange hnx"
    if let Some(c) = re(&EXCHANGE, r"(?i)^(?:exchange|ex)\s+([a-z]+)$").captures(t) {
        return Exchange::from_str(&c[1]).ok().map(Command::Exchange);
    }

    // "add ACB 10.5"
    if let Some(c) = re(&ADD, r"(?i)^add\s+([a-z0-9.]{1,10})\s+(\d+(?:\.\d+)?)$").captures(t) {
        let cost_price = Decimal::from_str(&c[2]).ok()?;
        return Some(Command::Add {
            ticker: c[1].to_uppercase(),
            cost_price,
        });
    }

    // "remove 2"
    if let Some(c) = re(&REMOVE, r"(?i)^(?:remove|rm)\s+(\d+)$").captures(t) {
        let n: usize = c[1].parse().ok()?;
        return (n > 0).then_some(Command::Remove(n));
    }

    // "save picks-aug" / "load picks-aug"
    if let Some(c) = re(&NAMED, r"(?i)^(save|load)\s+(\S+)$").captures(t) {
        let name = c[2].to_string();
        return Some(if c[1].eq_ignore_ascii_case("save") {
            Command::Save(name)
        } else {
            Command::Load(name)
        });
    }

    match t.to_ascii_lowercase().as_str() {
        "show" | "ls" => Some(Command::Show),
        "list" => Some(Command::List),
        "tickers" => Some(Command::Tickers),
        "help" | "?" => Some(Command::Help),
        "quit" | "exit" | "q" => Some(Command::Quit),
        _ => None,
    }
}
