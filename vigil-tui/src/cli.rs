use std::str::FromStr;

use clap::{Command, arg, builder::ValueParser, crate_description, crate_version};
use vigil_common::{DecodeError, EventQuery};

fn parse_since(since: &str) -> Result<EventQuery, DecodeError> {
    EventQuery::from_str(since)
}

pub fn cli() -> Command {
    Command::new("vigil")
        .about(crate_description!())
        .version(crate_version!())
        .arg(
            arg!(--events <events>)
                .short('e')
                .help("JSON array of stored firewall events to load at startup, or - for stdin")
                .required(false),
        )
        .arg(
            arg!(--url <url>)
                .short('u')
                .help("Live events socket, e.g. ws://127.0.0.1:9000/firewall/events/ws")
                .required(false),
        )
        .arg(
            arg!(--variant <variant>)
                .short('v')
                .help("Chart variant: pass/blocked every 5 minutes, or event count every 15 minutes")
                .required(false)
                .default_value("dual")
                .value_parser(["dual", "count"]),
        )
        .arg(
            arg!(--since <since>)
                .short('s')
                .help("Only load stored events at or after this date or timestamp")
                .required(false)
                .value_parser(ValueParser::new(parse_since)),
        )
}
