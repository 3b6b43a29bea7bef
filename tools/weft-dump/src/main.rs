// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 weft.dev

//! weft-dump - decode captured IPC messages against loaded schemas
//!
//! Feed it schema documents plus one captured message (hex bytes or a raw
//! file); it looks the method up by ordinal and prints the decoded payload.
//! Without a message it lists the loaded catalog.

use clap::Parser;
use colored::*;
use std::fs;
use std::path::PathBuf;

use weft::{
    export, pretty_print, Direction, HandleInfo, InterfaceMethod, LibraryLoader, MessageDecoder,
    MessageHeader, DEFAULT_LINE_WIDTH, HEADER_SIZE, NO_COLORS, WITH_COLORS,
};

/// Decode captured IPC messages against loaded schemas
#[derive(Parser, Debug)]
#[command(name = "weft-dump")]
#[command(version = "0.1.0")]
#[command(about = "Decode captured IPC messages against loaded schemas")]
struct Args {
    /// Schema documents to load (first listed wins per library name)
    #[arg(short, long, required = true, num_args = 1..)]
    schema: Vec<PathBuf>,

    /// Message bytes as hex, spaced pairs or one continuous string
    #[arg(long, conflicts_with = "message")]
    hex: Option<String>,

    /// File holding the raw message bytes
    #[arg(short, long)]
    message: Option<PathBuf>,

    /// Transfer direction of the captured message: request, response
    #[arg(short, long, default_value = "request")]
    direction: DirectionArg,

    /// Handle table as comma-separated handle numbers (decimal or 0x hex)
    #[arg(long)]
    handles: Option<String>,

    /// Output format: pretty, json
    #[arg(short, long, default_value = "pretty")]
    format: OutputFormat,

    /// Line budget for pretty output
    #[arg(short, long, default_value_t = DEFAULT_LINE_WIDTH)]
    width: usize,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[derive(Clone, Debug)]
enum DirectionArg {
    Request,
    Response,
}

impl std::str::FromStr for DirectionArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "request" | "req" => Ok(DirectionArg::Request),
            "response" | "resp" => Ok(DirectionArg::Response),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "p" => Ok(OutputFormat::Pretty),
            "json" | "j" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    if args.no_color {
        colored::control::set_override(false);
    }

    let mut loader = LibraryLoader::new();
    loader.load_paths(&args.schema)?;
    loader.decode_all()?;

    let Some(bytes) = message_bytes(args)? else {
        print_catalog(&loader);
        return Ok(());
    };
    decode_and_print(&loader, &bytes, args)
}

/// The message to decode, from `--hex` or `--message`. `None` means the
/// catalog listing was requested instead.
fn message_bytes(args: &Args) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error>> {
    if let Some(hex) = &args.hex {
        return Ok(Some(parse_hex(hex)?));
    }
    if let Some(path) = &args.message {
        return Ok(Some(fs::read(path)?));
    }
    Ok(None)
}

fn parse_hex(text: &str) -> Result<Vec<u8>, String> {
    let digits: Vec<char> = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits ({})", digits.len()));
    }
    let mut bytes = Vec::with_capacity(digits.len() / 2);
    for pair in digits.chunks(2) {
        let pair: String = pair.iter().collect();
        let byte = u8::from_str_radix(&pair, 16).map_err(|_| format!("invalid hex byte '{}'", pair))?;
        bytes.push(byte);
    }
    Ok(bytes)
}

fn parse_handles(text: &str) -> Result<Vec<HandleInfo>, String> {
    let mut handles = Vec::new();
    for token in text.split(',').map(str::trim).filter(|token| !token.is_empty()) {
        let handle = match token.strip_prefix("0x") {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => token.parse::<u32>(),
        }
        .map_err(|_| format!("invalid handle '{}'", token))?;
        handles.push(HandleInfo {
            handle,
            object_type: 0,
            rights: 0,
        });
    }
    Ok(handles)
}

fn decode_and_print(loader: &LibraryLoader, bytes: &[u8], args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let header = MessageHeader::parse(bytes)?;
    if !header.is_supported() {
        eprintln!(
            "{} unknown wire format magic {:02x}, decoding anyway",
            "Warning:".yellow().bold(),
            header.magic
        );
    }

    let Some(method) = loader.get_by_ordinal(header.ordinal).first() else {
        return Err(format!("no method with ordinal {:016x} in the loaded schemas", header.ordinal).into());
    };
    let direction = match args.direction {
        DirectionArg::Request => Direction::Request,
        DirectionArg::Response => Direction::Response,
    };
    let (payload, direction_name) = match direction {
        Direction::Request => (method.request(loader), "request"),
        Direction::Response => (method.response(loader), "response"),
    };
    let Some(payload) = payload else {
        return Err(format!("{} has no {} payload", method.fully_qualified_name(), direction_name).into());
    };

    let handles = match &args.handles {
        Some(text) => parse_handles(text)?,
        None => Vec::new(),
    };
    let mut decoder = MessageDecoder::new(&bytes[HEADER_SIZE..], &handles);
    let value = decoder.decode_message(payload);

    match args.format {
        OutputFormat::Pretty => {
            let colors = if args.no_color { &NO_COLORS } else { &WITH_COLORS };
            println!(
                "{} = {}",
                method.fully_qualified_name().cyan().bold(),
                pretty_print(&value, colors, args.width)
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&export(&value))?);
        }
    }

    if !decoder.ok() {
        for error in decoder.errors() {
            eprintln!("  {} {}", "!".red().bold(), error);
        }
        return Err(format!("decode finished with {} diagnostic(s)", decoder.errors().len()).into());
    }
    Ok(())
}

fn print_catalog(loader: &LibraryLoader) {
    println!("{}", "=== Loaded schema catalog ===".bold());
    println!();
    for library in loader.libraries() {
        println!("{} {}", "Library:".cyan().bold(), library.name());
        for interface in library.interfaces() {
            println!("  {} {}", "Interface:".white(), interface.name().cyan());
            for method in interface.methods() {
                println!(
                    "    {} {} {}",
                    format!("{:016x}", method.ordinal()).yellow(),
                    method.name().green(),
                    method_shape(method, loader).dimmed()
                );
            }
        }
        println!();
    }
}

fn method_shape(method: &InterfaceMethod, loader: &LibraryLoader) -> &'static str {
    match (method.request(loader).is_some(), method.response(loader).is_some()) {
        (true, true) => "(request/response)",
        (true, false) => "(one-way)",
        (false, true) => "(event)",
        (false, false) => "(no payload)",
    }
}
