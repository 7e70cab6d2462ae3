//! Decode binary records with an IDL schema.
//!
//! Usage:
//!   idl_decode --schema bus.idl --path bus.CANFrame --input frame.bin
//!   idl_decode --schema bus.idl --path bus.CANFrame --hex "01 00 00 00 02 0a 0b"
//!
//! Options:
//!   --all                decode back-to-back records until the input is exhausted
//!   --little-endian      read multi-byte values little-endian (default big-endian)
//!   --max-sequence-len   reject sequences whose length prefix exceeds N
//!   -v, --verbose        log level (repeat for more)
//!
//! Exit code 1 on any parse, verification, resolution or decode error.

use anyhow::{bail, Context};
use busidl::dump::record_to_dump;
use busidl::{decode_frame, DecoderOptions, Endianness, Schema};
use clap::{value_parser, Arg, ArgAction, ArgGroup, Command};
use std::path::PathBuf;

fn parse_hex(s: &str) -> anyhow::Result<Vec<u8>> {
    let hex: String = s
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if hex.len() % 2 != 0 {
        bail!("hex input must have even length");
    }
    hex.as_bytes()
        .chunks(2)
        .map(|chunk| {
            let digits = std::str::from_utf8(chunk).context("invalid hex")?;
            u8::from_str_radix(digits, 16).with_context(|| format!("invalid hex byte {digits:?}"))
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    let matches = Command::new("idl_decode")
        .about("Decode binary records with an IDL schema")
        .arg(
            Arg::new("schema")
                .long("schema")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("IDL schema file"),
        )
        .arg(
            Arg::new("path")
                .long("path")
                .required(true)
                .help("Dotted path of the target struct, e.g. bus.CANFrame"),
        )
        .arg(
            Arg::new("input")
                .long("input")
                .value_parser(value_parser!(PathBuf))
                .help("Binary input file"),
        )
        .arg(Arg::new("hex").long("hex").help("Input bytes as hex"))
        .group(
            ArgGroup::new("data")
                .args(["input", "hex"])
                .required(true),
        )
        .arg(
            Arg::new("all")
                .long("all")
                .action(ArgAction::SetTrue)
                .help("Decode back-to-back records until the input is exhausted"),
        )
        .arg(
            Arg::new("little-endian")
                .long("little-endian")
                .action(ArgAction::SetTrue)
                .help("Read multi-byte values little-endian"),
        )
        .arg(
            Arg::new("max-sequence-len")
                .long("max-sequence-len")
                .value_parser(value_parser!(u32))
                .help("Reject sequences longer than this"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Increase log verbosity"),
        )
        .get_matches();

    let level = match matches.get_count("verbose") {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let schema_path = matches
        .get_one::<PathBuf>("schema")
        .context("missing --schema")?;
    let target = matches.get_one::<String>("path").context("missing --path")?;
    let schema = Schema::from_file(schema_path)
        .with_context(|| format!("loading schema {}", schema_path.display()))?;

    let options = DecoderOptions {
        endianness: if matches.get_flag("little-endian") {
            Endianness::Little
        } else {
            Endianness::Big
        },
        max_sequence_len: matches.get_one::<u32>("max-sequence-len").copied(),
    };
    let decoder = schema.decoder_with_options(target, options)?;

    let bytes = match (matches.get_one::<PathBuf>("input"), matches.get_one::<String>("hex")) {
        (Some(path), _) => {
            std::fs::read(path).with_context(|| format!("reading input {}", path.display()))?
        }
        (None, Some(hex)) => parse_hex(hex)?,
        (None, None) => bail!("one of --input or --hex is required"),
    };
    tracing::info!(target_struct = %target, bytes = bytes.len(), "decoding input");

    if matches.get_flag("all") {
        let frame = decode_frame(&decoder, &bytes)?;
        for (i, rec) in frame.records.iter().enumerate() {
            println!("# record {} [{}..{})", i, rec.byte_range.0, rec.byte_range.1);
            println!("{}", record_to_dump(&rec.values));
        }
    } else {
        let (record, rest) = decoder.decode(&bytes)?;
        println!("{}", record_to_dump(&record));
        if !rest.is_empty() {
            eprintln!("{} trailing byte(s) not decoded", rest.len());
        }
    }
    Ok(())
}
