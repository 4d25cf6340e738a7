//! Simple CLI for inspecting and editing inn files.
//!
//! Usage:
//!   inn_cli <inn_path> info
//!   inn_cli <inn_path> new <type> <data>
//!   inn_cli <inn_path> read <pos>
//!   inn_cli <inn_path> write <pos> <offset> <data>
//!   inn_cli <inn_path> rewrite <pos> <data>
//!   inn_cli <inn_path> free <pos>
//!   inn_cli <inn_path> scan
//!
//! Set `INN_BLOCK_SIZE` to choose the block size of a new file and
//! `RUST_LOG` to control logging.

use inn_storage::{Config, InnFile, Result, RoomKey, RoomPos, RoomType};
use serde::Serialize;
use std::env;
use std::process::exit;
use tracing_subscriber::{fmt, EnvFilter};

/// One line of `scan` output
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RoomInfo {
    pos: RoomPos,
    room_type: u8,
    room_size: u32,
    data_size: u32,
    next_room_pos: Option<RoomPos>,
}

fn parse_u64(s: &str) -> Option<u64> {
    match s.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

fn arg_u64(args: &[String], index: usize, name: &str) -> u64 {
    match args.get(index).and_then(|s| parse_u64(s)) {
        Some(n) => n,
        None => {
            eprintln!("ERROR: missing or invalid <{}>", name);
            exit(1);
        }
    }
}

fn arg_str<'a>(args: &'a [String], index: usize, name: &str) -> &'a str {
    match args.get(index) {
        Some(s) => s,
        None => {
            eprintln!("ERROR: missing <{}>", name);
            exit(1);
        }
    }
}

fn load_room(inn: &mut InnFile, pos: u64) -> Result<RoomKey> {
    let pos = RoomPos::new(pos);
    match inn.make_room_key(pos)? {
        Some(key) => Ok(key),
        None => {
            eprintln!("NOT_FOUND: no room at {}", pos);
            exit(1);
        }
    }
}

fn run(inn: &mut InnFile, command: &str, args: &[String]) -> Result<()> {
    match command {
        "info" => {
            let rooms = inn.rooms().collect::<Result<Vec<_>>>()?;
            let free = rooms
                .iter()
                .filter(|key| key.current_room_type().is_free())
                .count();
            println!("block_size: {}", inn.block_size());
            println!("header_size: {}", inn.header_size());
            println!("blocks_used: {}", inn.blocks_used());
            println!("rooms: {}", rooms.len());
            println!("free_rooms: {}", free);
        }

        "new" => {
            let room_type = arg_u64(args, 3, "type");
            let room_type = match u8::try_from(room_type) {
                Ok(t) => RoomType::new(t),
                Err(_) => {
                    eprintln!("ERROR: room type must fit in one byte");
                    exit(1);
                }
            };
            let data = arg_str(args, 4, "data").as_bytes();
            let mut key = inn.make_new_room(room_type, data.len() as u32)?;
            inn.write_bytes(&mut key, 0, data)?;
            println!("POS: {}", key.pos());
            println!("ROOM_SIZE: {}", key.room_size());
        }

        "read" => {
            let key = load_room(inn, arg_u64(args, 3, "pos"))?;
            let mut out = Vec::new();
            inn.read_all(&key, &mut out)?;
            match String::from_utf8(out) {
                Ok(s) => println!("{}", s),
                Err(_) => println!("<binary data>"),
            }
        }

        "write" => {
            let mut key = load_room(inn, arg_u64(args, 3, "pos"))?;
            let offset = arg_u64(args, 4, "offset") as u32;
            let data = arg_str(args, 5, "data").as_bytes();
            inn.write_bytes(&mut key, offset, data)?;
            println!("DATA_SIZE: {}", key.data_size());
        }

        "rewrite" => {
            let mut key = load_room(inn, arg_u64(args, 3, "pos"))?;
            let data = arg_str(args, 4, "data").as_bytes();
            inn.rewrite_bytes(&mut key, data)?;
            println!("DATA_SIZE: {}", key.data_size());
        }

        "free" => {
            let key = load_room(inn, arg_u64(args, 3, "pos"))?;
            inn.free_room(key, RoomType::FREE)?;
            println!("FREED");
        }

        "scan" => {
            let rooms = inn.rooms().collect::<Result<Vec<_>>>()?;
            for key in rooms {
                let info = RoomInfo {
                    pos: key.pos(),
                    room_type: key.current_room_type().value(),
                    room_size: key.room_size(),
                    data_size: key.data_size(),
                    next_room_pos: inn.read_next_room_pos(&key)?,
                };
                match serde_json::to_string(&info) {
                    Ok(line) => println!("{}", line),
                    Err(e) => eprintln!("ERROR: {}", e),
                }
            }
        }

        _ => {
            eprintln!("Unknown command: {}", command);
            exit(1);
        }
    }
    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: inn_cli <inn_path> <command> [args...]");
        eprintln!("Commands:");
        eprintln!("  info                      - Show file statistics");
        eprintln!("  new <type> <data>         - Append a room holding data");
        eprintln!("  read <pos>                - Print a room's data");
        eprintln!("  write <pos> <offset> <data> - Write data into a room");
        eprintln!("  rewrite <pos> <data>      - Replace a room's data");
        eprintln!("  free <pos>                - Release a room");
        eprintln!("  scan                      - List all rooms as JSON lines");
        exit(1);
    }

    let mut config = Config::new(&args[1]);
    if let Some(block_size) = env::var("INN_BLOCK_SIZE").ok().and_then(|s| s.parse().ok()) {
        config = config.block_size(block_size);
    }

    let mut inn = InnFile::new();
    if let Err(e) = inn.open(&mut config) {
        eprintln!("ERROR: Failed to open inn file: {}", e);
        exit(1);
    }

    if let Err(e) = run(&mut inn, &args[2], &args) {
        eprintln!("ERROR: {}", e);
        exit(1);
    }

    if let Err(e) = inn.sync() {
        eprintln!("Warning: Failed to sync: {}", e);
    }
}
