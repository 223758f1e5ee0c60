//! `twpb-check`: decode the fixture files and verify their contents.
//!
//! Usage:
//!   twpb-check [--dir DIR]

use twpb_fixtures::cli::{check, dir_arg};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let dir = match dir_arg(&args, "--dir") {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    match check(&dir) {
        Ok(files) => {
            for file in files {
                println!("ok {file}");
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
