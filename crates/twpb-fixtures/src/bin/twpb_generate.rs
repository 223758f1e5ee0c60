//! `twpb-generate`: write the fixture files.
//!
//! Usage:
//!   twpb-generate [--out DIR]

use twpb_fixtures::cli::{dir_arg, generate};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let dir = match dir_arg(&args, "--out") {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    match generate(&dir) {
        Ok(paths) => {
            for path in paths {
                println!("wrote {}", path.display());
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
