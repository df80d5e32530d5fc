use std::env;
use std::fs;
use std::process;

use base64::{engine::general_purpose::STANDARD, Engine};

fn main() {
    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("Usage: encode_tls_asset <pem_file>");
        process::exit(1);
    };

    let content = match fs::read(&path) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("failed to read {path}: {err}");
            process::exit(1);
        }
    };

    println!("{}", STANDARD.encode(content));
}
