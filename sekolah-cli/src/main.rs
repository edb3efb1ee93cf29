//! Entry point for the `sekolah` command-line interface.
#![forbid(unsafe_code)]

fn main() {
    env_logger::init();
    if let Err(err) = sekolah_cli::run() {
        eprintln!("sekolah: {err}");
        std::process::exit(1);
    }
}
