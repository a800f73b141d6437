use std::process;

fn main() {
    match textura_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("textura error: {err:#}");
            process::exit(1);
        }
    }
}
