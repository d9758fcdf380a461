use resguard_cli::{print_error, run};

fn main() {
    if let Err(e) = run() {
        print_error(&e.to_string());
        std::process::exit(e.exit_code());
    }
}
