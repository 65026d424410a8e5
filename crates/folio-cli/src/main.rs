use std::process;

fn main() {
    let exit_code = folio_cli::run();
    if exit_code != 0 {
        process::exit(exit_code);
    }
}
