fn main() {
    let exit_code = cs_cli::run_cli_from_args(std::env::args_os());
    std::process::exit(exit_code);
}
