fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match tapfmt_cli::parse_args(&args) {
        Ok(tapfmt_cli::Command::Help) => {
            print!("{}", tapfmt_cli::help_text());
            return;
        }
        Ok(tapfmt_cli::Command::Run(options)) => options,
        Err(message) => {
            eprintln!("tapfmt: {message}");
            std::process::exit(2);
        }
    };

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut input = stdin.lock();
    let mut output = stdout.lock();
    if let Err(err) = tapfmt_cli::run(options, &mut input, &mut output) {
        eprintln!("tapfmt: {err}");
        std::process::exit(1);
    }
}
